//! Whisper-based speech recognition.
//!
//! Requires the `whisper` feature and cmake at build time:
//!
//! ```bash
//! cargo build --features whisper
//! ```
//!
//! Without the feature this module compiles a stub that fails at
//! transcription time, so the rest of the pipeline stays usable.

use crate::audio::wav;
use crate::config::TranscriptionSettings;
use crate::error::{Result, StemmeError};
use crate::transcribe::{SpeechToText, TranscriptionRecord};
use async_trait::async_trait;
use std::path::Path;

#[cfg(feature = "whisper")]
use crate::transcribe::tidy_text;
#[cfg(feature = "whisper")]
use std::sync::{Arc, Mutex, Once};
#[cfg(feature = "whisper")]
use whisper_rs::{
    install_logging_hooks, FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters,
};

/// Sample rate whisper.cpp expects its input at.
pub const WHISPER_SAMPLE_RATE: u32 = 16_000;

/// Language value that requests auto-detection.
pub const AUTO_LANGUAGE: &str = "auto";

#[cfg(feature = "whisper")]
static LOGGING_HOOKS_INSTALLED: Once = Once::new();

/// Read a WAV file as mono f32 samples at the rate whisper.cpp expects.
pub fn load_for_inference(audio_path: &Path) -> Result<Vec<f32>> {
    let (sample_rate, samples) = wav::read_mono(audio_path)?;
    let samples = if sample_rate == WHISPER_SAMPLE_RATE {
        samples
    } else {
        wav::resample(&samples, sample_rate, WHISPER_SAMPLE_RATE)
    };
    Ok(wav::to_f32(&samples))
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn model_name_of(model_path: &Path) -> String {
    model_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string()
}

#[cfg(feature = "whisper")]
struct InferenceCore {
    context: Mutex<WhisperContext>,
    language: String,
    threads: Option<usize>,
}

#[cfg(feature = "whisper")]
struct RawTranscription {
    text: String,
    language: String,
    confidence: f64,
}

#[cfg(feature = "whisper")]
impl InferenceCore {
    fn run(&self, audio: &[f32]) -> Result<RawTranscription> {
        let context = self
            .context
            .lock()
            .map_err(|e| StemmeError::Transcription(format!("Context lock poisoned: {}", e)))?;

        let mut state = context
            .create_state()
            .map_err(|e| StemmeError::Transcription(format!("Failed to create state: {}", e)))?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        if self.language == AUTO_LANGUAGE {
            params.set_language(None);
        } else {
            params.set_language(Some(&self.language));
        }
        if let Some(threads) = self.threads {
            params.set_n_threads(threads as i32);
        }
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);

        state
            .full(params, audio)
            .map_err(|e| StemmeError::Transcription(format!("Whisper inference failed: {}", e)))?;

        let lang_id = state.full_lang_id_from_state();
        let detected = whisper_rs::get_lang_str(lang_id).unwrap_or("").to_string();
        let language = if detected.is_empty() {
            self.language.clone()
        } else {
            detected
        };

        let mut text = String::new();
        let mut confidence_sum = 0.0_f64;
        let mut segment_count = 0u32;
        for segment in state.as_iter() {
            text.push_str(&segment.to_string());
            // no_speech_probability is 0.0..1.0; confidence = 1 - no_speech_prob
            confidence_sum += 1.0 - f64::from(segment.no_speech_probability());
            segment_count += 1;
        }

        // An empty result carries no evidence against the audio, so it
        // keeps full confidence and gets weeded out by length instead.
        let confidence = if segment_count > 0 {
            (confidence_sum / f64::from(segment_count)).clamp(0.0, 1.0)
        } else {
            1.0
        };

        Ok(RawTranscription {
            text,
            language,
            confidence,
        })
    }
}

/// Whisper implementation of [`SpeechToText`].
///
/// The model is loaded once at construction; inference runs on tokio's
/// blocking pool so batch loops stay responsive. The context is behind a
/// mutex and a fresh state is created per file.
#[cfg(feature = "whisper")]
pub struct WhisperEngine {
    core: Arc<InferenceCore>,
    model_name: String,
}

#[cfg(feature = "whisper")]
impl std::fmt::Debug for WhisperEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperEngine")
            .field("model_name", &self.model_name)
            .field("context", &"<WhisperContext>")
            .finish()
    }
}

/// Whisper engine placeholder compiled without the `whisper` feature.
#[cfg(not(feature = "whisper"))]
#[derive(Debug)]
pub struct WhisperEngine {
    model_name: String,
}

#[cfg(feature = "whisper")]
impl WhisperEngine {
    pub fn new(model_path: &Path, settings: &TranscriptionSettings) -> Result<Self> {
        // whisper.cpp logs straight to stderr unless redirected (once).
        LOGGING_HOOKS_INSTALLED.call_once(|| {
            install_logging_hooks();
        });

        if !model_path.exists() {
            return Err(StemmeError::Model(format!(
                "Model file not found: {}",
                model_path.display()
            )));
        }

        let mut context_params = WhisperContextParameters::default();
        context_params.use_gpu(settings.use_gpu);
        context_params.flash_attn(settings.use_gpu);
        let context = WhisperContext::new_with_params(
            model_path.to_str().ok_or_else(|| {
                StemmeError::Model("Invalid UTF-8 in model path".to_string())
            })?,
            context_params,
        )
        .map_err(|e| StemmeError::Model(format!("Failed to load Whisper model: {}", e)))?;

        Ok(Self {
            core: Arc::new(InferenceCore {
                context: Mutex::new(context),
                language: settings.language.clone(),
                threads: settings.threads,
            }),
            model_name: model_name_of(model_path),
        })
    }
}

#[cfg(not(feature = "whisper"))]
impl WhisperEngine {
    pub fn new(model_path: &Path, _settings: &TranscriptionSettings) -> Result<Self> {
        if !model_path.exists() {
            return Err(StemmeError::Model(format!(
                "Model file not found: {}",
                model_path.display()
            )));
        }
        Ok(Self {
            model_name: model_name_of(model_path),
        })
    }
}

#[cfg(feature = "whisper")]
#[async_trait]
impl SpeechToText for WhisperEngine {
    async fn transcribe(&self, audio_path: &Path) -> Result<TranscriptionRecord> {
        let audio = load_for_inference(audio_path)?;
        let filename = file_name_of(audio_path);

        let core = Arc::clone(&self.core);
        let raw = tokio::task::spawn_blocking(move || core.run(&audio))
            .await
            .map_err(|e| StemmeError::Transcription(format!("Inference task panicked: {}", e)))??;

        Ok(TranscriptionRecord {
            filename,
            text: tidy_text(&raw.text),
            confidence: raw.confidence,
            language: raw.language,
        })
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(not(feature = "whisper"))]
#[async_trait]
impl SpeechToText for WhisperEngine {
    async fn transcribe(&self, _audio_path: &Path) -> Result<TranscriptionRecord> {
        Err(StemmeError::Transcription(
            concat!(
                "This binary was built without speech recognition. ",
                "Rebuild with: cargo build --release --features whisper ",
                "(requires cmake)"
            )
            .to_string(),
        ))
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
