//! Configuration settings for Stemme.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub layout: LayoutSettings,
    pub sources: SourceSettings,
    pub download: DownloadSettings,
    pub preprocess: PreprocessSettings,
    pub segmentation: SegmentationSettings,
    pub transcription: TranscriptionSettings,
    pub quality: QualitySettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data (models, caches).
    pub data_dir: String,
    /// Directory for temporary files.
    pub temp_dir: String,
    /// Root directory for pipeline output. All stage directories live below it.
    pub output_dir: String,
    /// Skip work whose output file already exists.
    pub skip_existing: bool,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.stemme".to_string(),
            temp_dir: "/tmp/stemme".to_string(),
            output_dir: "voice_data".to_string(),
            skip_existing: true,
        }
    }
}

/// Names of the per-stage subdirectories under the output root.
///
/// The numeric prefixes keep the directories listed in pipeline order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    pub raw_dir: String,
    pub clean_dir: String,
    pub segments_dir: String,
    pub processed_dir: String,
    pub dataset_dir: String,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            raw_dir: "01_raw_audio".to_string(),
            clean_dir: "02_clean_audio".to_string(),
            segments_dir: "03_segments".to_string(),
            processed_dir: "04_processed".to_string(),
            dataset_dir: "voice_dataset".to_string(),
        }
    }
}

/// Audio source list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct SourceSettings {
    /// Source URLs, one per entry.
    pub urls: Vec<String>,
    /// Optional path to a text file with one URL per line.
    /// Blank lines and lines starting with `#` are ignored.
    pub urls_file: Option<String>,
}

/// Audio download settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadSettings {
    /// Audio container format requested from the extractor.
    pub audio_format: String,
    /// Extractor quality setting ("0" = best).
    pub audio_quality: String,
    /// Per-download timeout in seconds.
    pub timeout_seconds: u64,
    /// Number of downloads to run concurrently.
    pub parallel: usize,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            audio_format: "wav".to_string(),
            audio_quality: "0".to_string(),
            timeout_seconds: 600,
            parallel: 3,
        }
    }
}

/// Audio cleaning and resampling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessSettings {
    /// Peak-normalize each recording before further processing.
    pub normalize: bool,
    /// Apply spectral noise reduction.
    pub denoise: bool,
    /// Noise reduction strength in [0, 1]; 0 leaves audio untouched.
    pub denoise_strength: f32,
    /// Sample rate of the final dataset in Hz.
    pub target_sample_rate: u32,
}

impl Default for PreprocessSettings {
    fn default() -> Self {
        Self {
            normalize: true,
            denoise: true,
            denoise_strength: 0.5,
            target_sample_rate: 22050,
        }
    }
}

/// Silence-based segmentation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationSettings {
    /// Minimum silence run length that counts as a split point, in ms.
    pub min_silence_ms: u32,
    /// Loudness below this threshold counts as silence, in dBFS.
    pub silence_threshold_db: f32,
    /// Silence padding kept on each side of a segment, in ms.
    pub keep_silence_ms: u32,
    /// Segments shorter than this are discarded, in ms.
    pub min_segment_ms: u32,
    /// Segments longer than this are discarded, in ms.
    pub max_segment_ms: u32,
}

impl Default for SegmentationSettings {
    fn default() -> Self {
        Self {
            min_silence_ms: 500,
            silence_threshold_db: -40.0,
            keep_silence_ms: 200,
            min_segment_ms: 2000,
            max_segment_ms: 10000,
        }
    }
}

/// Speech-to-text settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// Model size name (tiny, base, small, medium, large, or a .en variant).
    pub model: String,
    /// Language hint passed to the engine.
    pub language: String,
    /// Offload inference to the GPU when the engine supports it.
    pub use_gpu: bool,
    /// Decoder threads; None lets the engine pick.
    pub threads: Option<usize>,
    /// Number of files to transcribe concurrently. The engine is usually the
    /// bottleneck, so this defaults to 1.
    pub parallel: usize,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            model: "medium".to_string(),
            language: "en".to_string(),
            use_gpu: true,
            threads: None,
            parallel: 1,
        }
    }
}

/// Quality-gate thresholds. All of these produce warnings, never aborts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QualitySettings {
    /// Minimum total dataset duration in minutes.
    pub min_total_duration_minutes: u32,
    /// Maximum useful dataset duration in minutes.
    pub max_total_duration_minutes: u32,
    /// Minimum number of segments for a usable dataset.
    pub min_segments: usize,
    /// Records below this confidence are excluded from the training set.
    pub min_confidence: f64,
}

impl Default for QualitySettings {
    fn default() -> Self {
        Self {
            min_total_duration_minutes: 30,
            max_total_duration_minutes: 180,
            min_segments: 100,
            min_confidence: 0.8,
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::StemmeError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("stemme")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }

    /// Directory where downloaded GGML model files are stored.
    pub fn models_dir(&self) -> PathBuf {
        self.data_dir().join("models")
    }

    /// Get the expanded pipeline output root.
    pub fn output_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.output_dir)
    }

    /// Stage 1 output: raw downloaded audio.
    pub fn raw_audio_dir(&self) -> PathBuf {
        self.output_dir().join(&self.layout.raw_dir)
    }

    /// Stage 2 output: normalized and denoised audio.
    pub fn clean_audio_dir(&self) -> PathBuf {
        self.output_dir().join(&self.layout.clean_dir)
    }

    /// Stage 3 output: silence-split segments.
    pub fn segments_dir(&self) -> PathBuf {
        self.output_dir().join(&self.layout.segments_dir)
    }

    /// Stage 4 output: segments resampled to the target rate.
    pub fn processed_dir(&self) -> PathBuf {
        self.output_dir().join(&self.layout.processed_dir)
    }

    /// Final dataset directory handed to a training consumer.
    pub fn dataset_dir(&self) -> PathBuf {
        self.output_dir().join(&self.layout.dataset_dir)
    }

    /// Final wav directory inside the dataset.
    pub fn wavs_dir(&self) -> PathBuf {
        self.dataset_dir().join("wavs")
    }

    /// Canonical metadata table path inside the dataset.
    pub fn metadata_path(&self) -> PathBuf {
        self.dataset_dir().join("metadata.csv")
    }

    /// Create every stage directory the pipeline writes to.
    pub fn create_directories(&self) -> crate::error::Result<()> {
        for dir in [
            self.raw_audio_dir(),
            self.clean_audio_dir(),
            self.segments_dir(),
            self.processed_dir(),
            self.wavs_dir(),
        ] {
            std::fs::create_dir_all(&dir)?;
        }
        Ok(())
    }

    /// Collect the full source URL list: inline URLs first, then the URLs
    /// file if one is configured. Duplicates are dropped, first occurrence
    /// wins, so a URL listed twice is only fetched once.
    pub fn resolve_sources(&self) -> crate::error::Result<Vec<String>> {
        let mut urls = self.sources.urls.clone();

        if let Some(file) = &self.sources.urls_file {
            let path = Self::expand_path(file);
            if path.exists() {
                urls.extend(read_url_file(&path)?);
            } else {
                return Err(crate::error::StemmeError::Config(format!(
                    "URLs file not found: {}",
                    path.display()
                )));
            }
        }

        let mut seen = std::collections::HashSet::new();
        urls.retain(|u| seen.insert(u.clone()));
        Ok(urls)
    }
}

/// Parse a newline-delimited URL list, skipping blank lines and `#` comments.
pub fn parse_url_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Read a URL list file from disk.
pub fn read_url_file(path: &Path) -> crate::error::Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_url_list(&content))
}
