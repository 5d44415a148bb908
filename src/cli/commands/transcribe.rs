//! Transcribe command implementation.

use crate::capability;
use crate::cli::Output;
use crate::config::Settings;
use crate::transcribe::model::resolve_model_path;
use crate::transcribe::whisper::WhisperEngine;
use crate::transcribe::{self, TranscriptionStage};
use anyhow::Result;
use std::sync::Arc;

/// Transcribe the processed segments into the metadata table.
pub async fn run_transcribe(
    model: Option<String>,
    language: Option<String>,
    mut settings: Settings,
) -> Result<()> {
    if let Some(model) = model {
        settings.transcription.model = model;
    }
    if let Some(language) = language {
        settings.transcription.language = language;
    }

    if !capability::engine_compiled() {
        Output::error("This binary was built without speech recognition");
        Output::info("Rebuild with: cargo build --release --features whisper");
        anyhow::bail!("whisper feature not compiled");
    }

    let Some(model_path) = resolve_model_path(&settings) else {
        Output::error(&format!(
            "Model '{}' is not installed",
            settings.transcription.model
        ));
        Output::info(&format!(
            "Fetch it with: stemme model fetch {}",
            settings.transcription.model
        ));
        anyhow::bail!("model not installed");
    };

    let spinner = Output::spinner(&format!(
        "Loading {} model...",
        settings.transcription.model
    ));
    let engine = WhisperEngine::new(&model_path, &settings.transcription)?;
    spinner.finish_and_clear();

    let processed_dir = settings.processed_dir();
    let metadata_path = settings.metadata_path();

    let stage = TranscriptionStage::new(Arc::new(engine));
    let records = stage.transcribe_dir(&processed_dir, &metadata_path).await?;

    if records.is_empty() {
        Output::warning("No processed segments found; run 'stemme preprocess' first");
        return Ok(());
    }

    let kept = transcribe::filter_low_confidence(&records, settings.quality.min_confidence);
    Output::success(&format!(
        "Transcribed {} segments ({} above confidence {:.2})",
        records.len(),
        kept.len(),
        settings.quality.min_confidence
    ));
    Output::kv("Metadata", &metadata_path.display().to_string());
    Ok(())
}
