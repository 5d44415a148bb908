//! Preprocess command implementation.

use crate::capability::Capabilities;
use crate::cli::{format_duration, Output};
use crate::config::Settings;
use crate::preprocess::Preprocessor;
use anyhow::Result;

/// Clean, segment and resample whatever is in the raw stage directory.
pub async fn run_preprocess(settings: Settings, capabilities: Capabilities) -> Result<()> {
    let preprocessor = Preprocessor::new(&settings, &capabilities);

    Output::info("Cleaning raw audio");
    let cleaned = preprocessor
        .clean_all(&settings.raw_audio_dir(), &settings.clean_audio_dir())
        .await?;
    if cleaned.is_empty() {
        Output::warning("No raw audio found; run 'stemme download' first");
        return Ok(());
    }
    Output::info(&format!("Cleaned {} files", cleaned.len()));

    Output::info("Splitting on silence");
    let segments = preprocessor.segment_all(&settings.clean_audio_dir(), &settings.segments_dir())?;
    if segments.is_empty() {
        Output::error("Splitting produced no usable segments; check the silence threshold");
        anyhow::bail!("no segments produced");
    }
    Output::info(&format!("Produced {} segments", segments.len()));

    Output::info(&format!(
        "Resampling to {} Hz",
        settings.preprocess.target_sample_rate
    ));
    let processed = preprocessor.resample_all(&settings.segments_dir(), &settings.processed_dir())?;

    let (duration, _) = preprocessor.total_duration(&settings.processed_dir())?;
    Output::success(&format!(
        "Processed {} segments, {} of audio, in {}",
        processed.len(),
        format_duration(duration),
        settings.processed_dir().display()
    ));
    Ok(())
}
