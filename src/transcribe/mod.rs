//! Speech-to-text transcription and metadata handling.
//!
//! The [`SpeechToText`] trait is the seam between the pipeline and the
//! recognition engine; the production impl lives in [`whisper`] behind the
//! `whisper` feature. Records are persisted to the dataset metadata table
//! incrementally, one flushed row per transcribed segment, so an
//! interrupted batch loses at most the file it was working on.

pub mod model;
pub mod whisper;

use crate::error::Result;
use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// One row of the dataset metadata table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionRecord {
    pub filename: String,
    pub text: String,
    pub confidence: f64,
    pub language: String,
}

/// A speech recognition engine.
///
/// Implementations load their model once at construction and are reused
/// across the whole batch.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribe one audio file into a metadata record.
    async fn transcribe(&self, audio_path: &Path) -> Result<TranscriptionRecord>;

    /// Model identifier for logs and reports.
    fn model_name(&self) -> &str;
}

/// Collapse runs of whitespace and trim. Recognition output tends to carry
/// stray double spaces around sentence boundaries.
pub fn tidy_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Write a complete metadata table, replacing any existing file.
pub fn save_metadata(records: &[TranscriptionRecord], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Load a metadata table written by [`save_metadata`] or [`MetadataWriter`].
pub fn load_metadata(path: &Path) -> Result<Vec<TranscriptionRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for result in reader.deserialize() {
        records.push(result?);
    }
    Ok(records)
}

/// Drop records below the confidence threshold. Returns the surviving
/// records; the removed count is logged.
pub fn filter_low_confidence(
    records: &[TranscriptionRecord],
    min_confidence: f64,
) -> Vec<TranscriptionRecord> {
    let kept: Vec<_> = records
        .iter()
        .filter(|r| r.confidence >= min_confidence)
        .cloned()
        .collect();
    let removed = records.len() - kept.len();
    if removed > 0 {
        info!(
            "Filtered {} low-confidence segments (< {:.2})",
            removed, min_confidence
        );
    }
    kept
}

/// Incremental metadata writer: every record is appended and flushed as it
/// arrives, so a crash mid-batch loses at most the in-flight record.
pub struct MetadataWriter {
    writer: csv::Writer<std::fs::File>,
}

impl MetadataWriter {
    /// Start a fresh table at `path`, truncating any previous run's output.
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::File::create(path)?;
        let writer = csv::Writer::from_writer(file);
        Ok(Self { writer })
    }

    /// Append one record and flush it to disk.
    pub fn write(&mut self, record: &TranscriptionRecord) -> Result<()> {
        self.writer.serialize(record)?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Stage 5: batch transcription over a segment directory.
pub struct TranscriptionStage {
    engine: Arc<dyn SpeechToText>,
}

impl TranscriptionStage {
    pub fn new(engine: Arc<dyn SpeechToText>) -> Self {
        Self { engine }
    }

    /// Transcribe every WAV under `input_dir` in filename order, writing
    /// records to `metadata_path` as they are produced. Per-file failures
    /// are logged and skipped; the successes are returned.
    #[instrument(skip(self, input_dir, metadata_path))]
    pub async fn transcribe_dir(
        &self,
        input_dir: &Path,
        metadata_path: &Path,
    ) -> Result<Vec<TranscriptionRecord>> {
        let files = crate::audio::wav_files(input_dir)?;
        if files.is_empty() {
            warn!("No segments to transcribe in {}", input_dir.display());
            return Ok(Vec::new());
        }

        info!(
            "Transcribing {} segments with {}",
            files.len(),
            self.engine.model_name()
        );

        let mut writer = MetadataWriter::create(metadata_path)?;

        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  {spinner:.green} Transcribe [{bar:30.cyan/blue}] {pos}/{len}")
                .unwrap()
                .progress_chars("█▓░"),
        );

        let mut records = Vec::new();
        for path in &files {
            match self.engine.transcribe(path).await {
                Ok(record) => {
                    writer.write(&record)?;
                    records.push(record);
                }
                Err(e) => {
                    error!("Failed to transcribe {}: {}", path.display(), e);
                }
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        if records.len() < files.len() {
            warn!("Transcribed {}/{} segments", records.len(), files.len());
        } else {
            info!("Transcribed {}/{} segments", records.len(), files.len());
        }
        Ok(records)
    }
}
