//! Audio assets and signal-processing primitives.
//!
//! The submodules are deliberately small: `wav` does file I/O, `silence`
//! finds split points, `denoise` cleans spectra. Everything operates on
//! mono 16-bit PCM once a file has entered the pipeline.

pub mod denoise;
pub mod silence;
pub mod wav;

use crate::error::Result;
use std::path::{Path, PathBuf};

/// Extensions the raw-audio scan accepts. Downloads are requested as WAV but
/// the extractor may fall back to whatever the source offers.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["wav", "mp3", "m4a", "opus", "ogg", "flac", "webm"];

/// Which stage directory an asset came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Raw,
    Clean,
    Segments,
    Processed,
    Dataset,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PipelineStage::Raw => "raw",
            PipelineStage::Clean => "clean",
            PipelineStage::Segments => "segments",
            PipelineStage::Processed => "processed",
            PipelineStage::Dataset => "dataset",
        };
        write!(f, "{}", name)
    }
}

/// A file on local storage at some pipeline stage.
///
/// Identity is the path; the audio attributes are probed from the WAV
/// header without decoding samples. Assets are never mutated in place:
/// every stage writes a new file into its own directory.
#[derive(Debug, Clone)]
pub struct AudioAsset {
    pub path: PathBuf,
    pub sample_rate: u32,
    pub channels: u16,
    pub duration_secs: f64,
    pub stage: PipelineStage,
}

impl AudioAsset {
    /// Probe a WAV file's header and build an asset for it.
    pub fn probe(path: impl Into<PathBuf>, stage: PipelineStage) -> Result<Self> {
        let path = path.into();
        let info = wav::probe(&path)?;
        Ok(Self {
            path,
            sample_rate: info.sample_rate,
            channels: info.channels,
            duration_secs: info.duration_secs(),
            stage,
        })
    }

    /// File name component as a string, lossy for non-UTF-8 names.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// List audio files in a directory, filtered by extension and sorted by
/// file name so batch stages process inputs in a deterministic order.
///
/// A missing directory is treated as empty.
pub fn scan_dir(dir: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .map(|e| extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
                .unwrap_or(false)
        })
        .collect();

    files.sort_by_key(|p| p.file_name().map(|n| n.to_os_string()));
    Ok(files)
}

/// List WAV files in a directory, sorted by file name.
pub fn wav_files(dir: &Path) -> Result<Vec<PathBuf>> {
    scan_dir(dir, &["wav"])
}
