//! Error types for Stemme.

use thiserror::Error;

/// Library-level error type for Stemme operations.
#[derive(Error, Debug)]
pub enum StemmeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Audio source error: {0}")]
    AudioSource(String),

    #[error("Audio download failed: {0}")]
    AudioDownload(String),

    #[error("Audio processing failed: {0}")]
    AudioProcessing(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Metadata error: {0}")]
    Metadata(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for Stemme operations.
pub type Result<T> = std::result::Result<T, StemmeError>;
