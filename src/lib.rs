//! Stemme - Voice Dataset Preparation
//!
//! A local-first CLI tool for turning long-form speech recordings into a
//! clean, transcribed voice dataset ready for TTS training.
//!
//! The name "Stemme" comes from the Norwegian word for "voice."
//!
//! # Overview
//!
//! Stemme allows you to:
//! - Download source audio from YouTube and other sites via yt-dlp
//! - Clean, normalize and optionally denoise the recordings
//! - Split them into training-sized segments on natural pauses
//! - Resample everything to a uniform rate for TTS consumption
//! - Transcribe each segment locally with whisper.cpp
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `capability` - Startup probing of external collaborators
//! - `audio` - WAV reading, writing and directory scanning
//! - `download` - Source audio acquisition via yt-dlp
//! - `preprocess` - Cleaning, silence splitting and resampling
//! - `transcribe` - Speech-to-text and the metadata table
//! - `pipeline` - End-to-end run coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use stemme::capability::Capabilities;
//! use stemme::config::Settings;
//! use stemme::pipeline::{Pipeline, RunOptions};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let capabilities = Capabilities::detect(&settings);
//!     let pipeline = Pipeline::new(settings, capabilities)?;
//!
//!     let stats = pipeline.run(RunOptions::default()).await?;
//!     println!("Processed {} segments", stats.processed);
//!
//!     Ok(())
//! }
//! ```

pub mod audio;
pub mod capability;
pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod pipeline;
pub mod preprocess;
pub mod transcribe;

pub use error::{Result, StemmeError};
