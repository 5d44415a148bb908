//! CLI module for Stemme.

pub mod commands;
mod output;

pub use output::{format_duration, Output};

use clap::{Parser, Subcommand};

/// Stemme - Voice training-data preparation
///
/// Turns a list of source URLs into a cleaned, segmented, transcribed voice
/// dataset ready for TTS or voice-conversion training. The name "Stemme"
/// comes from the Norwegian word for "voice."
#[derive(Parser, Debug)]
#[command(name = "stemme")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize Stemme and verify system requirements
    Init,

    /// Check system requirements and configuration
    Doctor,

    /// Run the full pipeline: download, preprocess, transcribe, finalize
    Run {
        /// Source URLs; overrides the configured list when given
        urls: Vec<String>,

        /// File with one source URL per line (blank lines and # comments ignored)
        #[arg(long)]
        urls_file: Option<String>,

        /// Reuse existing raw audio instead of downloading
        #[arg(long)]
        skip_download: bool,

        /// Reuse the existing metadata table instead of transcribing
        #[arg(long)]
        skip_transcription: bool,

        /// Delete intermediate stage directories after a successful run
        #[arg(long)]
        clean_intermediate: bool,

        /// Keep the raw downloads when cleaning intermediates
        #[arg(long, requires = "clean_intermediate")]
        keep_raw: bool,
    },

    /// Download source audio into the raw stage directory
    Download {
        /// Source URLs; overrides the configured list when given
        urls: Vec<String>,

        /// File with one source URL per line
        #[arg(long)]
        urls_file: Option<String>,
    },

    /// Clean, segment and resample existing raw audio
    Preprocess,

    /// Transcribe processed segments into metadata.csv
    Transcribe {
        /// Model size override (tiny, base, small, medium, large, or a .en variant)
        #[arg(short, long)]
        model: Option<String>,

        /// Language hint override (e.g. en, no, auto)
        #[arg(short, long)]
        language: Option<String>,
    },

    /// Report on the prepared dataset
    Stats,

    /// Manage speech-recognition models
    Model {
        #[command(subcommand)]
        action: ModelAction,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ModelAction {
    /// List known models and their installation status
    List,

    /// Download a model file (defaults to the configured model)
    Fetch {
        /// Model name, e.g. base.en or medium
        name: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
