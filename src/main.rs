//! Stemme CLI entry point.

use anyhow::Result;
use clap::Parser;
use stemme::capability::Capabilities;
use stemme::cli::{commands, Cli, Commands};
use stemme::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("stemme={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&std::path::PathBuf::from(path)))?,
        None => Settings::load()?,
    };

    // Ensure data directories exist
    std::fs::create_dir_all(settings.data_dir())?;
    std::fs::create_dir_all(settings.temp_dir())?;

    // Probe external collaborators once; commands decide what they need
    let capabilities = Capabilities::detect(&settings);

    // Execute command
    match cli.command {
        Commands::Init => {
            commands::run_init(&settings)?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings)?;
        }

        Commands::Run {
            urls,
            urls_file,
            skip_download,
            skip_transcription,
            clean_intermediate,
            keep_raw,
        } => {
            commands::run_pipeline(
                urls,
                urls_file,
                skip_download,
                skip_transcription,
                clean_intermediate,
                keep_raw,
                settings,
                capabilities,
            )
            .await?;
        }

        Commands::Download { urls, urls_file } => {
            commands::run_download(urls, urls_file, settings, capabilities).await?;
        }

        Commands::Preprocess => {
            commands::run_preprocess(settings, capabilities).await?;
        }

        Commands::Transcribe { model, language } => {
            commands::run_transcribe(model, language, settings).await?;
        }

        Commands::Stats => {
            commands::run_stats(&settings)?;
        }

        Commands::Model { action } => {
            commands::run_model(&action, &settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(&action, settings)?;
        }
    }

    Ok(())
}
