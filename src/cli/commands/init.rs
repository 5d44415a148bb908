//! Init command - interactive first-run setup.

use crate::capability;
use crate::cli::Output;
use crate::config::Settings;
use crate::transcribe::model::resolve_model_path;
use console::style;
use std::io::{self, Write};

/// Simple check result for init command.
struct CheckIssue {
    name: String,
    hint: String,
}

/// Run the init command for first-time setup.
pub fn run_init(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Stemme Setup");
    println!();
    println!("Welcome to Stemme! Let's make sure everything is configured correctly.\n");

    // Step 1: Check prerequisites
    println!("{}", style("Step 1: Checking prerequisites").bold().cyan());
    println!();

    let tool_issues = check_prerequisites();

    if !tool_issues.is_empty() {
        Output::warning("Some tools are missing. Please install them:");
        println!();
        for issue in &tool_issues {
            println!("  {} {} - not found", style("✗").red(), style(&issue.name).bold());
            println!("    {} {}", style("→").dim(), style(&issue.hint).dim());
        }
        println!();

        if !prompt_continue("Continue anyway?")? {
            println!();
            Output::info("Setup cancelled. Install the missing tools and run 'stemme init' again.");
            return Ok(());
        }
    } else {
        Output::success("All required tools are installed!");
    }

    println!();

    // Step 2: Check the speech engine
    println!("{}", style("Step 2: Checking the speech engine").bold().cyan());
    println!();

    if !capability::engine_compiled() {
        Output::warning("This binary was built without speech recognition.");
        println!();
        println!("  Transcription needs the whisper engine compiled in:");
        println!("  {}", style("cargo build --release --features whisper").green());
        println!();

        if !prompt_continue("Continue without transcription?")? {
            println!();
            Output::info("Setup cancelled. Rebuild with the whisper feature and run 'stemme init' again.");
            return Ok(());
        }
    } else if resolve_model_path(settings).is_none() {
        Output::warning(&format!(
            "Model '{}' is not installed.",
            settings.transcription.model
        ));
        println!();
        println!("  Download it with:");
        println!(
            "  {}",
            style(format!("stemme model fetch {}", settings.transcription.model)).green()
        );
        println!();

        if !prompt_continue("Continue without a model?")? {
            println!();
            Output::info("Setup cancelled. Fetch a model and run 'stemme init' again.");
            return Ok(());
        }
    } else {
        Output::success(&format!(
            "Speech engine ready with model '{}'!",
            settings.transcription.model
        ));
    }

    println!();

    // Step 3: Create directories
    println!("{}", style("Step 3: Setting up directories").bold().cyan());
    println!();

    let data_dir = settings.data_dir();
    let temp_dir = settings.temp_dir();

    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)?;
        Output::success(&format!("Created data directory: {}", data_dir.display()));
    } else {
        Output::info(&format!("Data directory exists: {}", data_dir.display()));
    }

    if !temp_dir.exists() {
        std::fs::create_dir_all(&temp_dir)?;
        Output::success(&format!("Created temp directory: {}", temp_dir.display()));
    } else {
        Output::info(&format!("Temp directory exists: {}", temp_dir.display()));
    }

    println!();

    // Step 4: Create config file
    println!("{}", style("Step 4: Configuration file").bold().cyan());
    println!();

    let config_path = Settings::default_config_path();
    if config_path.exists() {
        Output::info(&format!("Config file exists: {}", config_path.display()));
    } else if prompt_continue("Create default configuration file?")? {
        // Create parent directory if needed
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        settings.save_to(&config_path)?;
        Output::success(&format!("Created config file: {}", config_path.display()));
        println!();
        println!("  Edit your config with: {}", style("stemme config edit").green());
    } else {
        Output::info("Skipped config file creation. Using defaults.");
    }

    println!();

    // Summary
    println!("{}", style("Setup Complete!").bold().green());
    println!();
    println!("Next steps:");
    println!("  {} Check system status", style("stemme doctor").cyan());
    println!("  {} Fetch a speech model", style("stemme model fetch").cyan());
    println!("  {} Build your first dataset", style("stemme run <url>").cyan());
    println!();
    println!("For more help: {}", style("stemme --help").cyan());

    Ok(())
}

/// Check prerequisites and return any issues.
fn check_prerequisites() -> Vec<CheckIssue> {
    use std::process::Command;

    let mut issues = Vec::new();

    // Check yt-dlp
    if Command::new("yt-dlp").arg("--version").output().is_err() {
        issues.push(CheckIssue {
            name: "yt-dlp".to_string(),
            hint: install_hint("yt-dlp").to_string(),
        });
    }

    // Check ffmpeg
    if Command::new("ffmpeg").arg("-version").output().is_err() {
        issues.push(CheckIssue {
            name: "ffmpeg".to_string(),
            hint: install_hint("ffmpeg").to_string(),
        });
    }

    issues
}

/// Get platform-specific install hint.
fn install_hint(tool: &str) -> &'static str {
    match tool {
        "yt-dlp" => {
            if cfg!(target_os = "macos") {
                "Install with: brew install yt-dlp"
            } else if cfg!(target_os = "linux") {
                "Install with: pip install yt-dlp"
            } else {
                "Install from: https://github.com/yt-dlp/yt-dlp"
            }
        }
        "ffmpeg" => {
            if cfg!(target_os = "macos") {
                "Install with: brew install ffmpeg"
            } else if cfg!(target_os = "linux") {
                "Install with: sudo apt install ffmpeg"
            } else {
                "Install from: https://ffmpeg.org/download.html"
            }
        }
        _ => "Check the documentation for installation instructions",
    }
}

/// Prompt user for yes/no confirmation.
fn prompt_continue(message: &str) -> io::Result<bool> {
    print!("{} {} ", style("?").cyan(), message);
    print!("{} ", style("[y/N]").dim());
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(input.trim().to_lowercase() == "y" || input.trim().to_lowercase() == "yes")
}
