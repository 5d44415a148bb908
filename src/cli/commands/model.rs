//! Model management command implementation.

use crate::cli::{ModelAction, Output};
use crate::config::Settings;
use crate::transcribe::model::{fetch_model, format_model_info, installed_models, MODELS};
use anyhow::Result;

/// Run the model command.
pub async fn run_model(action: &ModelAction, settings: &Settings) -> Result<()> {
    match action {
        ModelAction::List => {
            let installed = installed_models(settings);
            Output::header("Whisper models");
            for model in MODELS {
                let have = installed.iter().any(|name| name == model.name);
                println!("  {}", format_model_info(model, have));
            }
            println!();
            Output::kv("Models dir", &settings.models_dir().display().to_string());
            Output::info("Fetch one with: stemme model fetch <name>");
            Ok(())
        }
        ModelAction::Fetch { name } => {
            let name = name
                .clone()
                .unwrap_or_else(|| settings.transcription.model.clone());
            Output::info(&format!("Fetching {} model", name));
            let path = fetch_model(&name, settings).await?;
            Output::success(&format!("Model '{}' installed at {}", name, path.display()));
            Ok(())
        }
    }
}
