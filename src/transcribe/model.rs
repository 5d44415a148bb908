//! Whisper model catalog and local model management.
//!
//! Models are GGML files fetched from the whisper.cpp mirror on
//! HuggingFace and stored under the data directory. The configured model
//! may also be given as a direct path to a `.bin` file, which bypasses
//! the catalog entirely.

use crate::config::Settings;
use crate::error::{Result, StemmeError};
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

/// Metadata for a downloadable Whisper model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInfo {
    /// Model identifier (e.g., "tiny.en", "base", "large")
    pub name: &'static str,
    /// Approximate download size in megabytes
    pub size_mb: u32,
    /// Download URL from HuggingFace
    pub url: &'static str,
    /// Whether this model transcribes English only
    pub english_only: bool,
}

/// Catalog of known Whisper models, smallest to largest. The `.en`
/// variants are English-only and slightly more accurate for English
/// at the same size.
pub const MODELS: &[ModelInfo] = &[
    ModelInfo {
        name: "tiny.en",
        size_mb: 75,
        url: "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-tiny.en.bin",
        english_only: true,
    },
    ModelInfo {
        name: "tiny",
        size_mb: 75,
        url: "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-tiny.bin",
        english_only: false,
    },
    ModelInfo {
        name: "base.en",
        size_mb: 142,
        url: "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-base.en.bin",
        english_only: true,
    },
    ModelInfo {
        name: "base",
        size_mb: 142,
        url: "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-base.bin",
        english_only: false,
    },
    ModelInfo {
        name: "small.en",
        size_mb: 466,
        url: "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-small.en.bin",
        english_only: true,
    },
    ModelInfo {
        name: "small",
        size_mb: 466,
        url: "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-small.bin",
        english_only: false,
    },
    ModelInfo {
        name: "medium.en",
        size_mb: 1533,
        url: "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-medium.en.bin",
        english_only: true,
    },
    ModelInfo {
        name: "medium",
        size_mb: 1533,
        url: "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-medium.bin",
        english_only: false,
    },
    ModelInfo {
        name: "large",
        size_mb: 3094,
        url: "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-large.bin",
        english_only: false,
    },
];

/// Find a catalog model by name.
pub fn get_model(name: &str) -> Option<&'static ModelInfo> {
    MODELS.iter().find(|m| m.name == name)
}

/// File name a model is stored under.
pub fn model_file_name(name: &str) -> String {
    format!("ggml-{}.bin", name)
}

/// The path the configured model would live at, whether or not it exists.
///
/// A model value ending in `.bin` is treated as a direct file path
/// (tilde-expanded); anything else is a catalog name under the models
/// directory.
pub fn configured_model_path(settings: &Settings) -> PathBuf {
    let model = &settings.transcription.model;
    if model.ends_with(".bin") {
        Settings::expand_path(model)
    } else {
        settings.models_dir().join(model_file_name(model))
    }
}

/// Resolve the configured model to an existing file, if there is one.
pub fn resolve_model_path(settings: &Settings) -> Option<PathBuf> {
    let path = configured_model_path(settings);
    path.exists().then_some(path)
}

/// Model names installed in the models directory, sorted.
pub fn installed_models(settings: &Settings) -> Vec<String> {
    let dir = settings.models_dir();
    let entries = match std::fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };

    let mut names: Vec<String> = entries
        .filter_map(|entry| {
            let entry = entry.ok()?;
            let name = entry.file_name();
            let name = name.to_str()?;
            let model = name.strip_prefix("ggml-")?.strip_suffix(".bin")?;
            entry.path().is_file().then(|| model.to_string())
        })
        .collect();

    names.sort();
    names
}

/// One catalog row for display, with installation status.
pub fn format_model_info(model: &ModelInfo, installed: bool) -> String {
    let status = if installed {
        "[installed]"
    } else {
        "[not installed]"
    };
    format!("{:12} {:5} MB   {}", model.name, model.size_mb, status)
}

/// Download a catalog model into the models directory.
///
/// Streams to a `.partial` file and renames on completion, so an
/// interrupted download never leaves a truncated model behind. Returns
/// the installed path; already-installed models short-circuit.
pub async fn fetch_model(name: &str, settings: &Settings) -> Result<PathBuf> {
    let info = get_model(name).ok_or_else(|| {
        StemmeError::Model(format!(
            "Unknown model '{}'. Run `stemme model list` to see available models.",
            name
        ))
    })?;

    let path = settings.models_dir().join(model_file_name(name));
    if path.exists() {
        info!("Model '{}' is already installed at {}", name, path.display());
        return Ok(path);
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    info!("Downloading {} ({} MB)...", name, info.size_mb);

    let client = reqwest::Client::new();
    let response = client.get(info.url).send().await?;
    if !response.status().is_success() {
        return Err(StemmeError::Model(format!(
            "Model download failed with status {}",
            response.status()
        )));
    }

    let total_size = response.content_length().unwrap_or(0);
    let pb = ProgressBar::new(total_size);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
            .unwrap()
            .progress_chars("#>-"),
    );

    let partial = path.with_extension("bin.partial");
    let mut file = std::fs::File::create(&partial)?;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk)?;
        pb.inc(chunk.len() as u64);
    }
    file.flush()?;
    drop(file);
    pb.finish_and_clear();

    std::fs::rename(&partial, &path)?;
    info!("Model installed to {}", path.display());
    Ok(path)
}
