//! yt-dlp backed audio fetching.
//!
//! Shells out to yt-dlp for best-audio extraction. Each invocation is
//! bounded by the configured timeout and the child is killed if the
//! timeout fires.

use crate::config::DownloadSettings;
use crate::download::AudioFetcher;
use crate::error::{Result, StemmeError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{info, instrument};

pub struct YtDlpFetcher {
    audio_format: String,
    audio_quality: String,
    timeout: Duration,
}

impl YtDlpFetcher {
    pub fn new(settings: &DownloadSettings) -> Self {
        Self {
            audio_format: settings.audio_format.clone(),
            audio_quality: settings.audio_quality.clone(),
            timeout: Duration::from_secs(settings.timeout_seconds),
        }
    }
}

#[async_trait]
impl AudioFetcher for YtDlpFetcher {
    #[instrument(skip(self, output_dir), fields(stem = %stem))]
    async fn fetch(&self, url: &str, stem: &str, output_dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(output_dir)?;

        let target_path = output_dir.join(format!("{}.{}", stem, self.audio_format));
        if target_path.exists() {
            info!("Using cached audio file");
            return Ok(target_path);
        }

        info!("Downloading audio from {}", url);

        let template = output_dir.join(format!("{}.%(ext)s", stem));

        let mut command = Command::new("yt-dlp");
        command
            .arg("-f")
            .arg("bestaudio")
            .arg("--extract-audio")
            .arg("--audio-format")
            .arg(&self.audio_format)
            .arg("--audio-quality")
            .arg(&self.audio_quality)
            .arg("--output")
            .arg(template.to_str().unwrap_or_default())
            .arg("--no-playlist")
            .arg("--quiet")
            .arg("--no-warnings")
            .arg(url)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let result = tokio::time::timeout(self.timeout, command.output()).await;

        let output = match result {
            Err(_) => {
                return Err(StemmeError::AudioDownload(format!(
                    "yt-dlp timed out after {}s",
                    self.timeout.as_secs()
                )));
            }
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StemmeError::ToolNotFound("yt-dlp".into()));
            }
            Ok(Err(e)) => {
                return Err(StemmeError::AudioDownload(format!(
                    "yt-dlp execution failed: {e}"
                )));
            }
            Ok(Ok(o)) => o,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(StemmeError::AudioDownload(format!(
                "yt-dlp failed: {stderr}"
            )));
        }

        // yt-dlp may fall back to a different container than requested.
        find_audio_file(output_dir, stem, &self.audio_format)
    }
}

/// Locates a downloaded audio file by its stem.
fn find_audio_file(dir: &Path, stem: &str, preferred_ext: &str) -> Result<PathBuf> {
    let preferred = dir.join(format!("{}.{}", stem, preferred_ext));
    if preferred.exists() {
        return Ok(preferred);
    }

    for ext in crate::audio::SUPPORTED_EXTENSIONS {
        let candidate = dir.join(format!("{}.{}", stem, ext));
        if candidate.exists() {
            return Ok(candidate);
        }
    }

    // Fallback: scan directory for matching prefix
    let entries = std::fs::read_dir(dir)
        .map_err(|e| StemmeError::AudioDownload(format!("Cannot read directory: {e}")))?;

    for entry in entries.flatten() {
        let name = entry.file_name();
        if name.to_string_lossy().starts_with(stem) {
            return Ok(entry.path());
        }
    }

    Err(StemmeError::AudioDownload(
        "Audio file not found after download".into(),
    ))
}
