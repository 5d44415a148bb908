//! Capability detection for external collaborators.
//!
//! All optional collaborators (yt-dlp, ffmpeg, the speech engine) are probed
//! once at startup into a [`Capabilities`] value that is passed into each
//! stage constructor. A stage never probes on its own, so degraded behavior
//! is decided in one inspectable place and is easy to simulate in tests.

use crate::config::Settings;
use crate::error::{Result, StemmeError};
use std::path::PathBuf;
use std::process::Command;

/// Availability of the optional collaborators a pipeline run may need.
#[derive(Debug, Clone, Default)]
pub struct Capabilities {
    /// `yt-dlp` is on PATH and answers `--version`.
    pub ytdlp: bool,
    /// `ffmpeg` is on PATH and answers `-version`.
    pub ffmpeg: bool,
    /// The speech engine is compiled in and a model file was resolved.
    pub transcription: bool,
    /// Resolved GGML model path when transcription is available.
    pub model_path: Option<PathBuf>,
}

impl Capabilities {
    /// Probe every collaborator for the given settings.
    pub fn detect(settings: &Settings) -> Self {
        let model_path = crate::transcribe::model::resolve_model_path(settings);
        Self {
            ytdlp: check_tool("yt-dlp").is_ok(),
            ffmpeg: check_tool("ffmpeg").is_ok(),
            transcription: engine_compiled() && model_path.is_some(),
            model_path,
        }
    }

    /// A descriptor with every capability present. For tests that inject
    /// their own collaborators.
    pub fn assume_all() -> Self {
        Self {
            ytdlp: true,
            ffmpeg: true,
            transcription: true,
            model_path: None,
        }
    }

    /// Fail unless audio downloading can work.
    pub fn require_download(&self) -> Result<()> {
        if self.ytdlp {
            Ok(())
        } else {
            Err(StemmeError::ToolNotFound("yt-dlp".to_string()))
        }
    }

    /// Fail unless local transcription can work.
    pub fn require_transcription(&self) -> Result<()> {
        if !engine_compiled() {
            return Err(StemmeError::Transcription(
                "speech engine not compiled in; rebuild with --features whisper".to_string(),
            ));
        }
        if self.model_path.is_none() {
            return Err(StemmeError::Model(
                "no model file found; run `stemme model fetch` first".to_string(),
            ));
        }
        Ok(())
    }
}

/// Whether the whisper engine was compiled into this binary.
pub fn engine_compiled() -> bool {
    cfg!(feature = "whisper")
}

/// Check if an external tool is available.
pub fn check_tool(name: &str) -> Result<()> {
    // ffmpeg/ffprobe use -version (single dash), others use --version
    let version_arg = match name {
        "ffmpeg" | "ffprobe" => "-version",
        _ => "--version",
    };
    match Command::new(name).arg(version_arg).output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(StemmeError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(StemmeError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(StemmeError::ToolNotFound(format!("{}: {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_ytdlp_blocks_download() {
        let caps = Capabilities::default();
        assert!(caps.require_download().is_err());
    }

    #[test]
    fn assume_all_allows_download() {
        let caps = Capabilities::assume_all();
        assert!(caps.require_download().is_ok());
    }

    #[test]
    fn nonexistent_tool_reports_not_found() {
        let err = check_tool("definitely-not-a-real-tool-xyz").unwrap_err();
        assert!(matches!(err, StemmeError::ToolNotFound(_)));
    }
}
