//! Download command implementation.

use crate::capability::Capabilities;
use crate::cli::Output;
use crate::config::{Settings, SourceSettings};
use crate::download::Downloader;
use anyhow::Result;

/// Fetch all configured source URLs into the raw stage directory.
pub async fn run_download(
    urls: Vec<String>,
    urls_file: Option<String>,
    mut settings: Settings,
    capabilities: Capabilities,
) -> Result<()> {
    if let Err(e) = capabilities.require_download() {
        Output::error(&format!("{}", e));
        Output::info("Run 'stemme doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    if !urls.is_empty() || urls_file.is_some() {
        settings.sources = SourceSettings { urls, urls_file };
    }

    let sources = settings.resolve_sources()?;
    if sources.is_empty() {
        Output::warning("No source URLs given; nothing to download");
        return Ok(());
    }

    Output::info(&format!("Downloading {} sources", sources.len()));

    let downloader = Downloader::new(&settings.download);
    let raw_dir = settings.raw_audio_dir();
    let files = downloader.download_all(&sources, &raw_dir).await?;

    if files.is_empty() {
        Output::error("Every download failed; nothing was saved");
        anyhow::bail!("all downloads failed");
    }

    Output::success(&format!(
        "Downloaded {} of {} sources to {}",
        files.len(),
        sources.len(),
        raw_dir.display()
    ));
    Ok(())
}
