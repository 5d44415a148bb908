//! Audio acquisition from remote sources.
//!
//! The [`Downloader`] drives a pluggable [`AudioFetcher`] over a source URL
//! list with bounded parallelism. Output files are keyed by a stable hash of
//! the URL, so re-running a batch never duplicates work and never depends on
//! remote titles.

pub mod ytdlp;

use crate::config::DownloadSettings;
use crate::error::{Result, StemmeError};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// Fetches the audio track for one source URL into a directory.
#[async_trait]
pub trait AudioFetcher: Send + Sync {
    /// Fetch `url` into `output_dir`, naming the file by `stem`.
    /// Returns the path of the produced file.
    async fn fetch(&self, url: &str, stem: &str, output_dir: &Path) -> Result<PathBuf>;
}

/// Stable file stem for a source URL: the first 16 hex digits of its
/// SHA-256. Unique per URL and independent of remote metadata.
pub fn source_stem(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    digest
        .iter()
        .take(8)
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Stage 1: batch audio download.
pub struct Downloader {
    fetcher: Arc<dyn AudioFetcher>,
    parallel: usize,
}

impl Downloader {
    /// Build a downloader backed by yt-dlp.
    pub fn new(settings: &DownloadSettings) -> Self {
        Self {
            fetcher: Arc::new(ytdlp::YtDlpFetcher::new(settings)),
            parallel: settings.parallel.max(1),
        }
    }

    /// Build a downloader with an injected fetcher. Used by tests.
    pub fn with_fetcher(fetcher: Arc<dyn AudioFetcher>, parallel: usize) -> Self {
        Self {
            fetcher,
            parallel: parallel.max(1),
        }
    }

    /// Validate and fetch a single source URL.
    pub async fn download(&self, url: &str, output_dir: &Path) -> Result<PathBuf> {
        Url::parse(url)
            .map_err(|e| StemmeError::AudioSource(format!("invalid URL {}: {}", url, e)))?;
        self.fetcher.fetch(url, &source_stem(url), output_dir).await
    }

    /// Fetch every URL in the list, tolerating per-item failures.
    ///
    /// With parallelism 1 the URLs are processed in list order; otherwise a
    /// bounded pool collects completions in whatever order they finish.
    /// Returns the paths of the successful downloads.
    #[instrument(skip_all, fields(count = urls.len()))]
    pub async fn download_all(&self, urls: &[String], output_dir: &Path) -> Result<Vec<PathBuf>> {
        if urls.is_empty() {
            info!("No source URLs to download");
            return Ok(Vec::new());
        }
        std::fs::create_dir_all(output_dir)?;

        info!(
            "Downloading {} sources ({} in parallel)",
            urls.len(),
            self.parallel
        );

        let results: Vec<Option<PathBuf>> = if self.parallel <= 1 {
            let mut out = Vec::with_capacity(urls.len());
            for url in urls {
                out.push(self.try_download(url, output_dir).await);
            }
            out
        } else {
            stream::iter(urls)
                .map(|url| async move { self.try_download(url, output_dir).await })
                .buffer_unordered(self.parallel)
                .collect()
                .await
        };

        let paths: Vec<PathBuf> = results.into_iter().flatten().collect();
        if paths.len() < urls.len() {
            warn!("Downloaded {}/{} sources", paths.len(), urls.len());
        } else {
            info!("Downloaded {}/{} sources", paths.len(), urls.len());
        }
        Ok(paths)
    }

    async fn try_download(&self, url: &str, output_dir: &Path) -> Option<PathBuf> {
        match self.download(url, output_dir).await {
            Ok(path) => {
                debug!("Downloaded {} -> {}", url, path.display());
                Some(path)
            }
            Err(e) => {
                error!("Failed to download {}: {}", url, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Fetcher that writes a marker file, failing for URLs containing "fail".
    struct MockFetcher {
        calls: Mutex<Vec<String>>,
    }

    impl MockFetcher {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl AudioFetcher for MockFetcher {
        async fn fetch(&self, url: &str, stem: &str, output_dir: &Path) -> Result<PathBuf> {
            self.calls.lock().unwrap().push(url.to_string());
            if url.contains("fail") {
                return Err(StemmeError::AudioDownload("simulated failure".into()));
            }
            let path = output_dir.join(format!("{}.wav", stem));
            std::fs::write(&path, b"audio")?;
            Ok(path)
        }
    }

    #[test]
    fn source_stem_is_stable_and_distinct() {
        let a = source_stem("https://example.com/watch?v=abc");
        let b = source_stem("https://example.com/watch?v=abc");
        let c = source_stem("https://example.com/watch?v=abd");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 16);
        assert!(a.chars().all(|ch| ch.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn download_all_isolates_per_item_failures() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = Downloader::with_fetcher(Arc::new(MockFetcher::new()), 2);
        let urls = vec![
            "https://example.com/a".to_string(),
            "https://example.com/fail-1".to_string(),
            "https://example.com/b".to_string(),
        ];

        let paths = downloader.download_all(&urls, dir.path()).await.unwrap();

        assert_eq!(paths.len(), 2);
        for path in &paths {
            assert!(path.exists());
        }
    }

    #[tokio::test]
    async fn sequential_mode_preserves_list_order() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(MockFetcher::new());
        let downloader = Downloader::with_fetcher(fetcher.clone(), 1);
        let urls = vec![
            "https://example.com/1".to_string(),
            "https://example.com/2".to_string(),
            "https://example.com/3".to_string(),
        ];

        downloader.download_all(&urls, dir.path()).await.unwrap();

        assert_eq!(*fetcher.calls.lock().unwrap(), urls);
    }

    #[tokio::test]
    async fn malformed_url_fails_before_the_fetcher_runs() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(MockFetcher::new());
        let downloader = Downloader::with_fetcher(fetcher.clone(), 1);

        let err = downloader.download("not a url", dir.path()).await;
        assert!(matches!(err, Err(StemmeError::AudioSource(_))));
        assert!(fetcher.calls.lock().unwrap().is_empty());

        // In a batch it is just another skipped item.
        let urls = vec![
            "not a url".to_string(),
            "https://example.com/ok".to_string(),
        ];
        let paths = downloader.download_all(&urls, dir.path()).await.unwrap();
        assert_eq!(paths.len(), 1);
    }

    #[tokio::test]
    async fn empty_url_list_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = Downloader::with_fetcher(Arc::new(MockFetcher::new()), 3);
        let paths = downloader.download_all(&[], dir.path()).await.unwrap();
        assert!(paths.is_empty());
    }
}
