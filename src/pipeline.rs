//! Pipeline orchestrator for Stemme.
//!
//! Sequences the six dataset-preparation stages from source download to the
//! final `voice_dataset/` layout, accumulating per-stage statistics and
//! checking quality gates along the way.

use crate::audio;
use crate::capability::Capabilities;
use crate::config::Settings;
use crate::download::{AudioFetcher, Downloader};
use crate::error::{Result, StemmeError};
use crate::preprocess::Preprocessor;
use crate::transcribe::{self, SpeechToText, TranscriptionStage};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Stage-skip flags for one pipeline invocation.
///
/// Every stage writes durable, deterministically named files, so skipping an
/// early stage and resuming from its previous output is always safe.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Reuse whatever is already in the raw audio directory.
    pub skip_download: bool,
    /// Reuse an existing metadata table instead of transcribing.
    pub skip_transcription: bool,
}

/// The main orchestrator for the Stemme pipeline.
pub struct Pipeline {
    settings: Settings,
    capabilities: Capabilities,
    downloader: Downloader,
    preprocessor: Preprocessor,
    transcriber: Option<Arc<dyn SpeechToText>>,
}

impl Pipeline {
    /// Create a pipeline with default components for the given settings.
    ///
    /// The speech engine is only constructed when the capability probe found
    /// both the compiled engine and a model file; otherwise the transcription
    /// stage degrades to a logged skip.
    pub fn new(settings: Settings, capabilities: Capabilities) -> Result<Self> {
        let downloader = Downloader::new(&settings.download);
        let preprocessor = Preprocessor::new(&settings, &capabilities);

        let transcriber: Option<Arc<dyn SpeechToText>> = match &capabilities.model_path {
            Some(model_path) if capabilities.transcription => Some(Arc::new(
                transcribe::whisper::WhisperEngine::new(model_path, &settings.transcription)?,
            )),
            _ => None,
        };

        Ok(Self {
            settings,
            capabilities,
            downloader,
            preprocessor,
            transcriber,
        })
    }

    /// Create a pipeline with custom components. Used by tests.
    pub fn with_components(
        settings: Settings,
        capabilities: Capabilities,
        fetcher: Arc<dyn AudioFetcher>,
        transcriber: Option<Arc<dyn SpeechToText>>,
    ) -> Self {
        let downloader = Downloader::with_fetcher(fetcher, settings.download.parallel);
        let preprocessor = Preprocessor::new(&settings, &capabilities);
        Self {
            settings,
            capabilities,
            downloader,
            preprocessor,
            transcriber,
        }
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Run the full pipeline: download, clean, segment, resample, transcribe,
    /// finalize.
    ///
    /// A run that produces zero raw recordings or zero segments stops early
    /// and returns the statistics gathered so far; nothing downstream could
    /// make progress from an empty set. Quality shortfalls are warnings,
    /// never aborts. Asking to skip transcription without a stored metadata
    /// table is an error.
    #[instrument(skip(self))]
    pub async fn run(&self, opts: RunOptions) -> Result<PipelineStats> {
        let mut stats = PipelineStats::default();

        info!("Starting voice dataset preparation");
        self.settings.create_directories()?;

        let raw_dir = self.settings.raw_audio_dir();

        if opts.skip_download {
            eprintln!("[1/6] Using existing raw audio (download skipped)");
            stats.downloaded = audio::scan_dir(&raw_dir, audio::SUPPORTED_EXTENSIONS)?.len();
            info!("Found {} existing raw recordings", stats.downloaded);
        } else {
            eprintln!("[1/6] Downloading source audio...");
            let urls = self.settings.resolve_sources()?;
            let downloaded = self.downloader.download_all(&urls, &raw_dir).await?;
            stats.downloaded = downloaded.len();
        }

        if stats.downloaded == 0 {
            error!("No raw audio to process; stopping");
            return Ok(stats);
        }

        eprintln!("[2/6] Cleaning and normalizing...");
        let clean_dir = self.settings.clean_audio_dir();
        let cleaned = self.preprocessor.clean_all(&raw_dir, &clean_dir).await?;
        stats.cleaned = cleaned.len();

        eprintln!("[3/6] Splitting on silence...");
        let segments_dir = self.settings.segments_dir();
        let segments = self.preprocessor.segment_all(&clean_dir, &segments_dir)?;
        stats.segments = segments.len();

        if stats.segments == 0 {
            error!("No segments produced; stopping");
            return Ok(stats);
        }

        eprintln!(
            "[4/6] Resampling to {} Hz...",
            self.settings.preprocess.target_sample_rate
        );
        let processed_dir = self.settings.processed_dir();
        let processed = self
            .preprocessor
            .resample_all(&segments_dir, &processed_dir)?;
        stats.processed = processed.len();

        let (duration, _) = self.preprocessor.total_duration(&processed_dir)?;
        stats.duration_seconds = duration;
        eprintln!("  Total duration: {:.1} minutes", stats.duration_minutes());
        self.check_duration(&stats);

        if opts.skip_transcription {
            eprintln!("[5/6] Loading existing metadata (transcription skipped)");
            let metadata_path = self.settings.metadata_path();
            if !metadata_path.exists() {
                return Err(StemmeError::Metadata(format!(
                    "cannot skip transcription: no metadata table at {}",
                    metadata_path.display()
                )));
            }
            let records = transcribe::load_metadata(&metadata_path)?;
            stats.transcribed = records.len();
            info!("Loaded {} existing transcription records", records.len());
        } else if let Some(engine) = &self.transcriber {
            eprintln!("[5/6] Transcribing...");
            let stage = TranscriptionStage::new(engine.clone());
            let records = stage
                .transcribe_dir(&processed_dir, &self.settings.metadata_path())
                .await?;
            stats.transcribed = records.len();

            let kept =
                transcribe::filter_low_confidence(&records, self.settings.quality.min_confidence);
            info!(
                "Kept {}/{} records at confidence >= {:.2}",
                kept.len(),
                records.len(),
                self.settings.quality.min_confidence
            );
        } else {
            let reason = self
                .capabilities
                .require_transcription()
                .err()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "speech engine unavailable".to_string());
            eprintln!("[5/6] Transcription skipped: {}", reason);
            warn!("Transcription unavailable, dataset will have no metadata: {}", reason);
        }

        eprintln!("[6/6] Assembling dataset...");
        self.finalize()?;

        self.report(&stats);
        Ok(stats)
    }

    /// Warn when the processed duration falls outside the configured band.
    fn check_duration(&self, stats: &PipelineStats) {
        let minutes = stats.duration_minutes();
        let min = self.settings.quality.min_total_duration_minutes as f64;
        let max = self.settings.quality.max_total_duration_minutes as f64;
        if minutes < min {
            warn!(
                "Only {:.1} minutes of audio; recommended minimum is {:.0} minutes",
                minutes, min
            );
        } else if minutes > max {
            warn!(
                "{:.1} minutes of audio; recommended maximum is {:.0} minutes",
                minutes, max
            );
        }
    }

    /// Copy processed segments into `wavs/`, cross-check them against the
    /// metadata table, and export the run-config snapshot.
    fn finalize(&self) -> Result<()> {
        let wavs_dir = self.settings.wavs_dir();
        std::fs::create_dir_all(&wavs_dir)?;

        let processed = audio::wav_files(&self.settings.processed_dir())?;
        info!(
            "Copying {} files into {}",
            processed.len(),
            wavs_dir.display()
        );

        for path in &processed {
            let Some(name) = path.file_name() else {
                continue;
            };
            let dest = wavs_dir.join(name);
            if self.settings.general.skip_existing && dest.exists() {
                continue;
            }
            std::fs::copy(path, &dest)?;
        }

        self.cross_check();
        self.export_config(&self.settings.dataset_dir().join("dataset_config.json"))?;

        info!("Dataset ready at {}", self.settings.dataset_dir().display());
        Ok(())
    }

    /// Warn about wav files without a metadata row and rows without a wav.
    /// Advisory only; a broken or absent table never fails the run.
    fn cross_check(&self) {
        let metadata_path = self.settings.metadata_path();
        if !metadata_path.exists() {
            warn!("Dataset has no metadata table at {}", metadata_path.display());
            return;
        }
        let records = match transcribe::load_metadata(&metadata_path) {
            Ok(records) => records,
            Err(e) => {
                warn!("Could not read {}: {}", metadata_path.display(), e);
                return;
            }
        };
        let on_disk: HashSet<String> = match audio::wav_files(&self.settings.wavs_dir()) {
            Ok(files) => files
                .iter()
                .filter_map(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .collect(),
            Err(e) => {
                warn!("Could not scan {}: {}", self.settings.wavs_dir().display(), e);
                return;
            }
        };

        let recorded: HashSet<&str> = records.iter().map(|r| r.filename.as_str()).collect();
        let untranscribed = on_disk
            .iter()
            .filter(|name| !recorded.contains(name.as_str()))
            .count();
        if untranscribed > 0 {
            warn!("{} wav files have no metadata row", untranscribed);
        }
        let missing = recorded
            .iter()
            .filter(|name| !on_disk.contains(**name))
            .count();
        if missing > 0 {
            warn!("{} metadata rows reference missing wav files", missing);
        }
    }

    /// Write a JSON snapshot of the parameters that shaped this dataset, so
    /// a result can be reproduced without the full config file.
    pub fn export_config(&self, path: &Path) -> Result<()> {
        let urls = self
            .settings
            .resolve_sources()
            .unwrap_or_else(|_| self.settings.sources.urls.clone());
        let snapshot = serde_json::json!({
            "generated_at": chrono::Utc::now().to_rfc3339(),
            "source_urls": urls,
            "target_sample_rate": self.settings.preprocess.target_sample_rate,
            "model": self.settings.transcription.model,
            "min_segment_ms": self.settings.segmentation.min_segment_ms,
            "max_segment_ms": self.settings.segmentation.max_segment_ms,
            "silence_threshold_db": self.settings.segmentation.silence_threshold_db,
        });
        std::fs::write(path, serde_json::to_string_pretty(&snapshot)?)?;
        info!("Run configuration exported to {}", path.display());
        Ok(())
    }

    /// Remove intermediate stage directories. The processed directory and the
    /// final dataset are always kept.
    pub fn clean_intermediate(&self, keep_raw: bool) {
        info!("Removing intermediate stage directories");
        if !keep_raw {
            remove_stage_dir(&self.settings.raw_audio_dir());
        }
        remove_stage_dir(&self.settings.clean_audio_dir());
        remove_stage_dir(&self.settings.segments_dir());
    }

    /// Log the end-of-run statistics and quality-gate verdicts.
    fn report(&self, stats: &PipelineStats) {
        let minutes = stats.duration_minutes();

        info!("Pipeline complete");
        info!("  Downloaded recordings: {}", stats.downloaded);
        info!("  Cleaned recordings:    {}", stats.cleaned);
        info!("  Segments:              {}", stats.segments);
        info!("  Processed files:       {}", stats.processed);
        info!("  Transcribed:           {}", stats.transcribed);
        info!(
            "  Total duration:        {:.1} minutes ({:.2} hours)",
            minutes,
            minutes / 60.0
        );
        if stats.segments > 0 {
            info!(
                "  Average segment:       {:.1}s",
                stats.average_segment_seconds()
            );
        }

        let min_minutes = self.settings.quality.min_total_duration_minutes as f64;
        if minutes >= min_minutes {
            info!("Duration gate passed: {:.1} minutes", minutes);
        } else {
            warn!(
                "Duration gate: {:.1} minutes, recommended at least {:.0}",
                minutes, min_minutes
            );
        }
        if stats.segments >= self.settings.quality.min_segments {
            info!("Segment gate passed: {} segments", stats.segments);
        } else {
            warn!(
                "Segment gate: {} segments, recommended at least {}",
                stats.segments, self.settings.quality.min_segments
            );
        }
    }
}

fn remove_stage_dir(dir: &Path) {
    if !dir.exists() {
        return;
    }
    if let Err(e) = std::fs::remove_dir_all(dir) {
        warn!("Failed to remove {}: {}", dir.display(), e);
    }
}

/// Counters accumulated across one pipeline run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineStats {
    /// Raw recordings acquired in stage 1.
    pub downloaded: usize,
    /// Recordings that survived cleaning.
    pub cleaned: usize,
    /// Segments produced by silence splitting.
    pub segments: usize,
    /// Segments resampled to the target rate.
    pub processed: usize,
    /// Segments with a transcription record.
    pub transcribed: usize,
    /// Total processed audio duration in seconds.
    pub duration_seconds: f64,
}

impl PipelineStats {
    /// Total processed duration in minutes.
    pub fn duration_minutes(&self) -> f64 {
        self.duration_seconds / 60.0
    }

    /// Mean segment duration in seconds; zero when nothing was segmented.
    pub fn average_segment_seconds(&self) -> f64 {
        if self.segments == 0 {
            0.0
        } else {
            self.duration_seconds / self.segments as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StemmeError;
    use crate::transcribe::TranscriptionRecord;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::Mutex;

    const RATE: u32 = 8000;

    fn tone(len: usize) -> Vec<i16> {
        (0..len)
            .map(|i| if i % 2 == 0 { 8000 } else { -8000 })
            .collect()
    }

    fn write_wav(path: &Path, samples: &[i16]) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: RATE,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    /// 2.5s speech, 0.8s silence, 2.5s speech. With the default segmentation
    /// settings this splits into two segments of 2.7s each.
    fn write_speech(path: &Path) {
        let mut samples = tone((RATE as usize * 5) / 2);
        samples.extend(std::iter::repeat(0).take((RATE as usize * 8) / 10));
        samples.extend(tone((RATE as usize * 5) / 2));
        write_wav(path, &samples);
    }

    /// 0.5s of speech with no silence: its single chunk is shorter than the
    /// minimum segment length, so segmentation discards everything.
    fn write_blip(path: &Path) {
        write_wav(path, &tone(RATE as usize / 2));
    }

    struct MockFetcher {
        fixture: fn(&Path),
        calls: Mutex<usize>,
    }

    impl MockFetcher {
        fn speech() -> Arc<Self> {
            Arc::new(Self {
                fixture: write_speech,
                calls: Mutex::new(0),
            })
        }

        fn blip() -> Arc<Self> {
            Arc::new(Self {
                fixture: write_blip,
                calls: Mutex::new(0),
            })
        }

        fn call_count(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl AudioFetcher for MockFetcher {
        async fn fetch(&self, url: &str, stem: &str, output_dir: &Path) -> Result<PathBuf> {
            *self.calls.lock().unwrap() += 1;
            if url.contains("fail") {
                return Err(StemmeError::AudioDownload("simulated failure".into()));
            }
            let path = output_dir.join(format!("{}.wav", stem));
            (self.fixture)(&path);
            Ok(path)
        }
    }

    struct EchoEngine;

    #[async_trait]
    impl SpeechToText for EchoEngine {
        async fn transcribe(&self, audio_path: &Path) -> Result<TranscriptionRecord> {
            let filename = audio_path
                .file_name()
                .unwrap()
                .to_string_lossy()
                .into_owned();
            Ok(TranscriptionRecord {
                filename,
                text: "hello there".to_string(),
                confidence: 0.9,
                language: "en".to_string(),
            })
        }

        fn model_name(&self) -> &str {
            "echo"
        }
    }

    fn test_settings(root: &Path) -> Settings {
        let mut settings = Settings::default();
        settings.general.output_dir = root.join("out").to_string_lossy().into_owned();
        settings.general.temp_dir = root.join("tmp").to_string_lossy().into_owned();
        settings.general.data_dir = root.join("data").to_string_lossy().into_owned();
        // Denoising shifts segment boundaries by a few STFT frames, which
        // makes exact duration assertions impossible.
        settings.preprocess.denoise = false;
        settings.download.parallel = 2;
        settings
    }

    fn speech_pipeline(settings: Settings) -> (Pipeline, Arc<MockFetcher>) {
        let fetcher = MockFetcher::speech();
        let pipeline = Pipeline::with_components(
            settings,
            Capabilities::default(),
            fetcher.clone(),
            Some(Arc::new(EchoEngine)),
        );
        (pipeline, fetcher)
    }

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|u| u.to_string()).collect()
    }

    #[tokio::test]
    async fn full_run_produces_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = test_settings(dir.path());
        settings.sources.urls = urls(&[
            "https://example.com/watch?v=one",
            "https://example.com/watch?v=fail",
            "https://example.com/watch?v=two",
        ]);
        let (pipeline, _) = speech_pipeline(settings);

        let stats = pipeline.run(RunOptions::default()).await.unwrap();

        assert_eq!(stats.downloaded, 2);
        assert_eq!(stats.cleaned, 2);
        assert_eq!(stats.segments, 4);
        assert_eq!(stats.processed, 4);
        assert_eq!(stats.transcribed, 4);
        // Two 2.7s segments per source after resampling.
        assert!((stats.duration_seconds - 10.8).abs() < 1e-6);

        // Far below the 30 minute gate, yet the run finished and produced
        // the full dataset.
        let wavs = audio::wav_files(&pipeline.settings().wavs_dir()).unwrap();
        assert_eq!(wavs.len(), 4);

        let records = transcribe::load_metadata(&pipeline.settings().metadata_path()).unwrap();
        assert_eq!(records.len(), 4);
        let wav_names: Vec<String> = wavs
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        for record in &records {
            assert!(wav_names.contains(&record.filename));
            assert!((0.0..=1.0).contains(&record.confidence));
        }

        let snapshot = pipeline.settings().dataset_dir().join("dataset_config.json");
        assert!(snapshot.exists());
    }

    #[tokio::test]
    async fn zero_downloads_halt_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = test_settings(dir.path());
        settings.sources.urls = urls(&["https://example.com/watch?v=fail"]);
        let (pipeline, _) = speech_pipeline(settings);

        let stats = pipeline.run(RunOptions::default()).await.unwrap();

        assert_eq!(stats.downloaded, 0);
        assert_eq!(stats.cleaned, 0);
        assert_eq!(stats.segments, 0);
        assert!(!pipeline.settings().metadata_path().exists());
        assert!(!pipeline
            .settings()
            .dataset_dir()
            .join("dataset_config.json")
            .exists());
    }

    #[tokio::test]
    async fn zero_segments_halt_before_transcription() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = test_settings(dir.path());
        settings.sources.urls = urls(&["https://example.com/watch?v=short"]);
        let pipeline = Pipeline::with_components(
            settings,
            Capabilities::default(),
            MockFetcher::blip(),
            Some(Arc::new(EchoEngine)),
        );

        let stats = pipeline.run(RunOptions::default()).await.unwrap();

        assert_eq!(stats.downloaded, 1);
        assert_eq!(stats.cleaned, 1);
        assert_eq!(stats.segments, 0);
        assert_eq!(stats.processed, 0);
        assert_eq!(stats.transcribed, 0);
        assert!(!pipeline.settings().metadata_path().exists());
    }

    #[tokio::test]
    async fn skip_download_reuses_raw_files() {
        let dir = tempfile::tempdir().unwrap();
        let settings = test_settings(dir.path());
        let (pipeline, fetcher) = speech_pipeline(settings);

        let raw_dir = pipeline.settings().raw_audio_dir();
        std::fs::create_dir_all(&raw_dir).unwrap();
        write_speech(&raw_dir.join("existing.wav"));

        let stats = pipeline
            .run(RunOptions {
                skip_download: true,
                skip_transcription: false,
            })
            .await
            .unwrap();

        assert_eq!(fetcher.call_count(), 0);
        assert_eq!(stats.downloaded, 1);
        assert_eq!(stats.segments, 2);
        assert_eq!(stats.transcribed, 2);
    }

    #[tokio::test]
    async fn skip_transcription_requires_existing_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = test_settings(dir.path());
        settings.sources.urls = urls(&["https://example.com/watch?v=one"]);
        let (pipeline, _) = speech_pipeline(settings);

        let err = pipeline
            .run(RunOptions {
                skip_download: false,
                skip_transcription: true,
            })
            .await;

        // The run fails at stage 5; resampling already happened but the
        // final dataset is never assembled.
        assert!(matches!(err, Err(StemmeError::Metadata(_))));
        let processed = audio::wav_files(&pipeline.settings().processed_dir()).unwrap();
        assert_eq!(processed.len(), 2);
        assert!(!pipeline
            .settings()
            .dataset_dir()
            .join("dataset_config.json")
            .exists());
    }

    #[tokio::test]
    async fn skip_transcription_loads_existing_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = test_settings(dir.path());
        settings.sources.urls = urls(&["https://example.com/watch?v=one"]);
        let (pipeline, _) = speech_pipeline(settings.clone());

        let first = pipeline.run(RunOptions::default()).await.unwrap();
        assert_eq!(first.transcribed, 2);

        // Resume without an engine at all; the stored table is enough.
        let resumed = Pipeline::with_components(
            settings,
            Capabilities::default(),
            MockFetcher::speech(),
            None,
        );
        let stats = resumed
            .run(RunOptions {
                skip_download: true,
                skip_transcription: true,
            })
            .await
            .unwrap();

        assert_eq!(stats.downloaded, 1);
        assert_eq!(stats.transcribed, 2);
        let wavs = audio::wav_files(&resumed.settings().wavs_dir()).unwrap();
        assert_eq!(wavs.len(), 2);
    }

    #[tokio::test]
    async fn missing_engine_still_assembles_wavs() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = test_settings(dir.path());
        settings.sources.urls = urls(&["https://example.com/watch?v=one"]);
        let pipeline = Pipeline::with_components(
            settings,
            Capabilities::default(),
            MockFetcher::speech(),
            None,
        );

        let stats = pipeline.run(RunOptions::default()).await.unwrap();

        assert_eq!(stats.segments, 2);
        assert_eq!(stats.transcribed, 0);
        assert!(!pipeline.settings().metadata_path().exists());
        let wavs = audio::wav_files(&pipeline.settings().wavs_dir()).unwrap();
        assert_eq!(wavs.len(), 2);
    }

    #[tokio::test]
    async fn clean_intermediate_keeps_processed_and_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = test_settings(dir.path());
        settings.sources.urls = urls(&["https://example.com/watch?v=one"]);
        let (pipeline, _) = speech_pipeline(settings);

        pipeline.run(RunOptions::default()).await.unwrap();
        pipeline.clean_intermediate(true);

        let settings = pipeline.settings();
        assert!(settings.raw_audio_dir().exists());
        assert!(!settings.clean_audio_dir().exists());
        assert!(!settings.segments_dir().exists());
        assert!(settings.processed_dir().exists());
        assert!(settings.wavs_dir().exists());

        pipeline.clean_intermediate(false);
        assert!(!settings.raw_audio_dir().exists());
    }

    #[tokio::test]
    async fn export_config_snapshot_carries_run_parameters() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = test_settings(dir.path());
        settings.sources.urls = urls(&["https://example.com/watch?v=one"]);
        let (pipeline, _) = speech_pipeline(settings);

        let path = dir.path().join("snapshot.json");
        pipeline.export_config(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["target_sample_rate"], 22050);
        assert_eq!(value["model"], "medium");
        assert_eq!(value["min_segment_ms"], 2000);
        assert_eq!(value["max_segment_ms"], 10000);
        assert_eq!(value["silence_threshold_db"], -40.0);
        assert_eq!(value["source_urls"][0], "https://example.com/watch?v=one");
        assert!(value["generated_at"].as_str().unwrap().len() > 10);
    }

    #[test]
    fn stats_average_segment_handles_empty_runs() {
        let stats = PipelineStats::default();
        assert_eq!(stats.average_segment_seconds(), 0.0);

        let stats = PipelineStats {
            segments: 4,
            duration_seconds: 10.8,
            ..PipelineStats::default()
        };
        assert!((stats.average_segment_seconds() - 2.7).abs() < 1e-9);
        assert!((stats.duration_minutes() - 0.18).abs() < 1e-9);
    }
}
