//! Audio preprocessing: cleaning, segmentation and resampling.
//!
//! Three batch stages sit between download and transcription. Cleaning
//! collapses recordings to normalized, denoised mono WAV; segmentation
//! splits them at silence into clip-sized pieces; resampling brings every
//! piece to the dataset rate. Each batch skips work whose output already
//! exists (when configured) and isolates per-file failures so one bad
//! recording never sinks the run.

use crate::audio::denoise::SpectralDenoiser;
use crate::audio::{silence, wav};
use crate::capability::Capabilities;
use crate::config::{PreprocessSettings, SegmentationSettings, Settings};
use crate::error::{Result, StemmeError};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, error, info, instrument, warn};

/// Peak level recordings are normalized to, as a fraction of full scale.
const NORMALIZE_PEAK: f32 = 0.95;

pub struct Preprocessor {
    preprocess: PreprocessSettings,
    segmentation: SegmentationSettings,
    skip_existing: bool,
    temp_dir: PathBuf,
    ffmpeg: bool,
}

impl Preprocessor {
    pub fn new(settings: &Settings, capabilities: &Capabilities) -> Self {
        Self {
            preprocess: settings.preprocess.clone(),
            segmentation: settings.segmentation.clone(),
            skip_existing: settings.general.skip_existing,
            temp_dir: settings.temp_dir(),
            ffmpeg: capabilities.ffmpeg,
        }
    }

    fn denoise_enabled(&self) -> bool {
        self.preprocess.denoise && self.preprocess.denoise_strength > 0.0
    }

    /// Convert a compressed recording to WAV in the temp directory.
    async fn convert_to_wav(&self, input: &Path) -> Result<tempfile::NamedTempFile> {
        std::fs::create_dir_all(&self.temp_dir)?;
        let temp = tempfile::Builder::new()
            .prefix("convert_")
            .suffix(".wav")
            .tempfile_in(&self.temp_dir)?;

        let output = Command::new("ffmpeg")
            .arg("-y")
            .arg("-i")
            .arg(input)
            .arg("-vn")
            .arg("-acodec")
            .arg("pcm_s16le")
            .arg("-loglevel")
            .arg("error")
            .arg(temp.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => StemmeError::ToolNotFound("ffmpeg".to_string()),
                _ => StemmeError::AudioProcessing(format!("Failed to run ffmpeg: {}", e)),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(StemmeError::ToolFailed(format!(
                "ffmpeg: {}",
                stderr.trim()
            )));
        }
        Ok(temp)
    }

    /// Clean one recording into mono 16-bit WAV at its source rate:
    /// peak-normalize, then denoise, per the configured switches.
    pub async fn clean(&self, input: &Path, output: &Path) -> Result<()> {
        let is_wav = input
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("wav"))
            .unwrap_or(false);

        let (sample_rate, samples) = if is_wav {
            wav::read_mono(input)?
        } else {
            if !self.ffmpeg {
                return Err(StemmeError::ToolNotFound("ffmpeg".to_string()));
            }
            let temp = self.convert_to_wav(input).await?;
            wav::read_mono(temp.path())?
        };

        // Nothing enabled: the mono samples go through untouched.
        if !self.preprocess.normalize && !self.denoise_enabled() {
            wav::write_mono(output, sample_rate, &samples)?;
            return Ok(());
        }

        let mut audio = wav::to_f32(&samples);

        if self.preprocess.normalize {
            let peak = audio.iter().fold(0.0f32, |m, s| m.max(s.abs()));
            if peak > 0.0 {
                let gain = NORMALIZE_PEAK / peak;
                for s in audio.iter_mut() {
                    *s *= gain;
                }
            }
        }

        if self.denoise_enabled() {
            audio = SpectralDenoiser::new(self.preprocess.denoise_strength).process(&audio);
        }

        wav::write_mono(output, sample_rate, &wav::to_i16(&audio))?;
        Ok(())
    }

    /// Clean every supported recording under `input_dir` into `output_dir`
    /// as `{stem}.wav`. Returns the cleaned paths, existing outputs
    /// included when skipping.
    #[instrument(skip_all)]
    pub async fn clean_all(&self, input_dir: &Path, output_dir: &Path) -> Result<Vec<PathBuf>> {
        let files = crate::audio::scan_dir(input_dir, crate::audio::SUPPORTED_EXTENSIONS)?;
        if files.is_empty() {
            warn!("No audio recordings found in {}", input_dir.display());
            return Ok(Vec::new());
        }
        std::fs::create_dir_all(output_dir)?;
        info!("Cleaning {} recordings", files.len());

        let mut cleaned = Vec::new();
        for file in &files {
            let output = output_dir.join(format!("{}.wav", stem_of(file)));
            if self.skip_existing && output.exists() {
                debug!("Skipping existing {}", output.display());
                cleaned.push(output);
                continue;
            }
            match self.clean(file, &output).await {
                Ok(()) => cleaned.push(output),
                Err(e) => error!("Failed to clean {}: {}", file.display(), e),
            }
        }

        info!("Cleaned {}/{} recordings", cleaned.len(), files.len());
        Ok(cleaned)
    }

    /// Split one recording at silence into `{stem}_seg{i:04}.wav` files.
    ///
    /// Chunk indices count every silence-delimited chunk, so a skipped
    /// out-of-bounds chunk leaves a gap in the numbering rather than
    /// renumbering its successors.
    pub fn segment(&self, input: &Path, output_dir: &Path) -> Result<Vec<PathBuf>> {
        let (sample_rate, samples) = wav::read_mono(input)?;
        let stem = stem_of(input);

        let s = &self.segmentation;
        let ranges = silence::split_ranges(
            &samples,
            sample_rate,
            s.min_silence_ms,
            s.silence_threshold_db,
            s.keep_silence_ms,
        );

        std::fs::create_dir_all(output_dir)?;
        let mut paths = Vec::new();
        for (i, (start, end)) in ranges.into_iter().enumerate() {
            let duration_ms = (end - start) as u64 * 1000 / sample_rate as u64;
            if duration_ms < u64::from(s.min_segment_ms) {
                debug!("Dropping short chunk {} of {} ({} ms)", i, stem, duration_ms);
                continue;
            }
            if duration_ms > u64::from(s.max_segment_ms) {
                debug!("Dropping long chunk {} of {} ({} ms)", i, stem, duration_ms);
                continue;
            }

            let path = output_dir.join(format!("{}_seg{:04}.wav", stem, i));
            wav::write_mono(&path, sample_rate, &samples[start..end])?;
            paths.push(path);
        }
        Ok(paths)
    }

    /// Segment every WAV under `input_dir`. A recording whose segments
    /// already exist is reused as-is when skipping is enabled.
    #[instrument(skip_all)]
    pub fn segment_all(&self, input_dir: &Path, output_dir: &Path) -> Result<Vec<PathBuf>> {
        let files = crate::audio::wav_files(input_dir)?;
        if files.is_empty() {
            warn!("No clean audio found in {}", input_dir.display());
            return Ok(Vec::new());
        }
        std::fs::create_dir_all(output_dir)?;
        info!("Segmenting {} recordings", files.len());

        let mut segments = Vec::new();
        for file in &files {
            if self.skip_existing {
                let existing = existing_segments(output_dir, file)?;
                if !existing.is_empty() {
                    debug!("Reusing {} existing segments for {}", existing.len(), file.display());
                    segments.extend(existing);
                    continue;
                }
            }
            match self.segment(file, output_dir) {
                Ok(paths) => segments.extend(paths),
                Err(e) => error!("Failed to segment {}: {}", file.display(), e),
            }
        }

        info!(
            "Created {} segments from {} recordings",
            segments.len(),
            files.len()
        );
        Ok(segments)
    }

    /// Bring one WAV to the target sample rate. A mono file already at the
    /// target rate is copied byte for byte.
    pub fn resample(&self, input: &Path, output: &Path) -> Result<()> {
        let target = self.preprocess.target_sample_rate;
        let info = wav::probe(input)?;

        if info.sample_rate == target && info.channels == 1 {
            std::fs::copy(input, output)?;
            return Ok(());
        }

        let (sample_rate, samples) = wav::read_mono(input)?;
        let resampled = wav::resample(&samples, sample_rate, target);
        wav::write_mono(output, target, &resampled)?;
        Ok(())
    }

    /// Resample every WAV under `input_dir` into `output_dir`, keeping
    /// file names.
    #[instrument(skip_all)]
    pub fn resample_all(&self, input_dir: &Path, output_dir: &Path) -> Result<Vec<PathBuf>> {
        let files = crate::audio::wav_files(input_dir)?;
        if files.is_empty() {
            warn!("No segments found in {}", input_dir.display());
            return Ok(Vec::new());
        }
        std::fs::create_dir_all(output_dir)?;
        info!(
            "Resampling {} files to {} Hz",
            files.len(),
            self.preprocess.target_sample_rate
        );

        let mut resampled = Vec::new();
        for file in &files {
            let output = output_dir.join(file.file_name().unwrap_or_default());
            if self.skip_existing && output.exists() {
                debug!("Skipping existing {}", output.display());
                resampled.push(output);
                continue;
            }
            match self.resample(file, &output) {
                Ok(()) => resampled.push(output),
                Err(e) => error!("Failed to resample {}: {}", file.display(), e),
            }
        }

        info!("Resampled {}/{} files", resampled.len(), files.len());
        Ok(resampled)
    }

    /// Total duration and file count of the WAVs in a directory, from
    /// headers only. Unreadable files are skipped with a warning.
    pub fn total_duration(&self, dir: &Path) -> Result<(f64, usize)> {
        let files = crate::audio::wav_files(dir)?;
        let mut total = 0.0;
        let mut count = 0;
        for file in &files {
            match wav::probe(file) {
                Ok(info) => {
                    total += info.duration_secs();
                    count += 1;
                }
                Err(e) => warn!("Cannot probe {}: {}", file.display(), e),
            }
        }
        Ok((total, count))
    }
}

fn stem_of(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "audio".to_string())
}

/// Segments previously produced for `input`, identified by the
/// `{stem}_seg` name prefix, sorted.
fn existing_segments(output_dir: &Path, input: &Path) -> Result<Vec<PathBuf>> {
    let prefix = format!("{}_seg", stem_of(input));
    let mut found = Vec::new();
    if !output_dir.exists() {
        return Ok(found);
    }
    for entry in std::fs::read_dir(output_dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with(&prefix) && name.ends_with(".wav") {
            found.push(entry.path());
        }
    }
    found.sort();
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 8000;

    fn preprocessor(configure: impl FnOnce(&mut Settings)) -> Preprocessor {
        let mut settings = Settings::default();
        configure(&mut settings);
        Preprocessor::new(&settings, &Capabilities::default())
    }

    fn tone(ms: u32, amplitude: i16) -> Vec<i16> {
        vec![amplitude; (RATE * ms / 1000) as usize]
    }

    fn write_stereo(path: &Path, samples: &[i16]) {
        let spec = hound::WavSpec {
            channels: 2,
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

    /// 2.5 s speech, 0.8 s silence, 0.3 s speech, 0.8 s silence, 2.5 s speech.
    /// With default segmentation settings the middle burst pads out to 700 ms
    /// and falls under the 2000 ms minimum.
    fn speech_fixture() -> Vec<i16> {
        let mut samples = tone(2500, 8000);
        samples.extend(tone(800, 0));
        samples.extend(tone(300, 8000));
        samples.extend(tone(800, 0));
        samples.extend(tone(2500, 8000));
        samples
    }

    #[tokio::test]
    async fn clean_normalizes_peak() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.wav");
        let output = dir.path().join("out.wav");
        wav::write_mono(&input, RATE, &tone(500, 8000)).unwrap();

        let p = preprocessor(|s| s.preprocess.denoise = false);
        p.clean(&input, &output).await.unwrap();

        let (rate, samples) = wav::read_mono(&output).unwrap();
        assert_eq!(rate, RATE);
        let peak = samples.iter().map(|s| s.abs()).max().unwrap();
        // 0.95 of full scale, within integer rounding
        assert!((31120..=31135).contains(&peak), "peak {}", peak);
    }

    #[tokio::test]
    async fn clean_passes_audio_through_when_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.wav");
        let output = dir.path().join("out.wav");
        let samples = vec![100i16, -250, 8000, -8000, 0];
        wav::write_mono(&input, RATE, &samples).unwrap();

        let p = preprocessor(|s| {
            s.preprocess.normalize = false;
            s.preprocess.denoise = false;
        });
        p.clean(&input, &output).await.unwrap();

        let (rate, read) = wav::read_mono(&output).unwrap();
        assert_eq!(rate, RATE);
        assert_eq!(read, samples);
    }

    #[tokio::test]
    async fn clean_downmixes_stereo() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("stereo.wav");
        let output = dir.path().join("mono.wav");
        write_stereo(&input, &[100, 200, 300, 400]);

        let p = preprocessor(|s| {
            s.preprocess.normalize = false;
            s.preprocess.denoise = false;
        });
        p.clean(&input, &output).await.unwrap();

        let (_, mono) = wav::read_mono(&output).unwrap();
        assert_eq!(mono, vec![150i16, 350]);
    }

    #[tokio::test]
    async fn clean_all_skips_existing_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let input_dir = dir.path().join("raw");
        let output_dir = dir.path().join("clean");
        std::fs::create_dir_all(&input_dir).unwrap();
        wav::write_mono(&input_dir.join("a.wav"), RATE, &tone(100, 5000)).unwrap();

        let p = preprocessor(|s| s.preprocess.denoise = false);
        let first = p.clean_all(&input_dir, &output_dir).await.unwrap();
        assert_eq!(first.len(), 1);

        // Replace the output; a second run must leave it alone.
        let marker = vec![1i16, 2, 3];
        wav::write_mono(&first[0], RATE, &marker).unwrap();
        let second = p.clean_all(&input_dir, &output_dir).await.unwrap();
        assert_eq!(second, first);
        let (_, kept) = wav::read_mono(&first[0]).unwrap();
        assert_eq!(kept, marker);
    }

    #[tokio::test]
    async fn clean_all_isolates_unreadable_files() {
        let dir = tempfile::tempdir().unwrap();
        let input_dir = dir.path().join("raw");
        let output_dir = dir.path().join("clean");
        std::fs::create_dir_all(&input_dir).unwrap();
        wav::write_mono(&input_dir.join("good.wav"), RATE, &tone(100, 5000)).unwrap();
        std::fs::write(input_dir.join("bad.wav"), b"not audio at all").unwrap();

        let p = preprocessor(|s| s.preprocess.denoise = false);
        let cleaned = p.clean_all(&input_dir, &output_dir).await.unwrap();

        assert_eq!(cleaned.len(), 1);
        assert!(cleaned[0].ends_with("good.wav"));
    }

    #[tokio::test]
    async fn clean_all_needs_ffmpeg_for_compressed_input() {
        let dir = tempfile::tempdir().unwrap();
        let input_dir = dir.path().join("raw");
        let output_dir = dir.path().join("clean");
        std::fs::create_dir_all(&input_dir).unwrap();
        std::fs::write(input_dir.join("talk.mp3"), b"fake mp3").unwrap();

        // Capabilities::default() reports no ffmpeg.
        let p = preprocessor(|_| {});
        let cleaned = p.clean_all(&input_dir, &output_dir).await.unwrap();
        assert!(cleaned.is_empty());
    }

    #[test]
    fn segment_keeps_chunk_indices_across_drops() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("talk.wav");
        let output_dir = dir.path().join("segments");
        wav::write_mono(&input, RATE, &speech_fixture()).unwrap();

        let p = preprocessor(|_| {});
        let segments = p.segment(&input, &output_dir).unwrap();

        let names: Vec<_> = segments
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        // The 700 ms middle chunk is dropped but still consumes index 1.
        assert_eq!(names, vec!["talk_seg0000.wav", "talk_seg0002.wav"]);

        let info = wav::probe(&segments[0]).unwrap();
        assert_eq!(info.sample_rate, RATE);
        // 2.5 s of speech plus 200 ms of kept silence on each side
        assert!((info.duration_secs() - 2.7).abs() < 0.02);
    }

    #[test]
    fn segment_drops_overlong_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("long.wav");
        let output_dir = dir.path().join("segments");
        wav::write_mono(&input, RATE, &tone(12_000, 8000)).unwrap();

        let p = preprocessor(|_| {});
        let segments = p.segment(&input, &output_dir).unwrap();

        assert!(segments.is_empty());
        assert!(crate::audio::wav_files(&output_dir).unwrap().is_empty());
    }

    #[test]
    fn segment_all_reuses_existing_segments() {
        let dir = tempfile::tempdir().unwrap();
        let input_dir = dir.path().join("clean");
        let output_dir = dir.path().join("segments");
        std::fs::create_dir_all(&input_dir).unwrap();
        std::fs::create_dir_all(&output_dir).unwrap();
        wav::write_mono(&input_dir.join("a.wav"), RATE, &speech_fixture()).unwrap();
        // A previous run left one segment behind.
        wav::write_mono(&output_dir.join("a_seg0000.wav"), RATE, &tone(2500, 100)).unwrap();

        let p = preprocessor(|_| {});
        let segments = p.segment_all(&input_dir, &output_dir).unwrap();

        assert_eq!(segments.len(), 1);
        assert!(segments[0].ends_with("a_seg0000.wav"));
        // Re-segmentation would have produced this file.
        assert!(!output_dir.join("a_seg0002.wav").exists());
    }

    #[test]
    fn resample_at_target_rate_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.wav");
        let output = dir.path().join("out.wav");
        wav::write_mono(&input, 22050, &vec![123i16; 22050]).unwrap();

        let p = preprocessor(|_| {});
        p.resample(&input, &output).unwrap();

        assert_eq!(
            std::fs::read(&input).unwrap(),
            std::fs::read(&output).unwrap()
        );
    }

    #[test]
    fn resample_all_converts_to_target_rate() {
        let dir = tempfile::tempdir().unwrap();
        let input_dir = dir.path().join("segments");
        let output_dir = dir.path().join("processed");
        std::fs::create_dir_all(&input_dir).unwrap();
        wav::write_mono(&input_dir.join("s.wav"), 44100, &vec![500i16; 44100]).unwrap();

        let p = preprocessor(|_| {});
        let out = p.resample_all(&input_dir, &output_dir).unwrap();

        assert_eq!(out.len(), 1);
        let info = wav::probe(&out[0]).unwrap();
        assert_eq!(info.sample_rate, 22050);
        assert_eq!(info.frames, 22050);
    }

    #[test]
    fn total_duration_sums_header_times() {
        let dir = tempfile::tempdir().unwrap();
        wav::write_mono(&dir.path().join("one.wav"), RATE, &vec![0i16; 8000]).unwrap();
        wav::write_mono(&dir.path().join("two.wav"), RATE, &vec![0i16; 16000]).unwrap();

        let p = preprocessor(|_| {});
        let (secs, count) = p.total_duration(dir.path()).unwrap();

        assert_eq!(count, 2);
        assert!((secs - 3.0).abs() < 1e-9);
    }
}
