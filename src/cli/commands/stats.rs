//! Stats command implementation.

use crate::audio::{self, wav};
use crate::cli::{format_duration, Output};
use crate::config::Settings;
use crate::transcribe;
use anyhow::Result;

/// Report on the prepared dataset and the intermediate stage directories.
pub fn run_stats(settings: &Settings) -> Result<()> {
    let wav_paths = audio::wav_files(&settings.wavs_dir())?;

    if wav_paths.is_empty() {
        Output::warning("No finished dataset yet; run 'stemme run' to build one");
    } else {
        let mut total = 0.0;
        for path in &wav_paths {
            total += wav::probe(path)?.duration_secs();
        }

        Output::header("Dataset");
        Output::kv("Location", &settings.dataset_dir().display().to_string());
        Output::kv("Segments", &wav_paths.len().to_string());
        Output::kv("Total duration", &format_duration(total));
        Output::kv(
            "Avg segment",
            &format!("{:.1}s", total / wav_paths.len() as f64),
        );

        let metadata_path = settings.metadata_path();
        if metadata_path.exists() {
            let records = transcribe::load_metadata(&metadata_path)?;
            Output::kv("Metadata rows", &records.len().to_string());
            let low = records
                .iter()
                .filter(|r| r.confidence < settings.quality.min_confidence)
                .count();
            if low > 0 {
                Output::warning(&format!(
                    "{} rows below confidence {:.2}",
                    low, settings.quality.min_confidence
                ));
            }
        } else {
            Output::kv("Metadata rows", "none");
        }

        let minutes = total / 60.0;
        let min_minutes = settings.quality.min_total_duration_minutes;
        if minutes >= min_minutes as f64 {
            Output::success(&format!(
                "Duration {:.1} min meets the {} min target",
                minutes, min_minutes
            ));
        } else {
            Output::warning(&format!(
                "Only {:.1} min of audio; aim for at least {} min",
                minutes, min_minutes
            ));
        }
        let min_segments = settings.quality.min_segments;
        if wav_paths.len() >= min_segments {
            Output::success(&format!(
                "{} segments meets the {} segment target",
                wav_paths.len(),
                min_segments
            ));
        } else {
            Output::warning(&format!(
                "Only {} segments; aim for at least {}",
                wav_paths.len(),
                min_segments
            ));
        }
    }

    Output::header("Stage directories");
    let stages = [
        ("raw", settings.raw_audio_dir()),
        ("clean", settings.clean_audio_dir()),
        ("segments", settings.segments_dir()),
        ("processed", settings.processed_dir()),
    ];
    for (label, dir) in stages {
        let count = audio::scan_dir(&dir, audio::SUPPORTED_EXTENSIONS)?.len();
        Output::kv(label, &format!("{} files", count));
    }

    Ok(())
}
