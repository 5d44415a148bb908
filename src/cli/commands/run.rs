//! Run command implementation: the full pipeline in one shot.

use crate::audio;
use crate::capability::Capabilities;
use crate::cli::{format_duration, Output};
use crate::config::{Settings, SourceSettings};
use crate::pipeline::{Pipeline, RunOptions};
use crate::transcribe;
use anyhow::Result;

/// Run the full pipeline and print a dataset report.
#[allow(clippy::too_many_arguments)]
pub async fn run_pipeline(
    urls: Vec<String>,
    urls_file: Option<String>,
    skip_download: bool,
    skip_transcription: bool,
    clean_intermediate: bool,
    keep_raw: bool,
    mut settings: Settings,
    capabilities: Capabilities,
) -> Result<()> {
    // Sources given on the command line replace the configured list.
    if !urls.is_empty() || urls_file.is_some() {
        settings.sources = SourceSettings { urls, urls_file };
    }

    if !skip_download {
        if let Err(e) = capabilities.require_download() {
            Output::error(&format!("{}", e));
            Output::info("Run 'stemme doctor' for detailed diagnostics.");
            return Err(e.into());
        }
        if settings.resolve_sources()?.is_empty() {
            Output::error("No source URLs given");
            Output::info("Pass URLs on the command line or set [sources] urls in the config.");
            anyhow::bail!("no source URLs");
        }
    }

    if !skip_transcription {
        if let Err(e) = capabilities.require_transcription() {
            Output::warning(&format!("{}; segments will not be transcribed", e));
        }
    }

    let pipeline = Pipeline::new(settings, capabilities)?;
    let stats = pipeline
        .run(RunOptions {
            skip_download,
            skip_transcription,
        })
        .await?;

    if stats.downloaded == 0 {
        Output::error("No source audio was available; nothing to process");
        anyhow::bail!("no source audio");
    }
    if stats.segments == 0 {
        Output::error("Splitting produced no usable segments; check the silence threshold");
        anyhow::bail!("no segments produced");
    }

    let settings = pipeline.settings();

    Output::header("Dataset summary");
    Output::kv("Downloaded", &stats.downloaded.to_string());
    Output::kv("Cleaned", &stats.cleaned.to_string());
    Output::kv("Segments", &stats.segments.to_string());
    Output::kv("Processed", &stats.processed.to_string());
    Output::kv("Transcribed", &stats.transcribed.to_string());
    Output::kv("Total duration", &format_duration(stats.duration_seconds));
    Output::kv(
        "Avg segment",
        &format!("{:.1}s", stats.average_segment_seconds()),
    );

    let minutes = stats.duration_minutes();
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
    if stats.segments >= min_segments {
        Output::success(&format!(
            "{} segments meets the {} segment target",
            stats.segments, min_segments
        ));
    } else {
        Output::warning(&format!(
            "Only {} segments; aim for at least {}",
            stats.segments, min_segments
        ));
    }

    let dataset_dir = settings.dataset_dir();
    let wav_count = audio::wav_files(&settings.wavs_dir())
        .map(|files| files.len())
        .unwrap_or(0);
    let metadata_path = settings.metadata_path();
    let row_count = if metadata_path.exists() {
        transcribe::load_metadata(&metadata_path)
            .map(|rows| rows.len())
            .unwrap_or(0)
    } else {
        0
    };

    Output::header("Dataset layout");
    println!("  {}/", dataset_dir.display());
    println!("  ├── wavs/         ({} files)", wav_count);
    println!("  └── metadata.csv  ({} entries)", row_count);

    Output::header("Next steps");
    Output::list_item("Review metadata.csv and fix mistranscriptions");
    Output::list_item("Listen to a few wavs/ segments to spot-check quality");
    Output::list_item("Delete bad segments along with their metadata rows");
    Output::list_item(&format!("Train on {}", dataset_dir.display()));

    if clean_intermediate {
        pipeline.clean_intermediate(keep_raw);
        if keep_raw {
            Output::info("Removed intermediate directories (kept raw downloads)");
        } else {
            Output::info("Removed intermediate directories");
        }
    }

    Ok(())
}
