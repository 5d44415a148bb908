//! Silence detection and silence-based splitting.
//!
//! Recordings are analyzed in fixed 10 ms frames. A frame whose loudness
//! falls below the configured dBFS threshold counts as silent; a run of
//! silent frames at least `min_silence_ms` long is a split point. Shorter
//! silences stay inside the surrounding speech.

/// Analysis frame length in milliseconds.
const FRAME_MS: u32 = 10;

/// Calculates the Root Mean Square (RMS) of audio samples.
///
/// Returns a normalized value in [0, 1], where 0.0 is silence and 1.0 is
/// maximum amplitude.
pub fn calculate_rms(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f64 = samples
        .iter()
        .map(|&sample| {
            let normalized = sample as f64 / i16::MAX as f64;
            normalized * normalized
        })
        .sum();

    let mean_square = sum_squares / samples.len() as f64;
    mean_square.sqrt() as f32
}

/// Loudness of a block of samples in dBFS. Digital silence is negative
/// infinity, which compares below every finite threshold.
pub fn dbfs(samples: &[i16]) -> f32 {
    let rms = calculate_rms(samples);
    if rms <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * rms.log10()
    }
}

/// Find speech ranges as `(start, end)` sample indices, end exclusive.
///
/// Only silence runs of at least `min_silence_ms` separate ranges; leading
/// and trailing qualifying silence is excluded from the result.
pub fn detect_speech_ranges(
    samples: &[i16],
    sample_rate: u32,
    min_silence_ms: u32,
    threshold_db: f32,
) -> Vec<(usize, usize)> {
    if samples.is_empty() {
        return Vec::new();
    }

    let frame_len = ((sample_rate * FRAME_MS / 1000) as usize).max(1);
    let min_silence_frames = (min_silence_ms / FRAME_MS).max(1) as usize;

    // true = silent frame
    let flags: Vec<bool> = samples
        .chunks(frame_len)
        .map(|frame| dbfs(frame) < threshold_db)
        .collect();

    let mut frame_ranges: Vec<(usize, usize)> = Vec::new();
    let mut speech_start: Option<usize> = None;
    let mut silence_run = 0usize;

    for (i, &silent) in flags.iter().enumerate() {
        if silent {
            silence_run += 1;
            if silence_run == min_silence_frames {
                if let Some(start) = speech_start.take() {
                    frame_ranges.push((start, i + 1 - silence_run));
                }
            }
        } else {
            if speech_start.is_none() {
                speech_start = Some(i);
            }
            silence_run = 0;
        }
    }
    if let Some(start) = speech_start {
        frame_ranges.push((start, flags.len()));
    }

    frame_ranges
        .into_iter()
        .map(|(start, end)| {
            (
                start * frame_len,
                (end * frame_len).min(samples.len()),
            )
        })
        .collect()
}

/// Split points for silence-based segmentation: speech ranges padded with
/// `keep_silence_ms` of context on each side, clamped to the signal bounds.
/// Adjacent ranges may overlap inside a shared silence gap.
pub fn split_ranges(
    samples: &[i16],
    sample_rate: u32,
    min_silence_ms: u32,
    threshold_db: f32,
    keep_silence_ms: u32,
) -> Vec<(usize, usize)> {
    let pad = (sample_rate as usize * keep_silence_ms as usize) / 1000;

    detect_speech_ranges(samples, sample_rate, min_silence_ms, threshold_db)
        .into_iter()
        .map(|(start, end)| (start.saturating_sub(pad), (end + pad).min(samples.len())))
        .collect()
}
