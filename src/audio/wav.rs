//! WAV reading, writing and probing helpers.
//!
//! Every pipeline stage after download deals in 16-bit PCM WAV. Reads always
//! collapse to mono; multi-channel recordings are averaged across channels.

use crate::error::{Result, StemmeError};
use std::path::Path;

/// Format attributes read from a WAV header without decoding samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WavProbe {
    pub sample_rate: u32,
    pub channels: u16,
    /// Number of frames (samples per channel) in the data chunk.
    pub frames: u32,
}

impl WavProbe {
    pub fn duration_secs(&self) -> f64 {
        self.frames as f64 / self.sample_rate as f64
    }
}

/// Read format attributes from a WAV header. Does not decode sample data.
pub fn probe(path: &Path) -> Result<WavProbe> {
    let reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    Ok(WavProbe {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        frames: reader.duration(),
    })
}

/// Read a WAV file and collapse it to mono i16 samples.
///
/// Returns the source sample rate together with the samples.
pub fn read_mono(path: &Path) -> Result<(u32, Vec<i16>)> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();

    let raw: Vec<i16> = match spec.sample_format {
        hound::SampleFormat::Int => reader
            .samples::<i16>()
            .collect::<std::result::Result<Vec<_>, _>>()?,
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.map(|v| (v.clamp(-1.0, 1.0) * 32767.0) as i16))
            .collect::<std::result::Result<Vec<_>, _>>()?,
    };

    let channels = spec.channels as usize;
    if channels == 0 {
        return Err(StemmeError::AudioProcessing(format!(
            "WAV file has zero channels: {}",
            path.display()
        )));
    }

    let mono = if channels == 1 {
        raw
    } else {
        raw.chunks_exact(channels)
            .map(|frame| {
                let sum: i32 = frame.iter().map(|&s| s as i32).sum();
                (sum / channels as i32) as i16
            })
            .collect()
    };

    Ok((spec.sample_rate, mono))
}

/// Write mono i16 samples as a 16-bit PCM WAV file.
pub fn write_mono(path: &Path, sample_rate: u32, samples: &[i16]) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &s in samples {
        writer.write_sample(s)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Convert i16 samples to normalized f32 in [-1, 1].
pub fn to_f32(samples: &[i16]) -> Vec<f32> {
    samples.iter().map(|&s| s as f32 / 32768.0).collect()
}

/// Convert normalized f32 samples back to i16, clamping out-of-range values.
pub fn to_i16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|&s| (s.clamp(-1.0, 1.0) * 32767.0) as i16)
        .collect()
}

/// Simple linear interpolation resampling.
pub fn resample(samples: &[i16], from_rate: u32, to_rate: u32) -> Vec<i16> {
    if from_rate == to_rate {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (samples.len() as f64 / ratio).ceil() as usize;

    (0..output_len)
        .map(|i| {
            let source_pos = i as f64 * ratio;
            let source_idx = source_pos.floor() as usize;
            let fraction = source_pos - source_idx as f64;

            if source_idx + 1 >= samples.len() {
                samples[source_idx]
            } else {
                let left = samples[source_idx] as f64;
                let right = samples[source_idx + 1] as f64;
                (left + (right - left) * fraction) as i16
            }
        })
        .collect()
}
