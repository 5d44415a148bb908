//! Spectral noise reduction.
//!
//! Classic spectral gating over a short-time Fourier transform: estimate a
//! per-bin noise threshold from the whole recording, then attenuate
//! time-frequency bins that stay below it. `strength` sets how hard gated
//! bins are attenuated; 1.0 silences them, 0.0 leaves the signal untouched.
//!
//! All scratch buffers and FFT plans are allocated once in `new`.

use rustfft::{num_complex::Complex32, Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

/// Analysis frame length in samples.
const FRAME_SIZE: usize = 1024;
/// Hop between frames; half a frame gives perfect overlap-add with a
/// periodic Hann window.
const HOP: usize = FRAME_SIZE / 2;
/// Gate threshold sits this many standard deviations above the per-bin mean.
const NOISE_STD_FACTOR: f32 = 1.5;
/// Extra margin in dB so a zero-variance bin still gates.
const THRESHOLD_MARGIN_DB: f32 = 1.0;
/// Floor added before the dB conversion; digital silence maps to -120 dB.
const DB_EPS: f32 = 1e-6;

pub struct SpectralDenoiser {
    strength: f32,
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
}

impl SpectralDenoiser {
    pub fn new(strength: f32) -> Self {
        let mut planner = FftPlanner::<f32>::new();
        let forward = planner.plan_fft_forward(FRAME_SIZE);
        let inverse = planner.plan_fft_inverse(FRAME_SIZE);
        // Periodic Hann: adjacent hops sum to exactly one.
        let window = (0..FRAME_SIZE)
            .map(|n| 0.5 - 0.5 * ((2.0 * PI * n as f32) / FRAME_SIZE as f32).cos())
            .collect();
        Self {
            strength: strength.clamp(0.0, 1.0),
            forward,
            inverse,
            window,
        }
    }

    /// Denoise a mono signal of normalized f32 samples. The output has the
    /// same length as the input.
    pub fn process(&self, samples: &[f32]) -> Vec<f32> {
        if samples.len() < FRAME_SIZE || self.strength == 0.0 {
            return samples.to_vec();
        }

        // Pad half a frame in front and a full frame behind so every input
        // sample sits under a complete window sum.
        let mut padded = vec![0.0f32; HOP];
        padded.extend_from_slice(samples);
        padded.extend(std::iter::repeat(0.0).take(FRAME_SIZE));
        let frame_count = (padded.len() - FRAME_SIZE) / HOP + 1;

        // Forward pass: windowed FFT per frame.
        let mut spectra: Vec<Vec<Complex32>> = Vec::with_capacity(frame_count);
        let mut buf = vec![Complex32::ZERO; FRAME_SIZE];
        for f in 0..frame_count {
            let offset = f * HOP;
            for (dst, (&x, &w)) in buf
                .iter_mut()
                .zip(padded[offset..offset + FRAME_SIZE].iter().zip(&self.window))
            {
                dst.re = x * w;
                dst.im = 0.0;
            }
            self.forward.process(&mut buf);
            spectra.push(buf.clone());
        }

        // Per-bin dB statistics over the whole recording.
        let bins = FRAME_SIZE / 2 + 1;
        let mut mean = vec![0.0f32; bins];
        let mut mean_sq = vec![0.0f32; bins];
        for spectrum in &spectra {
            for (bin, (m, s)) in mean.iter_mut().zip(mean_sq.iter_mut()).enumerate() {
                let db = magnitude_db(spectrum[bin]);
                *m += db;
                *s += db * db;
            }
        }
        let n = spectra.len() as f32;
        let threshold: Vec<f32> = mean
            .iter()
            .zip(mean_sq.iter())
            .map(|(&m, &sq)| {
                let mu = m / n;
                let var = (sq / n - mu * mu).max(0.0);
                mu + NOISE_STD_FACTOR * var.sqrt() + THRESHOLD_MARGIN_DB
            })
            .collect();

        // Gate, smooth the gain curve across neighboring bins, resynthesize.
        let mut output = vec![0.0f32; padded.len()];
        let mut gains = vec![1.0f32; bins];
        for (f, spectrum) in spectra.into_iter().enumerate() {
            for (bin, gain) in gains.iter_mut().enumerate() {
                let db = magnitude_db(spectrum[bin]);
                *gain = if db < threshold[bin] {
                    1.0 - self.strength
                } else {
                    1.0
                };
            }
            let smoothed = smooth_gains(&gains);

            buf.copy_from_slice(&spectrum);
            for (bin, value) in buf.iter_mut().enumerate() {
                // Mirror the gain onto the conjugate half of the spectrum.
                let g = if bin < bins {
                    smoothed[bin]
                } else {
                    smoothed[FRAME_SIZE - bin]
                };
                *value *= g;
            }
            self.inverse.process(&mut buf);

            let offset = f * HOP;
            for (i, value) in buf.iter().enumerate() {
                // rustfft leaves the inverse unscaled.
                output[offset + i] += value.re / FRAME_SIZE as f32;
            }
        }

        output[HOP..HOP + samples.len()].to_vec()
    }
}

fn magnitude_db(c: Complex32) -> f32 {
    20.0 * ((c.re * c.re + c.im * c.im).sqrt() + DB_EPS).log10()
}

/// Three-bin moving average keeps the gate from flickering bin to bin.
fn smooth_gains(gains: &[f32]) -> Vec<f32> {
    let n = gains.len();
    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(1);
            let hi = (i + 1).min(n - 1);
            let span = (hi - lo + 1) as f32;
            gains[lo..=hi].iter().sum::<f32>() / span
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: usize = 8000;

    fn rms(samples: &[f32]) -> f32 {
        if samples.is_empty() {
            return 0.0;
        }
        (samples.iter().map(|&s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
    }

    /// Deterministic pseudo-random noise in [-amplitude, amplitude].
    fn noise(len: usize, amplitude: f32) -> Vec<f32> {
        let mut state = 0x2545_f491u32;
        (0..len)
            .map(|_| {
                state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                let unit = (state >> 8) as f32 / (1u32 << 24) as f32;
                (unit * 2.0 - 1.0) * amplitude
            })
            .collect()
    }

    fn sine(len: usize, freq: f32, amplitude: f32) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * PI * freq * i as f32 / RATE as f32).sin() * amplitude)
            .collect()
    }

    #[test]
    fn zero_strength_is_transparent() {
        let signal = sine(RATE, 440.0, 0.5);
        let out = SpectralDenoiser::new(0.0).process(&signal);
        assert_eq!(out, signal);
    }

    #[test]
    fn output_length_matches_input() {
        let signal = noise(RATE + 123, 0.1);
        let out = SpectralDenoiser::new(0.8).process(&signal);
        assert_eq!(out.len(), signal.len());
    }

    #[test]
    fn short_input_passes_through() {
        let signal = noise(FRAME_SIZE - 1, 0.1);
        let out = SpectralDenoiser::new(1.0).process(&signal);
        assert_eq!(out, signal);
    }

    #[test]
    fn steady_noise_is_attenuated() {
        let signal = noise(2 * RATE, 0.05);
        let out = SpectralDenoiser::new(1.0).process(&signal);
        assert!(
            rms(&out) < 0.5 * rms(&signal),
            "noise rms {} vs {}",
            rms(&out),
            rms(&signal)
        );
    }

    #[test]
    fn sparse_bursts_survive_the_gate() {
        // 300 ms bursts separated by 1200 ms of silence.
        let burst = sine(RATE * 3 / 10, 440.0, 0.3);
        let gap = vec![0.0f32; RATE * 12 / 10];
        let mut signal = Vec::new();
        for _ in 0..3 {
            signal.extend_from_slice(&burst);
            signal.extend_from_slice(&gap);
        }

        let out = SpectralDenoiser::new(1.0).process(&signal);

        let burst_before = rms(&signal[..burst.len()]);
        let burst_after = rms(&out[..burst.len()]);
        assert!(
            burst_after > 0.7 * burst_before,
            "burst rms {} vs {}",
            burst_after,
            burst_before
        );

        // Interior of the first gap, away from window spill at the edges.
        let gap_start = burst.len() + RATE / 10;
        let gap_end = burst.len() + gap.len() - RATE / 10;
        assert!(rms(&out[gap_start..gap_end]) < 0.01);
    }

    #[test]
    fn half_strength_attenuates_less_than_full() {
        let signal = noise(2 * RATE, 0.05);
        let full = SpectralDenoiser::new(1.0).process(&signal);
        let half = SpectralDenoiser::new(0.5).process(&signal);
        assert!(rms(&half) > rms(&full));
    }
}
