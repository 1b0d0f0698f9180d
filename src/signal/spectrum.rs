use std::f64::consts::PI;

use rustfft::{num_complex::Complex64, FftPlanner};
use serde::Serialize;

/// Log-magnitude short-time spectrum of one channel.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Spectrogram {
    /// dB values, frequency bins x frames.
    pub z: Vec<Vec<f64>>,
    /// Frame centre times in seconds.
    pub x: Vec<f64>,
    /// Bin frequencies in Hz.
    pub y: Vec<f64>,
}

impl Spectrogram {
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// Helper that computes centred, Hann-windowed STFTs.
pub struct SpectrogramBuilder {
    fft_size: usize,
    hop: usize,
    floor_db: f64,
}

impl SpectrogramBuilder {
    pub fn new(fft_size: usize, hop: usize, floor_db: f64) -> Self {
        Self {
            fft_size,
            hop,
            floor_db,
        }
    }

    pub fn compute(&self, samples: &[f64], sample_rate_hz: u32) -> Spectrogram {
        if samples.is_empty() || self.fft_size == 0 || self.hop == 0 || sample_rate_hz == 0 {
            return Spectrogram::default();
        }
        let padded = reflect_pad(samples, self.fft_size / 2);
        let frames = 1 + padded.len().saturating_sub(self.fft_size) / self.hop;
        let bins = self.fft_size / 2 + 1;
        let window = hann(self.fft_size);

        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(self.fft_size);

        let mut magnitudes = vec![vec![0.0; frames]; bins];
        let mut buffer = vec![Complex64::new(0.0, 0.0); self.fft_size];
        for frame in 0..frames {
            let start = frame * self.hop;
            for (k, slot) in buffer.iter_mut().enumerate() {
                let sample = padded.get(start + k).copied().unwrap_or(0.0);
                *slot = Complex64::new(sample * window[k], 0.0);
            }
            fft.process(&mut buffer);
            for (bin, row) in magnitudes.iter_mut().enumerate() {
                row[frame] = buffer[bin].norm();
            }
        }

        let reference = magnitudes
            .iter()
            .flat_map(|row| row.iter().copied())
            .fold(0.0f64, f64::max)
            .max(1e-10);
        let z = magnitudes
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|m| (20.0 * (m.max(1e-10) / reference).log10()).max(self.floor_db))
                    .collect()
            })
            .collect();

        let rate = sample_rate_hz as f64;
        let x = (0..frames)
            .map(|f| (f * self.hop) as f64 / rate)
            .collect();
        let y = (0..bins)
            .map(|b| b as f64 * rate / self.fft_size as f64)
            .collect();
        Spectrogram { z, x, y }
    }
}

fn hann(len: usize) -> Vec<f64> {
    // Periodic window, as used for spectral analysis.
    (0..len)
        .map(|n| 0.5 - 0.5 * (2.0 * PI * n as f64 / len as f64).cos())
        .collect()
}

fn reflect_pad(samples: &[f64], pad: usize) -> Vec<f64> {
    let n = samples.len();
    let mirror = |i: isize| -> f64 {
        if n == 1 {
            return samples[0];
        }
        let period = 2 * (n as isize - 1);
        let mut k = i.rem_euclid(period);
        if k >= n as isize {
            k = period - k;
        }
        samples[k as usize]
    };
    (-(pad as isize)..(n + pad) as isize).map(mirror).collect()
}
