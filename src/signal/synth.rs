//! Synthetic EEG and ECG recordings for demo sessions.

use std::f64::consts::PI;

use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::signal::{linspace, SignalBuffer, ViewerError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EegAbnormality {
    Normal,
    Seizure,
    Alzheimers,
    Mci,
    Artifacts,
}

impl EegAbnormality {
    pub fn from_index(index: u8) -> Self {
        match index {
            1 => Self::Seizure,
            2 => Self::Alzheimers,
            3 => Self::Mci,
            4 => Self::Artifacts,
            _ => Self::Normal,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EcgAbnormality {
    Normal,
    Arrhythmia,
    Infarction,
    Ischemia,
    BundleBranchBlock,
}

impl EcgAbnormality {
    pub fn from_index(index: u8) -> Self {
        match index {
            1 => Self::Arrhythmia,
            2 => Self::Infarction,
            3 => Self::Ischemia,
            4 => Self::BundleBranchBlock,
            _ => Self::Normal,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SynthSpec {
    pub channels: usize,
    pub duration_secs: f64,
    pub sample_rate_hz: u32,
}

impl SynthSpec {
    pub const EEG: SynthSpec = SynthSpec {
        channels: 8,
        duration_secs: 10.0,
        sample_rate_hz: 256,
    };
    pub const ECG: SynthSpec = SynthSpec {
        channels: 12,
        duration_secs: 10.0,
        sample_rate_hz: 500,
    };

    fn len(&self) -> usize {
        (self.sample_rate_hz as f64 * self.duration_secs).max(0.0) as usize
    }

    fn time_axis(&self) -> Vec<f64> {
        linspace(0.0, self.duration_secs, self.len())
    }
}

fn sine(freq_hz: f64, t: f64) -> f64 {
    (2.0 * PI * freq_hz * t).sin()
}

/// Zero-mean Gaussian with standard deviation `sigma`.
fn gaussian(sigma: f64) -> Result<Normal<f64>, ViewerError> {
    Normal::new(0.0, sigma).map_err(|e| ViewerError::invalid("sigma", e.to_string()))
}

/// Blocks of `every` seconds starting at `first`, in sample indices.
fn onsets(first: f64, every: f64, duration: f64, rate: u32) -> impl Iterator<Item = usize> {
    let count = if duration > first {
        ((duration - first) / every).ceil() as usize
    } else {
        0
    };
    (0..count).map(move |k| ((first + k as f64 * every) * rate as f64) as usize)
}

pub fn synthesize_eeg<R: Rng + ?Sized>(
    rng: &mut R,
    params: SynthSpec,
    abnormality: EegAbnormality,
) -> Result<SignalBuffer, ViewerError> {
    let t = params.time_axis();
    let len = t.len();
    let rate = params.sample_rate_hz;
    let background = gaussian(0.1)?;
    let artifact = gaussian(2.0)?;
    let mut channels = Vec::with_capacity(params.channels);
    for _ in 0..params.channels {
        let mut signal: Vec<f64> = t
            .iter()
            .map(|&ti| {
                0.5 * sine(10.0, ti) + 0.3 * sine(20.0, ti) + 0.4 * sine(6.0, ti)
                    + background.sample(rng)
            })
            .collect();
        match abnormality {
            EegAbnormality::Normal => {}
            EegAbnormality::Seizure => {
                let (start, end) = ((len as f64 * 0.3) as usize, (len as f64 * 0.7) as usize);
                for i in start..end {
                    signal[i] += 3.0 * sine(15.0, t[i]);
                }
            }
            EegAbnormality::Alzheimers => {
                for idx in onsets(0.5, 0.8, params.duration_secs, rate) {
                    if idx + 50 >= len {
                        continue;
                    }
                    for k in 0..20 {
                        signal[idx + k] += 4.0 * (-(k as f64) / 5.0).exp();
                    }
                    for k in 0..30 {
                        signal[idx + 20 + k] += 2.0 * sine(3.0, k as f64 / rate as f64);
                    }
                }
            }
            EegAbnormality::Mci => {
                const SPINDLE: usize = 128;
                for idx in onsets(1.0, 2.0, params.duration_secs, rate) {
                    if idx + SPINDLE >= len {
                        continue;
                    }
                    for k in 0..SPINDLE {
                        let hann = 0.5 - 0.5 * (2.0 * PI * k as f64 / (SPINDLE - 1) as f64).cos();
                        signal[idx + k] += 2.0 * sine(14.0, k as f64 / rate as f64) * hann;
                    }
                }
            }
            EegAbnormality::Artifacts => {
                let hits = (len as f64 * 0.1) as usize;
                for idx in rand::seq::index::sample(rng, len, hits.min(len)) {
                    signal[idx] += artifact.sample(rng);
                }
            }
        }
        channels.push(signal);
    }
    SignalBuffer::new(channels, rate)
}

/// Gaussian bump `amp * exp(-(k - centre)^2 / width)` over `len` samples.
fn bump(amp: f64, len: usize, centre: f64, width: f64) -> impl Iterator<Item = f64> {
    (0..len).map(move |k| amp * (-((k as f64 - centre).powi(2)) / width).exp())
}

fn add_at(signal: &mut [f64], at: usize, values: impl Iterator<Item = f64>) {
    for (slot, v) in signal.iter_mut().skip(at).zip(values) {
        *slot += v;
    }
}

pub fn synthesize_ecg<R: Rng + ?Sized>(
    rng: &mut R,
    params: SynthSpec,
    abnormality: EcgAbnormality,
) -> Result<SignalBuffer, ViewerError> {
    const HEART_RATE_BPM: f64 = 75.0;
    let beat_interval = 60.0 / HEART_RATE_BPM;
    let len = params.len();
    let rate = params.sample_rate_hz as f64;
    let beats: Vec<f64> = {
        let count = (params.duration_secs / beat_interval).ceil().max(0.0) as usize;
        (0..count).map(|k| k as f64 * beat_interval).collect()
    };

    let noise = gaussian(0.05)?;
    let mut channels = Vec::with_capacity(params.channels);
    for _ in 0..params.channels {
        let mut ecg = vec![0.0; len];
        for &beat in &beats {
            let idx = (beat * rate) as usize;
            if idx + 40 < len {
                add_at(&mut ecg, idx, bump(0.2, 40, 20.0, 50.0));
            }
            if idx + 80 < len {
                add_at(&mut ecg, idx + 40, bump(-0.1, 20, 10.0, 20.0));
                add_at(&mut ecg, idx + 60, bump(1.5, 30, 15.0, 30.0));
                add_at(&mut ecg, idx + 90, bump(-0.3, 20, 10.0, 20.0));
            }
            if idx + 180 < len {
                add_at(&mut ecg, idx + 120, bump(0.3, 60, 30.0, 100.0));
            }
        }
        let gain = 0.8 + 0.4 * rng.gen::<f64>();
        ecg.iter_mut().for_each(|v| *v *= gain);

        match abnormality {
            EcgAbnormality::Normal => {}
            EcgAbnormality::Arrhythmia => {
                for (k, &beat) in beats.iter().enumerate() {
                    let idx = ((beat - 0.2) * rate) as isize;
                    if k % 3 == 0 && idx > 0 && idx as usize + 180 < len {
                        add_at(&mut ecg, idx as usize + 60, bump(1.2, 30, 15.0, 30.0));
                    }
                }
            }
            EcgAbnormality::Infarction => {
                let (start, end) = ((len as f64 * 0.2) as usize, (len as f64 * 0.8) as usize);
                ecg[start..end].iter_mut().for_each(|v| *v += 0.3);
            }
            EcgAbnormality::Ischemia => {
                for &beat in &beats {
                    let idx = (beat * rate) as usize;
                    if idx + 180 < len {
                        ecg[idx + 120..idx + 180].iter_mut().for_each(|v| *v *= -0.8);
                    }
                }
            }
            EcgAbnormality::BundleBranchBlock => {
                for &beat in &beats {
                    let idx = (beat * rate) as usize;
                    if idx + 150 < len {
                        for (slot, v) in ecg[idx + 40..idx + 120]
                            .iter_mut()
                            .zip(bump(1.0, 80, 40.0, 100.0))
                        {
                            *slot = v;
                        }
                    }
                }
            }
        }
        ecg.iter_mut().for_each(|v| *v += noise.sample(rng));
        channels.push(ecg);
    }
    SignalBuffer::new(channels, params.sample_rate_hz)
}
