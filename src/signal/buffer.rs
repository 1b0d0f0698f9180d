use serde::Serialize;

use crate::signal::ViewerError;

/// Immutable multichannel recording: channels x samples plus a sample rate.
///
/// Every channel has the same length. Transforms and decimation never mutate a
/// buffer; they build a new one or a [`Window`] over it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SignalBuffer {
    samples: Vec<Vec<f64>>, // channels x samples
    sample_rate_hz: u32,
    lead_names: Option<Vec<String>>,
}

impl SignalBuffer {
    pub fn new(samples: Vec<Vec<f64>>, sample_rate_hz: u32) -> Result<Self, ViewerError> {
        if sample_rate_hz == 0 {
            return Err(ViewerError::InvalidSampleRate);
        }
        let expected = samples.first().map(|c| c.len()).unwrap_or(0);
        if let Some((channel, actual)) = samples
            .iter()
            .map(|c| c.len())
            .enumerate()
            .find(|(_, len)| *len != expected)
        {
            return Err(ViewerError::RaggedChannels {
                channel,
                expected,
                actual,
            });
        }
        Ok(Self {
            samples,
            sample_rate_hz,
            lead_names: None,
        })
    }

    pub fn with_lead_names(mut self, names: Vec<String>) -> Result<Self, ViewerError> {
        if names.len() != self.num_channels() {
            return Err(ViewerError::LeadNameMismatch {
                expected: self.num_channels(),
                actual: names.len(),
            });
        }
        self.lead_names = Some(names);
        Ok(self)
    }

    /// Same channels and lead names, different samples and rate.
    pub(crate) fn derive(&self, samples: Vec<Vec<f64>>, sample_rate_hz: u32) -> Self {
        Self {
            samples,
            sample_rate_hz,
            lead_names: self.lead_names.clone(),
        }
    }

    pub fn sample_rate_hz(&self) -> u32 {
        self.sample_rate_hz
    }

    pub fn num_channels(&self) -> usize {
        self.samples.len()
    }

    pub fn total_samples(&self) -> usize {
        self.samples.first().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.total_samples() == 0
    }

    pub fn duration_seconds(&self) -> f64 {
        self.total_samples() as f64 / self.sample_rate_hz as f64
    }

    pub fn samples(&self) -> &[Vec<f64>] {
        &self.samples
    }

    pub fn channel(&self, index: usize) -> Option<&[f64]> {
        self.samples.get(index).map(|c| c.as_slice())
    }

    pub fn lead_names(&self) -> Option<&[String]> {
        self.lead_names.as_deref()
    }

    /// Circular window over every channel.
    ///
    /// `start_idx` is reduced modulo the buffer length, and the window may wrap
    /// past the end any number of times. An empty buffer or a non-positive
    /// `window_samples` gives a zero-length window.
    pub fn slice(&self, start_idx: i64, window_samples: i64) -> Window {
        let indices = wrapped_indices(self.total_samples(), start_idx, window_samples);
        let samples = self
            .samples
            .iter()
            .map(|channel| indices.iter().map(|&i| channel[i]).collect())
            .collect();
        Window {
            start_idx: indices.first().copied().unwrap_or(0),
            samples,
        }
    }

    /// Circular window over a single channel; empty when `channel` is out of range.
    pub fn slice_channel(&self, channel: usize, start_idx: i64, window_samples: i64) -> Vec<f64> {
        let Some(data) = self.channel(channel) else {
            return Vec::new();
        };
        wrapped_indices(data.len(), start_idx, window_samples)
            .into_iter()
            .map(|i| data[i])
            .collect()
    }

    /// Start index for a playback position given in seconds.
    pub fn start_index(&self, position_secs: f64) -> i64 {
        let total = self.total_samples() as i64;
        if total == 0 {
            return 0;
        }
        let raw = (position_secs * self.sample_rate_hz as f64).floor();
        if !raw.is_finite() {
            return 0;
        }
        (raw as i64).rem_euclid(total)
    }

    /// Number of samples covered by `seconds`, floored and clamped at zero.
    pub fn samples_for(&self, seconds: f64) -> i64 {
        let raw = (seconds * self.sample_rate_hz as f64).floor();
        if raw.is_finite() && raw > 0.0 {
            raw as i64
        } else {
            0
        }
    }
}

fn wrapped_indices(total: usize, start_idx: i64, window_samples: i64) -> Vec<usize> {
    if total == 0 || window_samples <= 0 {
        return Vec::new();
    }
    let start = start_idx.rem_euclid(total as i64) as usize;
    (0..window_samples as usize)
        .map(|k| (start + k) % total)
        .collect()
}

/// Transient extraction from a [`SignalBuffer`]; one row per channel.
#[derive(Clone, Debug, PartialEq)]
pub struct Window {
    pub start_idx: usize,
    pub samples: Vec<Vec<f64>>,
}

impl Window {
    pub fn len(&self) -> usize {
        self.samples.first().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn channel(&self, index: usize) -> Option<&[f64]> {
        self.samples.get(index).map(|c| c.as_slice())
    }
}
