// src/session/config.rs
use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::signal::ViewerError;
use crate::view::{Palette, DEFAULT_BINS};

pub static EEG_LEAD_NAMES: Lazy<Vec<String>> =
    Lazy::new(|| (1..=19).map(|i| format!("Ch {i}")).collect());

pub static ECG_LEAD_NAMES: Lazy<Vec<String>> = Lazy::new(|| {
    [
        "I", "II", "III", "aVR", "aVL", "aVF", "V1", "V2", "V3", "V4", "V5", "V6",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
});

pub const DEFAULT_MAX_WINDOW_SAMPLES: usize = 2_000_000;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ViewerConfig {
    pub palette: Palette,
    pub eeg_lead_names: Vec<String>,
    pub ecg_lead_names: Vec<String>,
    pub recurrence_bins: usize,
    /// Longest window, in samples, a single graph request may extract.
    pub max_window_samples: usize,
    pub audio: AudioConfig,
    pub spectrogram: SpectrogramConfig,
    pub models: ModelShapes,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    pub preview_points: usize,
    pub preview_window_secs: f64,
    pub chunk_view_secs: f64,
    pub chunk_steps: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SpectrogramConfig {
    pub fft_size: usize,
    pub hop: usize,
    pub floor_db: f64,
}

/// Fixed `(channels, samples)` input shape each model expects.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ModelShapes {
    pub eeg: (usize, usize),
    pub ecg: (usize, usize),
    pub drone: (usize, usize),
    pub doppler: (usize, usize),
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            palette: Palette::default(),
            eeg_lead_names: EEG_LEAD_NAMES.clone(),
            ecg_lead_names: ECG_LEAD_NAMES.clone(),
            recurrence_bins: DEFAULT_BINS,
            max_window_samples: DEFAULT_MAX_WINDOW_SAMPLES,
            audio: AudioConfig::default(),
            spectrogram: SpectrogramConfig::default(),
            models: ModelShapes::default(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            preview_points: 4000,
            preview_window_secs: 3.0,
            chunk_view_secs: 2.0,
            chunk_steps: 20,
        }
    }
}

impl Default for SpectrogramConfig {
    fn default() -> Self {
        Self {
            fft_size: 2048,
            hop: 512,
            floor_db: -80.0,
        }
    }
}

impl Default for ModelShapes {
    fn default() -> Self {
        Self {
            eeg: (19, 1024),
            ecg: (12, 5000),
            drone: (1, 16000),
            doppler: (128, 128),
        }
    }
}

impl ViewerConfig {
    pub fn validate(&self) -> Result<(), ViewerError> {
        if self.palette.is_empty() {
            return Err(ViewerError::Config("palette must list at least one colour".into()));
        }
        if self.recurrence_bins == 0 {
            return Err(ViewerError::Config("recurrence_bins must be positive".into()));
        }
        if self.max_window_samples == 0 {
            return Err(ViewerError::Config("max_window_samples must be positive".into()));
        }
        if self.spectrogram.fft_size == 0 || self.spectrogram.hop == 0 {
            return Err(ViewerError::Config(
                "spectrogram fft_size and hop must be positive".into(),
            ));
        }
        if self.audio.preview_points == 0 || self.audio.chunk_steps == 0 {
            return Err(ViewerError::Config(
                "audio preview_points and chunk_steps must be positive".into(),
            ));
        }
        if !(self.audio.chunk_view_secs > 0.0) {
            return Err(ViewerError::Config("audio chunk_view_secs must be positive".into()));
        }
        Ok(())
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ViewerConfig, ViewerError> {
    let text = fs::read_to_string(path)?;
    let config: ViewerConfig = serde_yaml::from_str(&text)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ViewerConfig::default();
        config.validate().unwrap();
        assert_eq!(config.ecg_lead_names[3], "aVR");
        assert_eq!(config.eeg_lead_names.len(), 19);
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config: ViewerConfig =
            serde_yaml::from_str("recurrence_bins: 20\naudio:\n  chunk_steps: 10\n").unwrap();
        assert_eq!(config.recurrence_bins, 20);
        assert_eq!(config.audio.chunk_steps, 10);
        assert_eq!(config.audio.preview_points, 4000);
        assert_eq!(config.spectrogram.fft_size, 2048);
        assert_eq!(config.max_window_samples, DEFAULT_MAX_WINDOW_SAMPLES);
    }

    #[test]
    fn zero_window_limit_is_rejected() {
        let config: ViewerConfig = serde_yaml::from_str("max_window_samples: 0\n").unwrap();
        assert!(matches!(config.validate(), Err(ViewerError::Config(_))));
    }

    #[test]
    fn empty_palette_is_rejected() {
        let config: ViewerConfig = serde_yaml::from_str("palette: []\n").unwrap();
        assert!(matches!(config.validate(), Err(ViewerError::Config(_))));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_config("/nonexistent/sigview.yaml").is_err());
    }
}
