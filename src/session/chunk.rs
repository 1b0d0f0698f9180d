//! Scrolling views over mono audio: a whole-clip preview and a stepped
//! playback window.

use serde::Serialize;

use crate::session::config::AudioConfig;
use crate::signal::{linspace, SignalBuffer};

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Waveform {
    pub t: Vec<f64>,
    pub y: Vec<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WaveformPreview {
    pub preview: Waveform,
    pub window: Waveform,
    /// `[start, end]` of the window in seconds.
    pub range: (f64, f64),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChunkStep {
    Completed { completed: bool },
    Chunk {
        completed: bool,
        time: Vec<f64>,
        amplitude: Vec<f64>,
        new_position: usize,
    },
}

impl ChunkStep {
    pub fn is_completed(&self) -> bool {
        matches!(self, ChunkStep::Completed { .. })
    }
}

/// Downsampled overview of channel 0 plus a window around `play_pos`.
///
/// The window starts 20% of its width before the play head.
pub fn waveform_preview(buffer: &SignalBuffer, play_pos: f64, audio: &AudioConfig) -> WaveformPreview {
    let samples = buffer.channel(0).unwrap_or(&[]);
    let total = samples.len();
    let duration = buffer.duration_seconds();
    let step = if total > audio.preview_points {
        total.div_ceil(audio.preview_points)
    } else {
        1
    };
    let y: Vec<f64> = samples.iter().step_by(step).copied().collect();
    let preview = Waveform {
        t: linspace(0.0, duration, y.len()),
        y,
    };

    let center = if play_pos.is_finite() { play_pos } else { 0.0 };
    let width = audio.preview_window_secs;
    let start_t = (center - width * 0.2).max(0.0);
    let end_t = (center + width * 0.8).min(duration);
    let rate = buffer.sample_rate_hz() as f64;
    let start_idx = (start_t * rate) as usize;
    let end_idx = ((end_t * rate) as usize).min(total);
    let window = if end_idx <= start_idx {
        Waveform::default()
    } else {
        Waveform {
            t: linspace(start_t, end_t, end_idx - start_idx),
            y: samples[start_idx..end_idx].to_vec(),
        }
    };
    WaveformPreview {
        preview,
        window,
        range: (start_t, end_t),
    }
}

/// Advance the playback window by one step.
///
/// Returns `Completed` once the next window would run past the end of the clip.
pub fn next_chunk(buffer: &SignalBuffer, position: usize, audio: &AudioConfig) -> ChunkStep {
    let samples = buffer.channel(0).unwrap_or(&[]);
    let rate = buffer.sample_rate_hz() as f64;
    let window = (audio.chunk_view_secs * rate) as usize;
    let step = window / audio.chunk_steps.max(1);
    let new_position = position.saturating_add(step);
    if window == 0 || new_position.saturating_add(window) > samples.len() {
        return ChunkStep::Completed { completed: true };
    }
    let chunk = &samples[new_position..new_position + window];
    let start_time = new_position as f64 / rate;
    let end_time = start_time + chunk.len() as f64 / rate;
    ChunkStep::Chunk {
        completed: false,
        time: linspace(start_time, end_time, chunk.len()),
        amplitude: chunk.to_vec(),
        new_position,
    }
}
