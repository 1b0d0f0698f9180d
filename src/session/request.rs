use serde::{Deserialize, Serialize};

use crate::signal::{SignalBuffer, Spectrogram, ViewerError};
use crate::view::{Histogram, PolarMode, TraceSet};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalKind {
    #[default]
    Eeg,
    Ecg,
    Drone,
    Doppler,
}

impl SignalKind {
    pub fn is_biosignal(self) -> bool {
        matches!(self, SignalKind::Eeg | SignalKind::Ecg)
    }
}

/// A recording referenced by store key or sent inline.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum BufferRef {
    Stored { buffer_id: String },
    Inline { data: Vec<Vec<f64>>, fs: u32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    Continuous,
    Xor,
    Polar,
    Recurrence,
}

fn default_chunk_duration() -> f64 {
    2.0
}

fn default_colormap() -> String {
    "Viridis".to_string()
}

fn default_rec_ch_y() -> i64 {
    1
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct GraphRequest {
    #[serde(flatten)]
    pub source: BufferRef,
    #[serde(default)]
    pub kind: SignalKind,
    /// Channels to draw, in colour order. Missing means all channels; indices
    /// that do not name a channel are skipped.
    #[serde(default)]
    pub channels: Option<Vec<i64>>,
    pub viewer_type: ViewKind,
    pub position: f64,
    pub zoom: f64,
    #[serde(default = "default_chunk_duration")]
    pub chunk_duration: f64,
    #[serde(default = "default_colormap")]
    pub colormap: String,
    #[serde(default)]
    pub polar_mode: PolarMode,
    #[serde(default)]
    pub rec_ch_x: i64,
    #[serde(default = "default_rec_ch_y")]
    pub rec_ch_y: i64,
    #[serde(default)]
    pub undersample_freq: Option<i64>,
}

impl GraphRequest {
    /// Reject parameters no transform can interpret.
    pub fn validate(&self) -> Result<(), ViewerError> {
        if !self.position.is_finite() || self.position < 0.0 {
            return Err(ViewerError::invalid("position", "must be a finite non-negative number"));
        }
        if !self.zoom.is_finite() || self.zoom < 0.0 {
            return Err(ViewerError::invalid("zoom", "must be a finite non-negative number"));
        }
        if !self.chunk_duration.is_finite() || self.chunk_duration < 0.0 {
            return Err(ViewerError::invalid(
                "chunk_duration",
                "must be a finite non-negative number",
            ));
        }
        Ok(())
    }

    /// Reject windows longer than `max_samples` at `rate_hz`.
    ///
    /// Cumulative polar plots extract everything up to `position + zoom`, so
    /// that sum is bounded as well.
    pub fn check_window_sizes(&self, rate_hz: u32, max_samples: usize) -> Result<(), ViewerError> {
        let too_long = |secs: f64| (secs * rate_hz as f64).floor() > max_samples as f64;
        let reason = || format!("window exceeds {max_samples} samples at {rate_hz} Hz");
        if too_long(self.zoom) {
            return Err(ViewerError::invalid("zoom", reason()));
        }
        if too_long(self.chunk_duration) {
            return Err(ViewerError::invalid("chunk_duration", reason()));
        }
        let cumulative = self.viewer_type == ViewKind::Polar
            && self.effective_polar_mode() == PolarMode::Cumulative;
        if cumulative && too_long(self.position + self.zoom) {
            return Err(ViewerError::invalid("position", reason()));
        }
        Ok(())
    }

    /// Polar cycles only make sense for ECG; other kinds get the cumulative view.
    pub fn effective_polar_mode(&self) -> PolarMode {
        match (self.polar_mode, self.kind) {
            (PolarMode::Cycles, SignalKind::Ecg) => PolarMode::Cycles,
            (PolarMode::Cycles, _) => PolarMode::Cumulative,
            (mode, _) => mode,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AxisLabels {
    pub title: String,
    pub x_axis: String,
    pub y_axis: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PlotPayload {
    Traces { traces: TraceSet },
    Heatmap {
        #[serde(flatten)]
        histogram: Histogram,
        colormap: String,
    },
    Empty,
}

impl PlotPayload {
    pub fn is_empty(&self) -> bool {
        match self {
            PlotPayload::Traces { traces } => traces.is_empty(),
            PlotPayload::Heatmap { .. } => false,
            PlotPayload::Empty => true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GraphResponse {
    pub plot: PlotPayload,
    pub labels: AxisLabels,
    pub current_time: String,
    pub effective_rate: u32,
    pub success: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IngestReport {
    pub buffer_id: String,
    pub kind: SignalKind,
    /// Label code, absent for kinds that are not classified.
    pub prediction: Option<String>,
    pub status: Option<String>,
    pub confidence: Option<f64>,
    pub channels: usize,
    pub duration: f64,
    pub fs: u32,
    pub synthetic: bool,
    pub success: bool,
}

/// One audio clip after a Doppler operation, stored for chunk streaming.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DopplerReport {
    pub buffer_id: String,
    pub status: String,
    /// Observed-frequency summary, empty when no source frequency was given.
    pub observed: String,
    pub spectrogram: Spectrogram,
    pub success: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DownsampleReport {
    pub buffer_id: String,
    pub original_rate: u32,
    pub new_rate: u32,
    pub samples: usize,
    pub success: bool,
}

/// Resolve an inline matrix into a buffer, or return the store key.
pub(crate) enum Resolved {
    Key(String),
    Buffer(SignalBuffer),
}

impl BufferRef {
    pub(crate) fn resolve(&self) -> Result<Resolved, ViewerError> {
        match self {
            BufferRef::Stored { buffer_id } => Ok(Resolved::Key(buffer_id.clone())),
            BufferRef::Inline { data, fs } => Ok(Resolved::Buffer(SignalBuffer::new(data.clone(), *fs)?)),
        }
    }
}
