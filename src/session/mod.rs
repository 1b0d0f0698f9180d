// src/session/mod.rs
pub mod chunk;
pub mod config;
pub mod orchestrator;
pub mod predict;
pub mod request;
pub mod store;

pub use chunk::{next_chunk, waveform_preview, ChunkStep, Waveform, WaveformPreview};
pub use config::{load_config, AudioConfig, ModelShapes, SpectrogramConfig, ViewerConfig};
pub use orchestrator::Session;
pub use predict::{
    fit_to_shape, Classifier, ClassifierSlot, DopplerEstimate, Fallback, Prediction, Predictors,
    Regressor, RegressorSlot,
};
pub use request::{
    AxisLabels, BufferRef, DopplerReport, DownsampleReport, GraphRequest, GraphResponse,
    IngestReport, PlotPayload, SignalKind, ViewKind,
};
pub use store::{BufferKey, BufferStore};
