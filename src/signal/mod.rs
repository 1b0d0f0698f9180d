// src/signal/mod.rs
pub mod axis;
pub mod buffer;
pub mod decimate;
pub mod doppler;
pub mod error;
pub mod peaks;
pub mod source;
pub mod spectrum;
pub mod synth;

pub use axis::linspace;
pub use buffer::{SignalBuffer, Window};
pub use decimate::{decimate, resample, Decimated};
pub use error::ViewerError;
pub use peaks::{detect_peaks, CyclePeaks};
pub use source::{DelimitedTextDecoder, SignalDecoder};
pub use spectrum::{Spectrogram, SpectrogramBuilder};
pub use synth::{synthesize_ecg, synthesize_eeg, EcgAbnormality, EegAbnormality, SynthSpec};
