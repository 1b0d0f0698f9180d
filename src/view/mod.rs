// src/view/mod.rs
pub mod continuous;
pub mod polar;
pub mod recurrence;
pub mod trace;
pub mod xor;

pub use continuous::{continuous, CHANNEL_OFFSET};
pub use polar::{polar, polar_cycles, polar_fixed, PolarMode};
pub use recurrence::{recurrence, DEFAULT_BINS};
pub use trace::{Coordinates, Histogram, Palette, Trace, TraceSet, ViewContext, DEFAULT_PALETTE};
pub use xor::xor_difference;
