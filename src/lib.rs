// src/lib.rs
pub mod session;
pub mod signal;
pub mod view;

pub use session::{Session, ViewerConfig};
pub use signal::{SignalBuffer, ViewerError};
