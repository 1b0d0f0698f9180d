use thiserror::Error;

#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("sample rate must be greater than zero")]
    InvalidSampleRate,
    #[error("channel {channel} has {actual} samples, expected {expected}")]
    RaggedChannels {
        channel: usize,
        expected: usize,
        actual: usize,
    },
    #[error("lead name count mismatch: expected {expected}, got {actual}")]
    LeadNameMismatch { expected: usize, actual: usize },
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    #[error("no buffer stored under key {0}")]
    UnknownBuffer(String),
    #[error("failed to decode signal: {0}")]
    Decode(String),
    #[error("model failure: {0}")]
    Model(String),
    #[error("peak index {index} lies outside a window of {len} samples")]
    PeakOutOfRange { index: usize, len: usize },
    #[error("configuration error: {0}")]
    Config(String),
}

impl ViewerError {
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        ViewerError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

impl From<serde_yaml::Error> for ViewerError {
    fn from(value: serde_yaml::Error) -> Self {
        ViewerError::Config(value.to_string())
    }
}

impl From<std::io::Error> for ViewerError {
    fn from(value: std::io::Error) -> Self {
        ViewerError::Config(value.to_string())
    }
}
