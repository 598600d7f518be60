//! Engine error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("no default output device available")]
    NoOutputDevice,

    #[error("output device `{0}` not found")]
    DeviceNotFound(String),

    #[error("failed to query device configuration: {0}")]
    DeviceConfig(String),

    #[error("unsupported sample format: {0}")]
    UnsupportedFormat(String),

    #[error("failed to build output stream: {0}")]
    BuildStream(String),

    #[error("failed to start output stream: {0}")]
    PlayStream(String),

    #[error("layer index {index} out of range (have {count} layers)")]
    LayerOutOfRange { index: usize, count: usize },

    #[error("engine has been disposed")]
    Closed,
}

pub type Result<T> = core::result::Result<T, EngineError>;
