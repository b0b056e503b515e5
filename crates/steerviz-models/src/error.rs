//! Error types for model construction.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while building or combining model values.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Series length mismatch: human has {human} frames, machine has {machine}")]
    LengthMismatch { human: usize, machine: usize },

    #[error("Timing length mismatch: {timings} timings for {frames} frames")]
    TimingMismatch { timings: usize, frames: usize },

    #[error("Non-finite steering value at frame {index}")]
    NonFinite { index: usize },

    #[error("Unknown resolution: {0}")]
    UnknownResolution(String),

    #[error("Unknown dataset layout: {0}")]
    UnknownLayout(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

impl ModelError {
    /// Create an invalid value error.
    pub fn invalid_value(message: impl Into<String>) -> Self {
        Self::InvalidValue(message.into())
    }
}
