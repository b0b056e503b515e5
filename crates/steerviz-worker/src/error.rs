//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Rendering failed: {0}")]
    RenderFailed(String),

    #[error("Metrics export failed: {0}")]
    MetricsFailed(String),

    #[error("Media error: {0}")]
    Media(#[from] steerviz_media::MediaError),

    #[error("Model error: {0}")]
    Model(#[from] steerviz_models::ModelError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn render_failed(msg: impl Into<String>) -> Self {
        Self::RenderFailed(msg.into())
    }

    pub fn metrics_failed(msg: impl Into<String>) -> Self {
        Self::MetricsFailed(msg.into())
    }

    /// Short label for the failure class, used as a metrics label.
    pub fn kind(&self) -> &'static str {
        use steerviz_media::MediaError;

        match self {
            WorkerError::ConfigError(_) => "config",
            WorkerError::RenderFailed(_) => "render",
            WorkerError::MetricsFailed(_) => "metrics",
            WorkerError::Model(_) => "model",
            WorkerError::Io(_) => "io",
            WorkerError::Media(e) => match e {
                MediaError::FileNotFound(_) => "not_found",
                MediaError::Format(_) | MediaError::Csv(_) => "format",
                MediaError::ReadFailed(_) => "read",
                MediaError::SinkFailed { .. } => "sink",
                MediaError::FfmpegNotFound | MediaError::FfprobeNotFound => "missing_tool",
                _ => "media",
            },
        }
    }
}
