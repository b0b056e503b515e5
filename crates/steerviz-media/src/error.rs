//! Errors from camera decoding, compositing and output encoding.

use std::path::PathBuf;
use thiserror::Error;

pub type MediaResult<T> = Result<T, MediaError>;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("ffmpeg is not on PATH")]
    FfmpegNotFound,

    #[error("ffprobe is not on PATH")]
    FfprobeNotFound,

    #[error("ffmpeg failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("ffprobe failed: {message}")]
    FfprobeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("Missing input {0}")]
    FileNotFound(PathBuf),

    #[error("Malformed steering data: {0}")]
    Format(String),

    #[error("Truncated or unreadable frame: {0}")]
    ReadFailed(String),

    #[error("Cannot write output {path}: {message}")]
    SinkFailed { path: PathBuf, message: String },

    #[error("Unusable video stream: {0}")]
    InvalidVideo(String),

    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("ffprobe output: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Image: {0}")]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Model(#[from] steerviz_models::ModelError),

    #[error("Invalid font file: {0}")]
    InvalidFont(PathBuf),

    #[error("Layout does not fit output: {0}")]
    Layout(String),

    #[error("Plot rendering failed: {0}")]
    Plot(String),

    #[error("Frame buffer: {0}")]
    Buffer(String),
}

impl MediaError {
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Malformed row, missing column or length mismatch.
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format(message.into())
    }

    pub fn read_failed(message: impl Into<String>) -> Self {
        Self::ReadFailed(message.into())
    }

    pub fn sink_failed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::SinkFailed {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn buffer(message: impl Into<String>) -> Self {
        Self::Buffer(message.into())
    }
}
