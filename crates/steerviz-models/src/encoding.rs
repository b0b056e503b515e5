//! Encoder settings for the intermediate comparison video.
//!
//! Frames are piped to x264 inside Matroska; the MP4 delivered at the end is
//! a stream copy of that file, so these settings decide the final quality.

use serde::{Deserialize, Serialize};

pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
pub const DEFAULT_PRESET: &str = "medium";
/// Visually lossless for dashcam footage at 720p.
pub const DEFAULT_CRF: u8 = 20;
pub const DEFAULT_PIXEL_FORMAT: &str = "yuv420p";
/// The recordings and the plot's time axis both assume 30 fps.
pub const DEFAULT_FPS: f64 = 30.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodingConfig {
    pub codec: String,
    pub preset: String,
    /// x264 quality, 0..=51, lower is better
    pub crf: u8,
    pub pixel_format: String,
    pub fps: f64,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            codec: DEFAULT_VIDEO_CODEC.into(),
            preset: DEFAULT_PRESET.into(),
            crf: DEFAULT_CRF,
            pixel_format: DEFAULT_PIXEL_FORMAT.into(),
            fps: DEFAULT_FPS,
        }
    }
}

impl EncodingConfig {
    pub fn with_crf(self, crf: u8) -> Self {
        Self {
            crf: crf.min(51),
            ..self
        }
    }

    pub fn with_fps(self, fps: f64) -> Self {
        Self { fps, ..self }
    }

    /// Output-side arguments for the encoder process. Audio is dropped; the
    /// cameras carry none worth keeping.
    pub fn to_ffmpeg_args(&self) -> Vec<String> {
        [
            ("-c:v", self.codec.clone()),
            ("-preset", self.preset.clone()),
            ("-crf", self.crf.to_string()),
            ("-pix_fmt", self.pixel_format.clone()),
        ]
        .into_iter()
        .flat_map(|(flag, value)| [flag.to_string(), value])
        .chain(std::iter::once("-an".to_string()))
        .collect()
    }
}
