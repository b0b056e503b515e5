//! Media processing for steerviz.
//!
//! This crate provides:
//! - FFmpeg command building, probing and frame piping
//! - Front/dashboard frame sources with a solid fallback
//! - MP4 and still-image sinks
//! - Steering CSV loading
//! - Overlay primitives, the windowed plot, the stats panel and the
//!   frame compositor

pub mod assets;
mod bitmap_font;
pub mod command;
pub mod compositor;
pub mod error;
pub mod overlay;
pub mod panel;
pub mod plot;
pub mod probe;
pub mod sink;
pub mod source;
pub mod steering_csv;
pub mod text;

pub use assets::{Captions, OverlayAssets};
pub use command::{check_ffmpeg, check_ffprobe, Endpoint, FfmpegCommand, FfmpegRunner};
pub use compositor::{Compositor, FrameOverlays, Layout};
pub use error::{MediaError, MediaResult};
pub use panel::{render_panel, PanelLine, PanelText};
pub use plot::PlotRenderer;
pub use probe::{probe_video, VideoInfo};
pub use sink::{open_sink, transcode_to_mp4, FrameSink, OutputMode, SinkStatus, StillSink, VecFrameSink, VideoSink};
pub use source::{
    FfmpegFrameReader, Frame, FramePair, FrameSource, FrameStream, SecondarySource, VecFrameStream,
    DEFAULT_FALLBACK_COLOR,
};
pub use steering_csv::{load_column, load_epoch_series, load_human_series, load_prediction_series};
pub use text::{TextRenderer, SYSTEM_FONT_PATHS};
