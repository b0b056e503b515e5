//! Output sinks for composited frames.
//!
//! `VideoSink` pipes frames into an FFmpeg encoder writing an intermediate
//! Matroska file, then remuxes it to MP4 on `finish`. `StillSink` writes a
//! single JPEG and reports completion after the first frame.

use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin};
use tracing::{debug, info, warn};

use steerviz_models::EncodingConfig;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::source::Frame;

/// What the renderer produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Full comparison video
    #[default]
    Video,
    /// One still image of the first composite, then stop
    SingleFrame,
}

/// Whether the sink wants more frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkStatus {
    Continue,
    Complete,
}

/// Destination for composited frames.
pub trait FrameSink {
    /// Write one frame.
    fn write(&mut self, frame: &Frame) -> MediaResult<SinkStatus>;

    /// Flush and finalize; returns the delivered file, if any.
    fn finish(&mut self) -> MediaResult<Option<PathBuf>>;

    /// Frames accepted so far.
    fn frames_written(&self) -> u64;
}

/// Encoder pipe writing the intermediate file, remuxed on `finish`.
pub struct VideoSink {
    intermediate: PathBuf,
    delivery: PathBuf,
    width: u32,
    height: u32,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    frames_written: u64,
    remove_intermediate: bool,
    finished: bool,
}

impl VideoSink {
    /// Start an encoder for `width`x`height` frames.
    pub fn open(
        intermediate: impl AsRef<Path>,
        delivery: impl AsRef<Path>,
        (width, height): (u32, u32),
        encoding: &EncodingConfig,
        remove_intermediate: bool,
    ) -> MediaResult<Self> {
        let intermediate = intermediate.as_ref().to_path_buf();
        ensure_parent_dir(&intermediate)?;

        let cmd = FfmpegCommand::encode_rgb24(&intermediate, width, height, encoding.fps)
            .output_args(encoding.to_ffmpeg_args());
        let mut child = cmd
            .spawn()
            .map_err(|e| MediaError::sink_failed(&intermediate, e.to_string()))?;
        let stdin = child.stdin.take();
        if stdin.is_none() {
            let _ = child.kill();
            let _ = child.wait();
            return Err(MediaError::sink_failed(
                &intermediate,
                "Failed to capture FFmpeg stdin",
            ));
        }

        info!(
            output = %intermediate.display(),
            width,
            height,
            fps = encoding.fps,
            codec = %encoding.codec,
            "Opened video sink"
        );

        Ok(Self {
            intermediate,
            delivery: delivery.as_ref().to_path_buf(),
            width,
            height,
            child: Some(child),
            stdin,
            frames_written: 0,
            remove_intermediate,
            finished: false,
        })
    }

    fn abort(&mut self) {
        self.stdin.take();
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        for path in [&self.intermediate, &self.delivery] {
            if path.exists() {
                match std::fs::remove_file(path) {
                    Ok(()) => debug!(path = %path.display(), "Removed partial output"),
                    Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove partial output"),
                }
            }
        }
    }
}

impl FrameSink for VideoSink {
    fn write(&mut self, frame: &Frame) -> MediaResult<SinkStatus> {
        if frame.dimensions() != (self.width, self.height) {
            return Err(MediaError::buffer(format!(
                "frame is {}x{}, sink expects {}x{}",
                frame.width(),
                frame.height(),
                self.width,
                self.height
            )));
        }
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| MediaError::sink_failed(&self.intermediate, "sink already closed"))?;

        stdin.write_all(frame.as_raw()).map_err(|e| {
            let message = if e.kind() == ErrorKind::BrokenPipe {
                "encoder exited early".to_string()
            } else {
                e.to_string()
            };
            MediaError::sink_failed(&self.intermediate, message)
        })?;

        self.frames_written += 1;
        Ok(SinkStatus::Continue)
    }

    fn finish(&mut self) -> MediaResult<Option<PathBuf>> {
        // Closing stdin lets the encoder flush and exit.
        self.stdin.take();
        let Some(mut child) = self.child.take() else {
            return Err(MediaError::sink_failed(&self.intermediate, "sink already finished"));
        };
        let status = child.wait()?;
        if !status.success() {
            return Err(MediaError::ffmpeg_failed(
                format!("Encoder failed writing {}", self.intermediate.display()),
                None,
                status.code(),
            ));
        }

        transcode_to_mp4(&self.intermediate, &self.delivery, self.remove_intermediate)?;
        self.finished = true;

        info!(
            output = %self.delivery.display(),
            frames = self.frames_written,
            "Video written"
        );
        Ok(Some(self.delivery.clone()))
    }

    fn frames_written(&self) -> u64 {
        self.frames_written
    }
}

impl Drop for VideoSink {
    fn drop(&mut self) {
        if !self.finished {
            warn!(
                output = %self.intermediate.display(),
                frames = self.frames_written,
                "Video sink dropped before finish, discarding partial output"
            );
            self.abort();
        }
    }
}

/// Writes the first frame as a JPEG and asks the renderer to stop.
#[derive(Debug)]
pub struct StillSink {
    path: PathBuf,
    written: bool,
}

impl StillSink {
    pub fn open(path: impl AsRef<Path>) -> MediaResult<Self> {
        let path = path.as_ref().to_path_buf();
        ensure_parent_dir(&path)?;
        Ok(Self {
            path,
            written: false,
        })
    }
}

impl FrameSink for StillSink {
    fn write(&mut self, frame: &Frame) -> MediaResult<SinkStatus> {
        if !self.written {
            frame
                .save_with_format(&self.path, ImageFormat::Jpeg)
                .map_err(|e| MediaError::sink_failed(&self.path, e.to_string()))?;
            self.written = true;
            info!(output = %self.path.display(), "Still frame written");
        }
        Ok(SinkStatus::Complete)
    }

    fn finish(&mut self) -> MediaResult<Option<PathBuf>> {
        Ok(self.written.then(|| self.path.clone()))
    }

    fn frames_written(&self) -> u64 {
        u64::from(self.written)
    }
}

/// Collects frames in memory.
#[derive(Debug, Default)]
pub struct VecFrameSink {
    pub frames: Vec<Frame>,
    pub finished: bool,
}

impl FrameSink for VecFrameSink {
    fn write(&mut self, frame: &Frame) -> MediaResult<SinkStatus> {
        self.frames.push(frame.clone());
        Ok(SinkStatus::Continue)
    }

    fn finish(&mut self) -> MediaResult<Option<PathBuf>> {
        self.finished = true;
        Ok(None)
    }

    fn frames_written(&self) -> u64 {
        self.frames.len() as u64
    }
}

/// Open the sink for `mode`.
pub fn open_sink(
    mode: OutputMode,
    intermediate: &Path,
    delivery: &Path,
    still: &Path,
    size: (u32, u32),
    encoding: &EncodingConfig,
    remove_intermediate: bool,
) -> MediaResult<Box<dyn FrameSink>> {
    match mode {
        OutputMode::Video => Ok(Box::new(VideoSink::open(
            intermediate,
            delivery,
            size,
            encoding,
            remove_intermediate,
        )?)),
        OutputMode::SingleFrame => Ok(Box::new(StillSink::open(still)?)),
    }
}

/// Remux `input` into an MP4 at `output` without re-encoding.
pub fn transcode_to_mp4(input: &Path, output: &Path, remove_input: bool) -> MediaResult<()> {
    if !input.exists() {
        return Err(MediaError::FileNotFound(input.to_path_buf()));
    }
    info!(
        input = %input.display(),
        output = %output.display(),
        "Remuxing to MP4"
    );

    let cmd = FfmpegCommand::new(input, output).stream_copy().faststart();
    FfmpegRunner::new().run(&cmd)?;

    if remove_input {
        std::fs::remove_file(input)?;
        debug!(path = %input.display(), "Removed intermediate file");
    }
    Ok(())
}

fn ensure_parent_dir(path: &Path) -> MediaResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.is_dir() => Err(
            MediaError::sink_failed(path, format!("output directory {} does not exist", parent.display())),
        ),
        _ => Ok(()),
    }
}
