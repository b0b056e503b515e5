//! Frame sources for the front and dashboard cameras.
//!
//! Frames are decoded by an FFmpeg child process that streams RGB24
//! rawvideo on stdout. The dashboard camera is optional: when its file is
//! missing, a solid frame shaped like the latest front frame stands in.

use image::{Rgb, RgbImage};
use std::collections::VecDeque;
use std::io::{BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, ExitStatus};
use tracing::{debug, info, warn};

use crate::command::FfmpegCommand;
use crate::error::{MediaError, MediaResult};
use crate::probe::{probe_video, VideoInfo};

/// A decoded RGB frame.
pub type Frame = RgbImage;

/// Background used when the dashboard camera is absent.
pub const DEFAULT_FALLBACK_COLOR: Rgb<u8> = Rgb([0, 0, 0]);

/// Pull-based stream of frames.
pub trait FrameStream {
    /// Next frame, or `None` at the end of the stream.
    fn next_frame(&mut self) -> MediaResult<Option<Frame>>;
}

/// Frames decoded from a video file by FFmpeg.
pub struct FfmpegFrameReader {
    path: PathBuf,
    info: VideoInfo,
    child: Child,
    stdout: BufReader<ChildStdout>,
    frames_read: u64,
}

impl FfmpegFrameReader {
    /// Probe `path` and start decoding it.
    pub fn open(path: impl AsRef<Path>) -> MediaResult<Self> {
        let path = path.as_ref();
        let info = probe_video(path)?;

        let mut child = FfmpegCommand::decode_rgb24(path).spawn()?;
        let stdout = match child.stdout.take() {
            Some(stdout) => stdout,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(MediaError::ffmpeg_failed(
                    "Failed to capture FFmpeg stdout",
                    None,
                    None,
                ));
            }
        };

        info!(
            path = %path.display(),
            width = info.width,
            height = info.height,
            fps = info.fps,
            "Opened video stream"
        );

        let capacity = reader_capacity(&info);
        Ok(Self {
            path: path.to_path_buf(),
            info,
            child,
            stdout: BufReader::with_capacity(capacity, stdout),
            frames_read: 0,
        })
    }

    pub fn info(&self) -> &VideoInfo {
        &self.info
    }

    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }
}

fn reader_capacity(info: &VideoInfo) -> usize {
    info.rgb24_frame_len().max(8 * 1024)
}

impl FrameStream for FfmpegFrameReader {
    fn next_frame(&mut self) -> MediaResult<Option<Frame>> {
        let mut buffer = vec![0u8; self.info.rgb24_frame_len()];
        let filled = read_full(&mut self.stdout, &mut buffer)?;

        if filled == 0 {
            let status = self.child.wait()?;
            return decoder_finished(&self.path, self.frames_read, status);
        }
        if filled < buffer.len() {
            return Err(MediaError::read_failed(format!(
                "{}: truncated frame {} ({} of {} bytes)",
                self.path.display(),
                self.frames_read,
                filled,
                buffer.len()
            )));
        }

        self.frames_read += 1;
        RgbImage::from_raw(self.info.width, self.info.height, buffer)
            .map(Some)
            .ok_or_else(|| MediaError::buffer("frame buffer size does not match dimensions"))
    }
}

impl Drop for FfmpegFrameReader {
    fn drop(&mut self) {
        // The decoder may still be producing frames past a frame limit.
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// A closed pipe is only a clean end of stream if the decoder exited cleanly.
fn decoder_finished(path: &Path, frames: u64, status: ExitStatus) -> MediaResult<Option<Frame>> {
    if !status.success() {
        return Err(MediaError::read_failed(format!(
            "{}: decoder {} after {} frames",
            path.display(),
            status,
            frames
        )));
    }
    debug!(path = %path.display(), frames, "End of video stream");
    Ok(None)
}

/// Read until `buf` is full or the stream ends; returns the bytes read.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> MediaResult<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(MediaError::read_failed(e.to_string())),
        }
    }
    Ok(filled)
}

/// In-memory frames, mainly for driving the pipeline without FFmpeg.
#[derive(Debug, Default)]
pub struct VecFrameStream {
    frames: VecDeque<Frame>,
}

impl VecFrameStream {
    pub fn new(frames: impl IntoIterator<Item = Frame>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    /// `count` frames of one solid color.
    pub fn solid(count: usize, width: u32, height: u32, color: Rgb<u8>) -> Self {
        Self::new((0..count).map(|_| RgbImage::from_pixel(width, height, color)))
    }
}

impl FrameStream for VecFrameStream {
    fn next_frame(&mut self) -> MediaResult<Option<Frame>> {
        Ok(self.frames.pop_front())
    }
}

/// The dashboard camera, or its stand-in.
pub enum SecondarySource {
    Stream(Box<dyn FrameStream>),
    Fallback { color: Rgb<u8> },
}

impl SecondarySource {
    /// Open `path`, or fall back to solid frames if it does not exist.
    pub fn open_or_fallback(path: impl AsRef<Path>, color: Rgb<u8>) -> MediaResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!(
                path = %path.display(),
                "Dashboard video not found, using solid fallback frames"
            );
            return Ok(Self::Fallback { color });
        }
        Ok(Self::Stream(Box::new(FfmpegFrameReader::open(path)?)))
    }

    /// Next secondary frame; the fallback mirrors `primary`'s dimensions.
    pub fn next_for(&mut self, primary: &Frame) -> MediaResult<Option<Frame>> {
        match self {
            Self::Stream(stream) => stream.next_frame(),
            Self::Fallback { color } => Ok(Some(RgbImage::from_pixel(
                primary.width(),
                primary.height(),
                *color,
            ))),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// One synchronized pair of frames.
#[derive(Debug, Clone)]
pub struct FramePair {
    pub primary: Frame,
    pub secondary: Frame,
}

/// Front camera plus dashboard camera, advanced in lockstep.
pub struct FrameSource {
    primary: Box<dyn FrameStream>,
    secondary: SecondarySource,
}

impl FrameSource {
    /// Open both cameras. A missing front video is fatal; a missing dash
    /// video is not.
    pub fn open(
        primary_path: impl AsRef<Path>,
        secondary_path: impl AsRef<Path>,
        fallback_color: Rgb<u8>,
    ) -> MediaResult<Self> {
        let primary_path = primary_path.as_ref();
        if !primary_path.exists() {
            return Err(MediaError::FileNotFound(primary_path.to_path_buf()));
        }
        let primary = FfmpegFrameReader::open(primary_path)?;
        let secondary = SecondarySource::open_or_fallback(secondary_path, fallback_color)?;
        Ok(Self::from_parts(Box::new(primary), secondary))
    }

    pub fn from_parts(primary: Box<dyn FrameStream>, secondary: SecondarySource) -> Self {
        Self { primary, secondary }
    }

    /// Next pair, or `None` once either camera runs out.
    pub fn next(&mut self) -> MediaResult<Option<FramePair>> {
        let Some(primary) = self.primary.next_frame()? else {
            return Ok(None);
        };
        let Some(secondary) = self.secondary.next_for(&primary)? else {
            warn!("Dashboard video ended before the front video");
            return Ok(None);
        };
        Ok(Some(FramePair { primary, secondary }))
    }

    pub fn has_fallback_secondary(&self) -> bool {
        self.secondary.is_fallback()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_fallback_matches_primary_dims() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("epoch01_dash.mkv");
        let color = Rgb([12, 34, 56]);

        let mut secondary = SecondarySource::open_or_fallback(&missing, color).unwrap();
        assert!(secondary.is_fallback());

        for (w, h) in [(1280, 720), (640, 360), (3, 2)] {
            let primary = RgbImage::new(w, h);
            let frame = secondary.next_for(&primary).unwrap().unwrap();
            assert_eq!(frame.dimensions(), (w, h));
            assert!(frame.pixels().all(|p| *p == color));
        }
    }

    #[test]
    fn test_pairs_until_primary_ends() {
        let primary = VecFrameStream::solid(3, 4, 4, Rgb([255, 0, 0]));
        let mut source = FrameSource::from_parts(
            Box::new(primary),
            SecondarySource::Fallback {
                color: DEFAULT_FALLBACK_COLOR,
            },
        );
        assert!(source.has_fallback_secondary());

        let mut count = 0;
        while let Some(pair) = source.next().unwrap() {
            assert_eq!(pair.primary.dimensions(), pair.secondary.dimensions());
            count += 1;
        }
        assert_eq!(count, 3);
    }

    #[test]
    fn test_stops_when_secondary_ends() {
        let primary = VecFrameStream::solid(5, 2, 2, Rgb([1, 1, 1]));
        let secondary = VecFrameStream::solid(2, 2, 2, Rgb([2, 2, 2]));
        let mut source = FrameSource::from_parts(
            Box::new(primary),
            SecondarySource::Stream(Box::new(secondary)),
        );

        assert!(source.next().unwrap().is_some());
        assert!(source.next().unwrap().is_some());
        assert!(source.next().unwrap().is_none());
    }

    #[test]
    fn test_missing_primary_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = FrameSource::open(
            dir.path().join("front.mkv"),
            dir.path().join("dash.mkv"),
            DEFAULT_FALLBACK_COLOR,
        )
        .err()
        .unwrap();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_decoder_exit_status() {
        use std::os::unix::process::ExitStatusExt;

        let path = Path::new("epoch01_front.mkv");
        assert!(decoder_finished(path, 40, ExitStatus::from_raw(0)).unwrap().is_none());

        // Exit code 1, as ffmpeg reports a corrupt stream.
        let err = decoder_finished(path, 40, ExitStatus::from_raw(1 << 8)).unwrap_err();
        assert!(matches!(err, MediaError::ReadFailed(msg) if msg.contains("after 40 frames")));
    }

    #[test]
    fn test_read_full_reports_partial() {
        let mut reader = Cursor::new(vec![7u8; 5]);
        let mut buf = [0u8; 8];
        assert_eq!(read_full(&mut reader, &mut buf).unwrap(), 5);
        assert_eq!(read_full(&mut reader, &mut buf).unwrap(), 0);
    }
}
