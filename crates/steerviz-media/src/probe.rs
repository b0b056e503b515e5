//! Camera stream geometry via ffprobe.
//!
//! Only the first video stream matters: its size fixes the rawvideo frame
//! length read from the decoder pipe.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::{Command, Stdio};

use crate::command::check_ffprobe;
use crate::error::{MediaError, MediaResult};

/// Fallback when the container reports no usable rate.
const ASSUMED_FPS: f64 = 30.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// `nb_frames` when the container stores it (Matroska usually does not)
    pub frame_count: Option<u64>,
}

impl VideoInfo {
    /// Bytes in one decoded RGB24 frame.
    pub fn rgb24_frame_len(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }
}

#[derive(Debug, Deserialize)]
struct ProbeReport {
    #[serde(default)]
    streams: Vec<ProbedStream>,
}

#[derive(Debug, Deserialize)]
struct ProbedStream {
    width: Option<u32>,
    height: Option<u32>,
    avg_frame_rate: Option<String>,
    r_frame_rate: Option<String>,
    nb_frames: Option<String>,
}

/// Probe the first video stream of `path`.
pub fn probe_video(path: impl AsRef<Path>) -> MediaResult<VideoInfo> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    let output = Command::new(check_ffprobe()?)
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height,avg_frame_rate,r_frame_rate,nb_frames",
            "-of",
            "json",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()?;

    if !output.status.success() {
        return Err(MediaError::FfprobeFailed {
            message: format!("cannot probe {}", path.display()),
            stderr: Some(String::from_utf8_lossy(&output.stderr).into_owned()),
        });
    }

    read_report(&output.stdout)
}

fn read_report(json: &[u8]) -> MediaResult<VideoInfo> {
    let report: ProbeReport = serde_json::from_slice(json)?;
    let Some(stream) = report.streams.into_iter().next() else {
        return Err(MediaError::InvalidVideo("no video stream".into()));
    };

    let (Some(width), Some(height)) = (stream.width, stream.height) else {
        return Err(MediaError::InvalidVideo("video stream has no size".into()));
    };
    if width == 0 || height == 0 {
        return Err(MediaError::InvalidVideo(format!("empty frame size {width}x{height}")));
    }

    let fps = [stream.avg_frame_rate, stream.r_frame_rate]
        .iter()
        .flatten()
        .find_map(|rate| rational(rate))
        .unwrap_or(ASSUMED_FPS);

    Ok(VideoInfo {
        width,
        height,
        fps,
        frame_count: stream.nb_frames.and_then(|n| n.parse().ok()),
    })
}

/// `"30000/1001"` or `"25"`; zero or negative rates are treated as unknown.
fn rational(rate: &str) -> Option<f64> {
    let value = match rate.split_once('/') {
        Some((n, d)) => n.trim().parse::<f64>().ok()? / d.trim().parse::<f64>().ok()?,
        None => rate.trim().parse().ok()?,
    };
    (value.is_finite() && value > 0.0).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rational() {
        assert_eq!(rational("30/1"), Some(30.0));
        assert!((rational("30000/1001").unwrap() - 29.97).abs() < 0.01);
        assert_eq!(rational("25"), Some(25.0));
        assert_eq!(rational("0/0"), None);
        assert_eq!(rational("n/a"), None);
    }

    #[test]
    fn test_report_prefers_average_rate() {
        let json = br#"{"streams":[{"width":1280,"height":720,
            "avg_frame_rate":"0/0","r_frame_rate":"30/1","nb_frames":"2700"}]}"#;
        let info = read_report(json).unwrap();
        assert_eq!((info.width, info.height), (1280, 720));
        assert_eq!(info.fps, 30.0);
        assert_eq!(info.frame_count, Some(2700));
        assert_eq!(info.rgb24_frame_len(), 1280 * 720 * 3);
    }

    #[test]
    fn test_report_without_video() {
        assert!(matches!(
            read_report(br#"{"streams":[]}"#),
            Err(MediaError::InvalidVideo(_))
        ));
        assert!(matches!(
            read_report(br#"{}"#),
            Err(MediaError::InvalidVideo(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = probe_video("/nonexistent/epoch01_front.mkv").unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }
}
