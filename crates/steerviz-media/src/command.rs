//! ffmpeg invocations for decoding cameras and encoding the comparison.
//!
//! Everything here is blocking: the renderer drives one frame at a time and
//! waits on each decoder/encoder pipe in turn.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// Input or output target of an FFmpeg invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// A file on disk
    File(PathBuf),
    /// Standard input or output (`-`)
    Pipe,
}

impl Endpoint {
    fn as_arg(&self) -> String {
        match self {
            Endpoint::File(path) => path.to_string_lossy().to_string(),
            Endpoint::Pipe => "-".to_string(),
        }
    }
}

/// One ffmpeg invocation: `ffmpeg -y -hide_banner -v <level> <in args> -i <in> <out args> <out>`.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    input: Endpoint,
    output: Endpoint,
    pre_input: Vec<String>,
    post_input: Vec<String>,
    verbosity: &'static str,
}

impl FfmpegCommand {
    /// File to file, used for the final remux.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self::between(
            Endpoint::File(input.as_ref().to_path_buf()),
            Endpoint::File(output.as_ref().to_path_buf()),
        )
    }

    pub fn between(input: Endpoint, output: Endpoint) -> Self {
        Self {
            input,
            output,
            pre_input: Vec::new(),
            post_input: Vec::new(),
            verbosity: "error",
        }
    }

    /// Decode `input` to raw RGB24 frames on stdout.
    pub fn decode_rgb24(input: impl AsRef<Path>) -> Self {
        Self::between(Endpoint::File(input.as_ref().to_path_buf()), Endpoint::Pipe)
            .output_args(["-f", "rawvideo", "-pix_fmt", "rgb24"])
    }

    /// Encode raw RGB24 frames of `width`x`height` read from stdin.
    pub fn encode_rgb24(output: impl AsRef<Path>, width: u32, height: u32, fps: f64) -> Self {
        Self::between(Endpoint::Pipe, Endpoint::File(output.as_ref().to_path_buf())).input_args([
            "-f".to_string(),
            "rawvideo".to_string(),
            "-pix_fmt".to_string(),
            "rgb24".to_string(),
            "-s".to_string(),
            format!("{width}x{height}"),
            "-r".to_string(),
            format!("{fps}"),
        ])
    }

    /// Arguments describing the input, placed before `-i`.
    pub fn input_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pre_input.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn output_arg(self, arg: impl Into<String>) -> Self {
        self.output_args([arg])
    }

    /// Arguments describing the output, placed after the input path.
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.post_input.extend(args.into_iter().map(Into::into));
        self
    }

    /// Copy all streams without re-encoding.
    pub fn stream_copy(self) -> Self {
        self.output_arg("-c").output_arg("copy")
    }

    /// Move the MP4 index to the front of the file.
    pub fn faststart(self) -> Self {
        self.output_arg("-movflags").output_arg("+faststart")
    }

    pub fn build_args(&self) -> Vec<String> {
        ["-y", "-hide_banner", "-v", self.verbosity]
            .into_iter()
            .map(String::from)
            .chain(self.pre_input.iter().cloned())
            .chain(["-i".to_string(), self.input.as_arg()])
            .chain(self.post_input.iter().cloned())
            .chain(std::iter::once(self.output.as_arg()))
            .collect()
    }

    /// Spawn with stdin/stdout piped according to the endpoints.
    ///
    /// Stderr is discarded for streaming commands: a long-running process
    /// that fills an unread stderr pipe would stall the frame loop.
    pub fn spawn(&self) -> MediaResult<Child> {
        let ffmpeg = check_ffmpeg()?;
        let args = self.build_args();
        debug!(args = %args.join(" "), "Spawning ffmpeg");

        let stdin = match self.input {
            Endpoint::Pipe => Stdio::piped(),
            Endpoint::File(_) => Stdio::null(),
        };
        let stdout = match self.output {
            Endpoint::Pipe => Stdio::piped(),
            Endpoint::File(_) => Stdio::null(),
        };

        Command::new(ffmpeg)
            .args(&args)
            .stdin(stdin)
            .stdout(stdout)
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| MediaError::ffmpeg_failed(format!("cannot spawn ffmpeg: {e}"), None, None))
    }
}

/// Runs file-to-file FFmpeg commands to completion.
#[derive(Debug, Default)]
pub struct FfmpegRunner;

impl FfmpegRunner {
    pub fn new() -> Self {
        Self
    }

    /// Run `cmd` to completion, keeping stderr for the error.
    pub fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        let ffmpeg = check_ffmpeg()?;
        let args = cmd.build_args();
        debug!(args = %args.join(" "), "Running ffmpeg");

        let output = Command::new(ffmpeg)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()?;

        if output.status.success() {
            Ok(())
        } else {
            Err(MediaError::ffmpeg_failed(
                format!("ffmpeg exited with {}", output.status),
                Some(String::from_utf8_lossy(&output.stderr).into_owned()),
                output.status.code(),
            ))
        }
    }
}

/// Locate `ffmpeg` on `PATH`.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}

/// Locate `ffprobe` on `PATH`.
pub fn check_ffprobe() -> MediaResult<PathBuf> {
    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remux_args() {
        let args = FfmpegCommand::new("epoch01_human_machine.mkv", "epoch01_human_machine.mp4")
            .stream_copy()
            .faststart()
            .build_args();
        assert_eq!(&args[..4], &["-y", "-hide_banner", "-v", "error"]);
        assert!(args.contains(&"copy".to_string()));
        assert!(args.contains(&"+faststart".to_string()));
        assert_eq!(args.last().unwrap(), "epoch01_human_machine.mp4");
    }

    #[test]
    fn test_decode_writes_to_stdout() {
        let args = FfmpegCommand::decode_rgb24("front.mkv").build_args();
        let input_pos = args.iter().position(|a| a == "-i").unwrap();
        assert_eq!(args[input_pos + 1], "front.mkv");
        assert!(args.contains(&"rawvideo".to_string()));
        assert!(args.contains(&"rgb24".to_string()));
        assert_eq!(args.last().unwrap(), "-");
    }

    #[test]
    fn test_encode_reads_stdin() {
        let args = FfmpegCommand::encode_rgb24("out.mkv", 1280, 720, 30.0).build_args();
        let input_pos = args.iter().position(|a| a == "-i").unwrap();
        assert_eq!(args[input_pos + 1], "-");
        let size_pos = args.iter().position(|a| a == "-s").unwrap();
        assert!(size_pos < input_pos);
        assert_eq!(args[size_pos + 1], "1280x720");
        assert_eq!(args.last().unwrap(), "out.mkv");
    }
}
