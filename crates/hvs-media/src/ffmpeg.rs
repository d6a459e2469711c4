//! Raw-video frame I/O through the FFmpeg CLI.
//!
//! Decoding spawns `ffmpeg` writing packed RGB24 frames to stdout; encoding
//! spawns `ffmpeg` reading packed RGB24 frames from stdin. Both keep the
//! input geometry and frame rate.

use async_trait::async_trait;
use image::RgbImage;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, info, warn};

use crate::error::{MediaError, MediaResult};
use crate::frame::Frame;
use crate::io::{FrameSink, FrameSource, MediaBackend};
use crate::probe::{probe_video, VideoInfo};

/// Codec for the annotated output (MPEG-4 Part 2, the `mp4v` fourcc).
pub const OUTPUT_CODEC: &str = "mpeg4";

/// Arguments decoding `input` to RGB24 on stdout.
pub fn decode_args(input: &Path) -> Vec<String> {
    vec![
        "-v".to_string(),
        "error".to_string(),
        "-i".to_string(),
        input.to_string_lossy().to_string(),
        "-an".to_string(),
        "-f".to_string(),
        "rawvideo".to_string(),
        "-pix_fmt".to_string(),
        "rgb24".to_string(),
        "pipe:1".to_string(),
    ]
}

/// Arguments encoding RGB24 frames from stdin into `output`.
pub fn encode_args(output: &Path, info: &VideoInfo) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-v".to_string(),
        "error".to_string(),
        "-f".to_string(),
        "rawvideo".to_string(),
        "-pix_fmt".to_string(),
        "rgb24".to_string(),
        "-s".to_string(),
        format!("{}x{}", info.width, info.height),
        "-r".to_string(),
        format!("{}", info.fps),
        "-i".to_string(),
        "pipe:0".to_string(),
        "-c:v".to_string(),
        OUTPUT_CODEC.to_string(),
        "-q:v".to_string(),
        "3".to_string(),
        output.to_string_lossy().to_string(),
    ]
}

/// Frame source backed by an `ffmpeg` decoder process.
pub struct FfmpegFrameSource {
    info: VideoInfo,
    path: PathBuf,
    child: Child,
    stdout: Option<ChildStdout>,
    next_index: u64,
    exhausted: bool,
}

impl FfmpegFrameSource {
    /// Probe `path` and start decoding it.
    pub async fn open(path: impl AsRef<Path>) -> MediaResult<Self> {
        let path = path.as_ref();
        let info = probe_video(path).await?;
        Self::open_with_info(path, info)
    }

    /// Start decoding with already known stream info.
    pub fn open_with_info(path: impl AsRef<Path>, info: VideoInfo) -> MediaResult<Self> {
        let path = path.as_ref();
        which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

        let args = decode_args(path);
        debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;
        let stdout = child.stdout.take();

        info!(
            path = %path.display(),
            width = info.width,
            height = info.height,
            fps = info.fps,
            "Opened frame source"
        );

        Ok(Self {
            info,
            path: path.to_path_buf(),
            child,
            stdout,
            next_index: 0,
            exhausted: false,
        })
    }
}

#[async_trait]
impl FrameSource for FfmpegFrameSource {
    fn info(&self) -> &VideoInfo {
        &self.info
    }

    async fn next_frame(&mut self) -> MediaResult<Option<Frame>> {
        if self.exhausted {
            return Ok(None);
        }
        let Some(stdout) = self.stdout.as_mut() else {
            return Ok(None);
        };

        let frame_len = self.info.rgb_frame_len();
        let mut buf = vec![0u8; frame_len];
        let mut filled = 0;
        while filled < frame_len {
            let n = stdout.read(&mut buf[filled..]).await?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        if filled < frame_len {
            if filled > 0 {
                warn!(
                    path = %self.path.display(),
                    frame = self.next_index,
                    bytes = filled,
                    "Dropping truncated trailing frame"
                );
            }
            self.exhausted = true;
            return Ok(None);
        }

        let frame = Frame::from_rgb(self.next_index, self.info.width, self.info.height, buf)?;
        self.next_index += 1;
        Ok(Some(frame))
    }

    async fn close(&mut self) -> MediaResult<()> {
        self.stdout = None;
        if !self.exhausted {
            // Stopped early; the decoder is no longer needed.
            self.child.start_kill().ok();
            self.child.wait().await?;
            return Ok(());
        }

        let status = self.child.wait().await?;
        if status.success() {
            Ok(())
        } else {
            Err(MediaError::ffmpeg_failed(
                format!("decoding {} failed", self.path.display()),
                status.code(),
            ))
        }
    }
}

/// Annotated-video sink backed by an `ffmpeg` encoder process.
pub struct FfmpegFrameSink {
    path: PathBuf,
    width: u32,
    height: u32,
    child: Child,
    stdin: Option<ChildStdin>,
    frames_written: u64,
}

impl FfmpegFrameSink {
    /// Start an encoder writing to `path` with the geometry and rate of `info`.
    pub async fn create(path: impl AsRef<Path>, info: &VideoInfo) -> MediaResult<Self> {
        let path = path.as_ref();
        which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let args = encode_args(path, info);
        debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;
        let stdin = child.stdin.take();

        Ok(Self {
            path: path.to_path_buf(),
            width: info.width,
            height: info.height,
            child,
            stdin,
            frames_written: 0,
        })
    }
}

#[async_trait]
impl FrameSink for FfmpegFrameSink {
    async fn write_frame(&mut self, image: &RgbImage) -> MediaResult<()> {
        if image.dimensions() != (self.width, self.height) {
            return Err(MediaError::FrameSizeMismatch {
                expected_width: self.width,
                expected_height: self.height,
                width: image.width(),
                height: image.height(),
            });
        }
        let stdin = self.stdin.as_mut().ok_or(MediaError::SinkClosed)?;
        stdin.write_all(image.as_raw()).await?;
        self.frames_written += 1;
        Ok(())
    }

    async fn finish(&mut self) -> MediaResult<()> {
        let Some(mut stdin) = self.stdin.take() else {
            return Ok(());
        };
        stdin.flush().await?;
        drop(stdin);

        let status = self.child.wait().await?;
        if !status.success() {
            return Err(MediaError::ffmpeg_failed(
                format!("encoding {} failed", self.path.display()),
                status.code(),
            ));
        }

        info!(
            path = %self.path.display(),
            frames = self.frames_written,
            "Annotated video written"
        );
        Ok(())
    }
}

/// [`MediaBackend`] using the FFmpeg CLI for both directions.
#[derive(Debug, Clone, Default)]
pub struct FfmpegBackend;

#[async_trait]
impl MediaBackend for FfmpegBackend {
    async fn open_source(&self, path: &Path) -> MediaResult<Box<dyn FrameSource>> {
        Ok(Box::new(FfmpegFrameSource::open(path).await?))
    }

    async fn create_sink(&self, path: &Path, info: &VideoInfo) -> MediaResult<Box<dyn FrameSink>> {
        Ok(Box::new(FfmpegFrameSink::create(path, info).await?))
    }
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}

/// Check if FFprobe is available.
pub fn check_ffprobe() -> MediaResult<PathBuf> {
    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)
}
