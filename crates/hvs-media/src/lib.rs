//! Media layer for helmet violation analysis.
//!
//! This crate provides:
//! - Frame decoding and annotated-video encoding over the FFmpeg CLI
//! - FFprobe stream probing
//! - Evidence crop extraction and JPEG encoding
//! - Box overlays for the annotated stream
//! - The detector/tracker interface the pipeline drives

pub mod annotate;
pub mod crop;
pub mod detection;
pub mod error;
pub mod ffmpeg;
pub mod frame;
pub mod io;
pub mod probe;

pub use annotate::annotate_frame;
pub use crop::{encode_jpeg, extract_crop, EVIDENCE_JPEG_QUALITY};
pub use detection::{Detection, DetectorOptions, TrackedFrame, TrackerProvider, TrackingDetector};
pub use error::{MediaError, MediaResult};
pub use ffmpeg::{check_ffmpeg, check_ffprobe, FfmpegBackend, FfmpegFrameSink, FfmpegFrameSource};
pub use frame::Frame;
pub use io::{FrameSink, FrameSource, MediaBackend};
pub use probe::{probe_video, VideoInfo};
