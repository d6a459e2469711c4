//! Frame source and annotated-output sink interfaces.

use async_trait::async_trait;
use image::RgbImage;
use std::path::Path;

use crate::error::MediaResult;
use crate::frame::Frame;
use crate::probe::VideoInfo;

/// Ordered stream of decoded frames.
#[async_trait]
pub trait FrameSource: Send {
    /// Geometry and frame rate of the stream.
    fn info(&self) -> &VideoInfo;

    /// Next frame, or `None` at end of stream.
    async fn next_frame(&mut self) -> MediaResult<Option<Frame>>;

    /// Release the underlying decoder.
    async fn close(&mut self) -> MediaResult<()>;
}

/// Writer for the annotated output video.
#[async_trait]
pub trait FrameSink: Send {
    /// Append one frame; frames are written in call order.
    async fn write_frame(&mut self, image: &RgbImage) -> MediaResult<()>;

    /// Flush and finalize the output file.
    async fn finish(&mut self) -> MediaResult<()>;
}

/// Opens sources and sinks for the pipeline.
#[async_trait]
pub trait MediaBackend: Send + Sync {
    async fn open_source(&self, path: &Path) -> MediaResult<Box<dyn FrameSource>>;

    async fn create_sink(&self, path: &Path, info: &VideoInfo) -> MediaResult<Box<dyn FrameSink>>;
}
