//! Decoded video frames.

use image::RgbImage;

use crate::error::{MediaError, MediaResult};

/// One decoded frame and its 0-based position in the stream.
#[derive(Debug, Clone)]
pub struct Frame {
    pub index: u64,
    pub image: RgbImage,
}

impl Frame {
    pub fn new(index: u64, image: RgbImage) -> Self {
        Self { index, image }
    }

    /// Wrap packed RGB24 bytes.
    pub fn from_rgb(index: u64, width: u32, height: u32, data: Vec<u8>) -> MediaResult<Self> {
        let len = data.len();
        let image = RgbImage::from_raw(width, height, data).ok_or_else(|| {
            MediaError::invalid_video(format!(
                "frame {} has {} bytes, expected {}",
                index,
                len,
                width as usize * height as usize * 3
            ))
        })?;
        Ok(Self { index, image })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}
