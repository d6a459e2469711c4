//! Evidence crop extraction and encoding.

use std::io::Cursor;

use hvs_models::PixelBox;
use image::{imageops, ImageOutputFormat, RgbImage};

use crate::error::MediaResult;

/// JPEG quality used for evidence crops.
pub const EVIDENCE_JPEG_QUALITY: u8 = 95;

/// Cut the part of `image` covered by `bbox`.
///
/// Negative coordinates are clamped to zero and the far edges to the image.
/// Returns `None` when the resulting region is empty.
pub fn extract_crop(image: &RgbImage, bbox: &PixelBox) -> Option<RgbImage> {
    let region = bbox.crop_region(image.width(), image.height())?;
    Some(
        imageops::crop_imm(
            image,
            region.x1 as u32,
            region.y1 as u32,
            region.width(),
            region.height(),
        )
        .to_image(),
    )
}

/// Encode an RGB image as JPEG bytes.
pub fn encode_jpeg(image: &RgbImage, quality: u8) -> MediaResult<Vec<u8>> {
    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, ImageOutputFormat::Jpeg(quality))?;
    Ok(bytes.into_inner())
}
