//! Pixel-space bounding boxes.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Axis-aligned box in pixel coordinates of a frame, corner form `(x1, y1, x2, y2)`.
///
/// Coordinates may be negative or exceed the frame when the detector
/// extrapolates a box past the image border.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct PixelBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

/// Error parsing the `"x1,y1,x2,y2"` text form.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid bbox: {0}")]
pub struct ParseBoxError(pub String);

impl PixelBox {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Build from detector float coordinates, truncating toward zero.
    pub fn from_xyxy(xyxy: [f32; 4]) -> Self {
        Self {
            x1: xyxy[0] as i32,
            y1: xyxy[1] as i32,
            x2: xyxy[2] as i32,
            y2: xyxy[3] as i32,
        }
    }

    /// Clamp every coordinate to be non-negative.
    pub fn clamp_non_negative(&self) -> Self {
        Self {
            x1: self.x1.max(0),
            y1: self.y1.max(0),
            x2: self.x2.max(0),
            y2: self.y2.max(0),
        }
    }

    /// Width, zero when the box is inverted.
    #[inline]
    pub fn width(&self) -> u32 {
        (self.x2 - self.x1).max(0) as u32
    }

    /// Height, zero when the box is inverted.
    #[inline]
    pub fn height(&self) -> u32 {
        (self.y2 - self.y1).max(0) as u32
    }

    /// True when the box has zero width or height.
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Region of a `frame_width x frame_height` image covered by this box.
    ///
    /// Negative coordinates are clamped to zero and the far edges to the frame
    /// size. Returns `None` when nothing of the frame remains.
    pub fn crop_region(&self, frame_width: u32, frame_height: u32) -> Option<PixelBox> {
        let fw = frame_width.min(i32::MAX as u32) as i32;
        let fh = frame_height.min(i32::MAX as u32) as i32;
        let clamped = self.clamp_non_negative();
        let region = PixelBox {
            x1: clamped.x1.min(fw),
            y1: clamped.y1.min(fh),
            x2: clamped.x2.min(fw),
            y2: clamped.y2.min(fh),
        };
        if region.is_empty() {
            None
        } else {
            Some(region)
        }
    }
}

impl fmt::Display for PixelBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.x1, self.y1, self.x2, self.y2)
    }
}

impl FromStr for PixelBox {
    type Err = ParseBoxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<i32> = s
            .split(',')
            .map(|p| p.trim().parse::<i32>())
            .collect::<Result<_, _>>()
            .map_err(|_| ParseBoxError(s.to_string()))?;
        match parts.as_slice() {
            [x1, y1, x2, y2] => Ok(PixelBox::new(*x1, *y1, *x2, *y2)),
            _ => Err(ParseBoxError(s.to_string())),
        }
    }
}
