//! Box overlays for the annotated output stream.

use hvs_models::{HelmetClass, PixelBox};
use image::{Rgb, RgbImage};

use crate::detection::Detection;

const HELMET_COLOR: Rgb<u8> = Rgb([0, 200, 0]);
const NO_HELMET_COLOR: Rgb<u8> = Rgb([230, 0, 0]);
const OTHER_COLOR: Rgb<u8> = Rgb([240, 200, 0]);
// Untracked detections get a thinner outline.
const TRACKED_THICKNESS: u32 = 3;
const UNTRACKED_THICKNESS: u32 = 1;

/// Color for a detection's helmet class.
pub fn class_color(class: HelmetClass) -> Rgb<u8> {
    match class {
        HelmetClass::Helmet => HELMET_COLOR,
        HelmetClass::NoHelmet => NO_HELMET_COLOR,
        HelmetClass::Ignored => OTHER_COLOR,
    }
}

/// Copy of `image` with every detection outlined.
pub fn annotate_frame(image: &RgbImage, detections: &[Detection]) -> RgbImage {
    let mut annotated = image.clone();
    for det in detections {
        let thickness = if det.is_tracked() {
            TRACKED_THICKNESS
        } else {
            UNTRACKED_THICKNESS
        };
        draw_box(&mut annotated, &det.bbox, class_color(det.helmet_class()), thickness);
    }
    annotated
}

/// Draw a hollow rectangle, clipped to the image.
pub fn draw_box(image: &mut RgbImage, bbox: &PixelBox, color: Rgb<u8>, thickness: u32) {
    let Some(region) = bbox.crop_region(image.width(), image.height()) else {
        return;
    };
    let (x1, y1) = (region.x1 as u32, region.y1 as u32);
    let (x2, y2) = (region.x2 as u32, region.y2 as u32);
    let t = thickness.max(1);

    for y in y1..y2 {
        for x in x1..x2 {
            let on_edge = x < x1 + t || x + t >= x2 || y < y1 + t || y + t >= y2;
            if on_edge {
                image.put_pixel(x, y, color);
            }
        }
    }
}
