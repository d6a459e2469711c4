//! Detector/tracker interface.
//!
//! Detection and multi-object tracking run outside this service. The
//! pipeline only sees per-frame tracked detections through
//! [`TrackingDetector`], one session per video.

use async_trait::async_trait;
use hvs_models::{HelmetClass, PixelBox, TrackId, VideoName};
use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::error::MediaResult;
use crate::frame::Frame;

/// One detection in a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Tracker identity, absent until the tracker has locked onto the object
    pub track_id: Option<TrackId>,
    /// Raw class label from the model
    pub label: String,
    /// Box in frame pixel coordinates
    pub bbox: PixelBox,
    /// Detection confidence [0, 1]
    pub confidence: f32,
}

impl Detection {
    pub fn helmet_class(&self) -> HelmetClass {
        HelmetClass::from_label(&self.label)
    }

    pub fn is_tracked(&self) -> bool {
        self.track_id.is_some()
    }
}

/// Tracker output for one frame.
#[derive(Debug, Clone)]
pub struct TrackedFrame {
    pub detections: Vec<Detection>,
    /// Frame with the detections drawn on it
    pub annotated: RgbImage,
}

/// Options forwarded to the detector untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorOptions {
    /// Model weights identifier on the inference side
    pub model_name: String,
    /// Minimum detection confidence
    pub confidence_threshold: f32,
    /// Inference image size in pixels
    pub inference_resolution: u32,
}

impl Default for DetectorOptions {
    fn default() -> Self {
        Self {
            model_name: "best.pt".to_string(),
            confidence_threshold: 0.5,
            inference_resolution: 1280,
        }
    }
}

/// Stateful detector + tracker bound to one video.
///
/// Frames must be fed strictly in order; track identities depend on the
/// previous frames of the same session.
#[async_trait]
pub trait TrackingDetector: Send {
    /// Detect and track objects in the next frame.
    async fn track(&mut self, frame: &Frame) -> MediaResult<TrackedFrame>;

    /// Release tracker state for this session.
    async fn close(&mut self) -> MediaResult<()> {
        Ok(())
    }

    /// Human-readable name for logging.
    fn name(&self) -> &'static str;
}

/// Opens an independent tracker session per video.
pub trait TrackerProvider: Send + Sync {
    fn open_session(&self, video: &VideoName) -> Box<dyn TrackingDetector>;
}
