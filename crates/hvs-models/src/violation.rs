//! Violation records and reports.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{PixelBox, TrackId, VideoName};

/// URL prefix under which evidence crops are published.
pub const EVIDENCE_URL_PREFIX: &str = "/violations";

/// A confirmed violator, emitted once per track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ViolationRecord {
    /// Video the track belongs to
    pub video_name: VideoName,
    /// Tracker identity of the violator
    pub track_id: TrackId,
    /// Frame (0-indexed) at which the violation was confirmed
    pub frame_idx: u64,
    /// Box at confirmation, clamped to non-negative coordinates
    pub bbox: PixelBox,
    /// No-helmet ratio that triggered confirmation
    pub no_helmet_ratio: f64,
    /// Stored evidence crop, absent when the crop region was empty
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence_image: Option<String>,
}

impl ViolationRecord {
    /// Caller-facing summary of this record.
    pub fn summary(&self) -> ViolationSummary {
        ViolationSummary {
            track_id: self.track_id,
            frame: self.frame_idx,
            ratio_no_helmet: round_ratio(self.no_helmet_ratio),
            image_url: self.evidence_image.as_deref().map(evidence_url),
        }
    }
}

/// Row shape handed to the persistence store; `created_at` is assigned on write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NewViolation {
    pub video_name: String,
    pub track_id: u32,
    pub frame_idx: u64,
    /// `"x1,y1,x2,y2"`
    pub bbox: String,
    pub ratio_no_helmet: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
}

impl From<&ViolationRecord> for NewViolation {
    fn from(record: &ViolationRecord) -> Self {
        Self {
            video_name: record.video_name.as_str().to_string(),
            track_id: record.track_id.get(),
            frame_idx: record.frame_idx,
            bbox: record.bbox.to_string(),
            ratio_no_helmet: record.no_helmet_ratio,
            image_path: record.evidence_image.clone(),
        }
    }
}

/// A persisted violation row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StoredViolation {
    pub id: u64,
    pub video_name: String,
    pub track_id: u32,
    pub frame_idx: u64,
    pub bbox: String,
    pub ratio_no_helmet: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl StoredViolation {
    pub fn from_new(id: u64, row: NewViolation, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            video_name: row.video_name,
            track_id: row.track_id,
            frame_idx: row.frame_idx,
            bbox: row.bbox,
            ratio_no_helmet: row.ratio_no_helmet,
            image_path: row.image_path,
            created_at,
        }
    }

    /// Public URL of the evidence crop, if one was stored.
    pub fn image_url(&self) -> Option<String> {
        self.image_path.as_deref().map(evidence_url)
    }
}

/// Entry of the recent-violations listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RecentViolation {
    pub id: u64,
    pub video_name: String,
    pub track_id: u32,
    pub frame_idx: u64,
    pub ratio_no_helmet: f64,
    pub image_url: Option<String>,
}

impl From<&StoredViolation> for RecentViolation {
    fn from(row: &StoredViolation) -> Self {
        Self {
            id: row.id,
            video_name: row.video_name.clone(),
            track_id: row.track_id,
            frame_idx: row.frame_idx,
            ratio_no_helmet: row.ratio_no_helmet,
            image_url: row.image_url(),
        }
    }
}

/// Short form of a violation returned with an analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ViolationSummary {
    pub track_id: TrackId,
    pub frame: u64,
    /// Rounded to three decimals
    pub ratio_no_helmet: f64,
    pub image_url: Option<String>,
}

/// Outcome of analysing one video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisReport {
    pub video_name: VideoName,
    /// Annotated output video
    pub output_path: String,
    pub total_frames: u64,
    pub violations_count: usize,
    pub violations: Vec<ViolationSummary>,
}

impl AnalysisReport {
    pub fn new(
        video_name: VideoName,
        output_path: impl Into<String>,
        total_frames: u64,
        records: &[ViolationRecord],
    ) -> Self {
        let violations: Vec<ViolationSummary> = records.iter().map(|r| r.summary()).collect();
        Self {
            video_name,
            output_path: output_path.into(),
            total_frames,
            violations_count: violations.len(),
            violations,
        }
    }
}

/// Deterministic evidence file name for a confirmation.
pub fn evidence_file_name(track_id: TrackId, frame_idx: u64) -> String {
    format!("viol_track{}_f{}.jpg", track_id, frame_idx)
}

/// Public URL for a stored evidence path: `/violations/{file_name}`.
pub fn evidence_url(image_path: &str) -> String {
    let file_name = Path::new(image_path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| image_path.to_string());
    format!("{}/{}", EVIDENCE_URL_PREFIX, file_name)
}

fn round_ratio(ratio: f64) -> f64 {
    (ratio * 1000.0).round() / 1000.0
}
