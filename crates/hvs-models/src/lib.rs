//! Shared data models for the helmet violation service.
//!
//! This crate provides Serde-serializable types for:
//! - Job and track identifiers
//! - Pixel bounding boxes and their clamping rules
//! - Helmet label classification
//! - Violation records, persisted rows and analysis reports

pub mod geometry;
pub mod job;
pub mod label;
pub mod video;
pub mod violation;

// Re-export common types
pub use geometry::PixelBox;
pub use job::{JobId, TrackId};
pub use label::HelmetClass;
pub use video::{is_supported_video, output_file_name, VideoName, SUPPORTED_VIDEO_EXTENSIONS};
pub use violation::{
    evidence_file_name, evidence_url, AnalysisReport, NewViolation, RecentViolation,
    StoredViolation, ViolationRecord, ViolationSummary,
};
