//! Client for the external detection and tracking service.
//!
//! Implements [`hvs_media::TrackerProvider`] so the pipeline can open one
//! remote tracker session per video.

pub mod client;
pub mod error;

pub use client::{RemoteTrackingSession, TrackerClient, TrackerClientConfig};
pub use error::{MlClientError, MlClientResult};
