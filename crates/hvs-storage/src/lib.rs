//! Evidence artifact storage.
//!
//! This crate provides:
//! - The [`ArtifactStore`] interface used by the pipeline for evidence crops
//! - A flat-directory implementation
//! - Directory clearing for history maintenance

pub mod error;
pub mod local;
pub mod store;

pub use error::{StorageError, StorageResult};
pub use local::{clear_directory, LocalArtifactStore};
pub use store::ArtifactStore;
