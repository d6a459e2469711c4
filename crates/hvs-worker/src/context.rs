//! Collaborators shared by the pipelines of one worker process.

use std::sync::Arc;

use hvs_media::{FfmpegBackend, MediaBackend, TrackerProvider};
use hvs_ml_client::{TrackerClient, TrackerClientConfig};
use hvs_records::{JsonlViolationRepository, ViolationRepository};
use hvs_storage::{ArtifactStore, LocalArtifactStore};
use tracing::info;

use crate::config::WorkerConfig;
use crate::error::WorkerResult;

/// Injected dependencies of a [`crate::VideoPipeline`].
///
/// Nothing here holds per-video state; each job opens its own frame source,
/// sink and tracker session through these handles.
#[derive(Clone)]
pub struct PipelineContext {
    pub media: Arc<dyn MediaBackend>,
    pub trackers: Arc<dyn TrackerProvider>,
    pub artifacts: Arc<dyn ArtifactStore>,
    pub repository: Arc<dyn ViolationRepository>,
}

impl PipelineContext {
    /// Production wiring: FFmpeg media, remote tracker, local evidence
    /// directory and JSON-lines records.
    pub fn from_config(config: &WorkerConfig) -> WorkerResult<Self> {
        let tracker = TrackerClient::new(TrackerClientConfig::new(
            config.tracker_url.clone(),
            config.detector_options(),
        ))?;

        Ok(Self {
            media: Arc::new(FfmpegBackend),
            trackers: Arc::new(tracker),
            artifacts: Arc::new(LocalArtifactStore::new(&config.violations_dir)),
            repository: Arc::new(JsonlViolationRepository::new(&config.records_path)),
        })
    }

    /// Create working directories and initialise both stores.
    pub async fn init(&self, config: &WorkerConfig) -> WorkerResult<()> {
        for dir in [&config.videos_dir, &config.outputs_dir, &config.violations_dir] {
            tokio::fs::create_dir_all(dir).await?;
        }
        self.artifacts.init().await?;
        self.repository.init().await?;
        info!("Worker storage initialised");
        Ok(())
    }
}
