//! Violation history: recent listing and full reset.

use std::path::PathBuf;
use std::sync::Arc;

use hvs_models::RecentViolation;
use hvs_records::ViolationRepository;
use hvs_storage::clear_directory;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::WorkerConfig;
use crate::error::WorkerResult;

/// Result of clearing the history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearSummary {
    pub deleted_files: usize,
    pub message: String,
}

/// Read and reset the persisted violation history.
pub struct HistoryService {
    repository: Arc<dyn ViolationRepository>,
    /// Evidence, output and upload directories, in that order
    directories: Vec<PathBuf>,
    recent_limit: usize,
}

impl HistoryService {
    pub fn new(repository: Arc<dyn ViolationRepository>, config: &WorkerConfig) -> Self {
        Self {
            repository,
            directories: vec![
                config.violations_dir.clone(),
                config.outputs_dir.clone(),
                config.videos_dir.clone(),
            ],
            recent_limit: config.recent_limit,
        }
    }

    /// Most recent violations, newest first.
    pub async fn recent(&self) -> WorkerResult<Vec<RecentViolation>> {
        let rows = self.repository.list_recent(self.recent_limit).await?;
        Ok(rows.iter().map(RecentViolation::from).collect())
    }

    /// Truncate the records and delete every evidence, output and input file.
    ///
    /// A failed record truncation aborts before any file is touched.
    pub async fn clear(&self) -> WorkerResult<ClearSummary> {
        self.repository.clear().await?;

        let mut deleted_files = 0;
        for dir in &self.directories {
            match clear_directory(dir).await {
                Ok(n) => deleted_files += n,
                Err(e) => warn!(dir = %dir.display(), error = %e, "Failed to clear directory"),
            }
        }

        info!(deleted_files, "History cleared");
        Ok(ClearSummary {
            deleted_files,
            message: format!("History cleared. Deleted {} files.", deleted_files),
        })
    }
}
