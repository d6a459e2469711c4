//! Worker error types.

use std::time::Duration;

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Job failed: {0}")]
    JobFailed(String),

    #[error("Unsupported video: {0}")]
    UnsupportedVideo(String),

    #[error("Job timed out after {0:?}")]
    Timeout(Duration),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Media error: {0}")]
    Media(#[from] hvs_media::MediaError),

    #[error("Tracker client error: {0}")]
    MlClient(#[from] hvs_ml_client::MlClientError),

    #[error("Storage error: {0}")]
    Storage(#[from] hvs_storage::StorageError),

    #[error("Records error: {0}")]
    Records(#[from] hvs_records::RecordsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn job_failed(msg: impl Into<String>) -> Self {
        Self::JobFailed(msg.into())
    }

    pub fn unsupported_video(name: impl Into<String>) -> Self {
        Self::UnsupportedVideo(name.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Check if error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            WorkerError::Timeout(_) | WorkerError::Storage(_) | WorkerError::Records(_) => true,
            WorkerError::MlClient(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Short label for the jobs metric.
    pub fn outcome_label(&self) -> &'static str {
        match self {
            WorkerError::Timeout(_) => "timeout",
            WorkerError::UnsupportedVideo(_) => "rejected",
            _ => "failed",
        }
    }
}
