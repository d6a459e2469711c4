//! Tracking client error types.

use thiserror::Error;

/// Result type for tracking service calls.
pub type MlClientResult<T> = Result<T, MlClientError>;

/// Errors from the tracking service client.
#[derive(Debug, Error)]
pub enum MlClientError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Tracking service returned {status}: {message}")]
    Service { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Frame encoding failed: {0}")]
    Encode(#[from] hvs_media::MediaError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MlClientError {
    pub fn service(status: u16, message: impl Into<String>) -> Self {
        Self::Service {
            status,
            message: message.into(),
        }
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Transport failures and 5xx/429 answers may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            MlClientError::Network(_) => true,
            MlClientError::Service { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}
