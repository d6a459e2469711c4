//! Structured job logging.

use hvs_models::{JobId, VideoName};
use tracing::{error, info, warn, Span};

/// Logs the lifecycle of one video analysis with its job id and video name
/// attached to every event.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
    video: String,
}

impl JobLogger {
    pub fn new(job_id: &JobId, video: &VideoName) -> Self {
        Self {
            job_id: job_id.to_string(),
            video: video.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(job_id = %self.job_id, video = %self.video, "Analysis started: {}", message);
    }

    pub fn log_progress(&self, frames: u64, violations: usize) {
        info!(
            job_id = %self.job_id,
            video = %self.video,
            frames,
            violations,
            "Analysis progress"
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(job_id = %self.job_id, video = %self.video, "Analysis warning: {}", message);
    }

    pub fn log_error(&self, message: &str) {
        error!(job_id = %self.job_id, video = %self.video, "Analysis error: {}", message);
    }

    pub fn log_completion(&self, frames: u64, violations: usize) {
        info!(
            job_id = %self.job_id,
            video = %self.video,
            frames,
            violations,
            "Analysis completed"
        );
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn video(&self) -> &str {
        &self.video
    }

    /// Span carrying the job context, for instrumenting the whole run.
    pub fn create_span(&self) -> Span {
        tracing::info_span!("job", job_id = %self.job_id, video = %self.video)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_logger_creation() {
        let job_id = JobId::new();
        let logger = JobLogger::new(&job_id, &VideoName::from("road.mp4"));

        assert_eq!(logger.job_id(), job_id.to_string());
        assert_eq!(logger.video(), "road.mp4");
    }
}
