//! Job executor.
//!
//! Runs several videos at once, each through its own pipeline run with a
//! private aggregator and tracker session. Concurrency is bounded by a
//! semaphore and every job is wrapped in the configured timeout.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use hvs_models::{AnalysisReport, JobId};
use tokio::sync::Semaphore;
use tracing::{error, info};

use crate::config::WorkerConfig;
use crate::context::PipelineContext;
use crate::error::{WorkerError, WorkerResult};
use crate::metrics;
use crate::pipeline::VideoPipeline;

/// Outcome of one submitted video.
#[derive(Debug)]
pub struct JobOutcome {
    pub job_id: JobId,
    pub video: PathBuf,
    pub result: WorkerResult<AnalysisReport>,
}

/// Bounded-concurrency video analysis executor.
pub struct JobExecutor {
    pipeline: Arc<VideoPipeline>,
    job_semaphore: Arc<Semaphore>,
    job_timeout: Duration,
    max_concurrent_jobs: usize,
}

impl JobExecutor {
    pub fn new(config: &WorkerConfig, ctx: PipelineContext) -> Self {
        let pipeline = VideoPipeline::new(ctx, config.aggregator(), &config.outputs_dir);
        Self {
            pipeline: Arc::new(pipeline),
            job_semaphore: Arc::new(Semaphore::new(config.max_concurrent_jobs)),
            job_timeout: config.job_timeout,
            max_concurrent_jobs: config.max_concurrent_jobs,
        }
    }

    pub fn pipeline(&self) -> &VideoPipeline {
        &self.pipeline
    }

    /// Analyse a single video.
    pub async fn analyze(&self, video: &Path) -> WorkerResult<AnalysisReport> {
        let job_id = JobId::new();
        Self::execute_job(
            Arc::clone(&self.pipeline),
            Arc::clone(&self.job_semaphore),
            self.job_timeout,
            job_id,
            video.to_path_buf(),
        )
        .await
    }

    /// Analyse all `videos` concurrently; outcomes keep the input order.
    pub async fn analyze_all(&self, videos: Vec<PathBuf>) -> Vec<JobOutcome> {
        info!(
            videos = videos.len(),
            max_concurrent_jobs = self.max_concurrent_jobs,
            "Starting analysis batch"
        );

        let handles: Vec<_> = videos
            .into_iter()
            .map(|video| {
                let job_id = JobId::new();
                let pipeline = Arc::clone(&self.pipeline);
                let semaphore = Arc::clone(&self.job_semaphore);
                let timeout = self.job_timeout;
                let task_job_id = job_id.clone();
                let task_video = video.clone();
                let handle = tokio::spawn(async move {
                    Self::execute_job(pipeline, semaphore, timeout, task_job_id, task_video).await
                });
                (job_id, video, handle)
            })
            .collect();

        let (ids, handles): (Vec<_>, Vec<_>) = handles
            .into_iter()
            .map(|(job_id, video, handle)| ((job_id, video), handle))
            .unzip();

        join_all(handles)
            .await
            .into_iter()
            .zip(ids)
            .map(|(joined, (job_id, video))| {
                let result = joined.unwrap_or_else(|e| {
                    Err(WorkerError::job_failed(format!("job task aborted: {}", e)))
                });
                JobOutcome {
                    job_id,
                    video,
                    result,
                }
            })
            .collect()
    }

    async fn execute_job(
        pipeline: Arc<VideoPipeline>,
        semaphore: Arc<Semaphore>,
        job_timeout: Duration,
        job_id: JobId,
        video: PathBuf,
    ) -> WorkerResult<AnalysisReport> {
        let _permit = semaphore
            .acquire_owned()
            .await
            .map_err(|_| WorkerError::job_failed("Semaphore closed"))?;

        info!(job_id = %job_id, video = %video.display(), "Executing job");

        let result = match tokio::time::timeout(job_timeout, pipeline.run(&job_id, &video)).await {
            Ok(result) => result.map(|output| output.report()),
            Err(_) => Err(WorkerError::Timeout(job_timeout)),
        };

        match &result {
            Ok(report) => {
                metrics::record_job("completed");
                info!(
                    job_id = %job_id,
                    frames = report.total_frames,
                    violations = report.violations_count,
                    "Job completed successfully"
                );
            }
            Err(e) => {
                metrics::record_job(e.outcome_label());
                error!(job_id = %job_id, video = %video.display(), "Job failed: {}", e);
            }
        }
        result
    }
}
