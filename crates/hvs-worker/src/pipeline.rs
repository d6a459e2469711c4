//! Per-video analysis pipeline.
//!
//! Frames are read, tracked, aggregated and written strictly in order. The
//! pipeline owns no decision state of its own; everything cross-frame lives
//! in the [`TrackAggregator`] created for the run.

use std::path::{Path, PathBuf};

use hvs_media::{encode_jpeg, FrameSink, FrameSource, TrackingDetector, EVIDENCE_JPEG_QUALITY};
use hvs_models::{
    evidence_file_name, is_supported_video, output_file_name, AnalysisReport, JobId, NewViolation,
    VideoName, ViolationRecord,
};
use image::RgbImage;
use tracing::{info, Instrument};

use crate::aggregator::{Confirmation, TrackAggregator};
use crate::config::AggregatorConfig;
use crate::context::PipelineContext;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::metrics;

/// Frames between progress log lines.
const PROGRESS_INTERVAL: u64 = 100;

/// Result of one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub video_name: VideoName,
    pub output_path: PathBuf,
    pub total_frames: u64,
    /// Confirmed violations in confirmation order
    pub violations: Vec<ViolationRecord>,
}

impl PipelineOutput {
    pub fn report(&self) -> AnalysisReport {
        AnalysisReport::new(
            self.video_name.clone(),
            self.output_path.to_string_lossy(),
            self.total_frames,
            &self.violations,
        )
    }
}

/// Drives one video through tracking and violation aggregation.
pub struct VideoPipeline {
    ctx: PipelineContext,
    config: AggregatorConfig,
    outputs_dir: PathBuf,
}

impl VideoPipeline {
    pub fn new(ctx: PipelineContext, config: AggregatorConfig, outputs_dir: impl Into<PathBuf>) -> Self {
        Self {
            ctx,
            config,
            outputs_dir: outputs_dir.into(),
        }
    }

    pub fn context(&self) -> &PipelineContext {
        &self.ctx
    }

    /// Where the annotated rendering of `video` is written.
    pub fn output_path(&self, video: &VideoName) -> PathBuf {
        self.outputs_dir.join(output_file_name(video))
    }

    /// Analyse one video file.
    ///
    /// Violations are persisted as they are confirmed; if the run fails or
    /// is aborted midway, rows already written stay.
    pub async fn run(&self, job_id: &JobId, video_path: &Path) -> WorkerResult<PipelineOutput> {
        let video_name = VideoName::from_path(video_path);
        if !is_supported_video(video_path) {
            return Err(WorkerError::unsupported_video(video_name.as_str()));
        }

        let logger = JobLogger::new(job_id, &video_name);
        let span = logger.create_span();
        self.run_inner(video_path, video_name, logger).instrument(span).await
    }

    async fn run_inner(
        &self,
        video_path: &Path,
        video_name: VideoName,
        logger: JobLogger,
    ) -> WorkerResult<PipelineOutput> {
        logger.log_start(&video_path.display().to_string());

        let mut source = self.ctx.media.open_source(video_path).await?;
        let info = source.info().clone();
        let output_path = self.output_path(&video_name);

        let mut sink = match self.ctx.media.create_sink(&output_path, &info).await {
            Ok(sink) => sink,
            Err(e) => {
                close_source(source.as_mut(), &logger).await;
                return Err(e.into());
            }
        };
        let mut tracker = self.ctx.trackers.open_session(&video_name);
        let mut aggregator = TrackAggregator::new(video_name.clone(), self.config);

        let result = self
            .process_frames(
                source.as_mut(),
                sink.as_mut(),
                tracker.as_mut(),
                &mut aggregator,
                &logger,
            )
            .await;

        close_source(source.as_mut(), &logger).await;
        if let Err(e) = tracker.close().await {
            logger.log_warning(&format!("tracker close failed: {}", e));
        }

        let (total_frames, violations) = match result {
            Ok(done) => {
                sink.finish().await?;
                done
            }
            Err(e) => {
                if let Err(finish_err) = sink.finish().await {
                    logger.log_warning(&format!("output finalisation failed: {}", finish_err));
                }
                logger.log_error(&e.to_string());
                return Err(e);
            }
        };

        logger.log_completion(total_frames, violations.len());
        Ok(PipelineOutput {
            video_name,
            output_path,
            total_frames,
            violations,
        })
    }

    async fn process_frames(
        &self,
        source: &mut dyn FrameSource,
        sink: &mut dyn FrameSink,
        tracker: &mut dyn TrackingDetector,
        aggregator: &mut TrackAggregator,
        logger: &JobLogger,
    ) -> WorkerResult<(u64, Vec<ViolationRecord>)> {
        let mut frame_idx: u64 = 0;
        let mut violations = Vec::new();

        while let Some(frame) = source.next_frame().await? {
            let tracked = tracker.track(&frame).await?;

            for detection in &tracked.detections {
                // Untracked detections are drawn but never aggregated.
                let Some(track_id) = detection.track_id else {
                    continue;
                };
                if let Some(confirmation) =
                    aggregator.observe(track_id, &detection.label, detection.bbox, frame_idx, &frame.image)
                {
                    violations.push(self.emit(confirmation, logger).await);
                }
            }

            sink.write_frame(&tracked.annotated).await?;
            frame_idx += 1;
            metrics::record_frames(1);

            if frame_idx % PROGRESS_INTERVAL == 0 {
                logger.log_progress(frame_idx, violations.len());
            }
        }

        Ok((frame_idx, violations))
    }

    /// Store evidence, build the record and persist it.
    ///
    /// Storage problems degrade the record, they never drop it.
    async fn emit(&self, confirmation: Confirmation, logger: &JobLogger) -> ViolationRecord {
        let evidence = match &confirmation.crop {
            Some(crop) => {
                let key = evidence_file_name(confirmation.track_id, confirmation.frame_idx);
                self.store_evidence(&key, crop, logger).await
            }
            None => None,
        };
        let record = confirmation.into_record(evidence);

        metrics::record_violation();
        info!(
            track_id = %record.track_id,
            frame_idx = record.frame_idx,
            ratio = record.no_helmet_ratio,
            bbox = %record.bbox,
            "Violator confirmed"
        );

        if let Err(e) = self.ctx.repository.insert(NewViolation::from(&record)).await {
            metrics::record_persist_failure();
            logger.log_warning(&format!(
                "failed to persist violation for track {} at frame {}: {}",
                record.track_id, record.frame_idx, e
            ));
        }

        record
    }

    async fn store_evidence(&self, key: &str, crop: &RgbImage, logger: &JobLogger) -> Option<String> {
        let stored = match encode_jpeg(crop, EVIDENCE_JPEG_QUALITY) {
            Ok(bytes) => self
                .ctx
                .artifacts
                .put(key, bytes, "image/jpeg")
                .await
                .map_err(WorkerError::from),
            Err(e) => Err(e.into()),
        };

        match stored {
            Ok(reference) => Some(reference),
            Err(e) => {
                metrics::record_evidence_failure();
                logger.log_warning(&format!("evidence {} not stored: {}", key, e));
                None
            }
        }
    }
}

async fn close_source(source: &mut dyn FrameSource, logger: &JobLogger) {
    if let Err(e) = source.close().await {
        logger.log_warning(&format!("frame source close failed: {}", e));
    }
}
