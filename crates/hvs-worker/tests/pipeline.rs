mod common;

use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use common::*;
use hvs_media::MediaError;
use hvs_models::{JobId, PixelBox, TrackId};
use hvs_records::ViolationRepository;
use hvs_worker::{AggregatorConfig, PipelineContext, VideoPipeline, WorkerError};

fn pipeline(harness: &Harness) -> VideoPipeline {
    VideoPipeline::new(harness.context(), AggregatorConfig::default(), harness.outputs_dir())
}

fn pipeline_with(harness: &Harness, ctx: PipelineContext) -> VideoPipeline {
    VideoPipeline::new(ctx, AggregatorConfig::default(), harness.outputs_dir())
}

#[tokio::test]
async fn test_output_frames_keep_input_order() {
    let harness = Harness::new(FakeMedia::new(12), ScriptedTrackers::new(|_| Vec::new()));
    harness.init().await;

    let output = pipeline(&harness)
        .run(&JobId::new(), Path::new("videos/clip.mp4"))
        .await
        .unwrap();

    assert_eq!(output.total_frames, 12);
    assert_eq!(output.output_path, harness.outputs_dir().join("out_clip.mp4"));
    assert!(output.violations.is_empty());

    let sink = harness.media.sink(0);
    let sink = sink.lock().unwrap();
    assert!(sink.finished);
    let order: Vec<u64> = sink.frames.iter().map(marker).collect();
    assert_eq!(order, (0..12).collect::<Vec<_>>());
    assert_eq!(sink.path, harness.outputs_dir().join("out_clip.mp4"));

    assert_eq!(harness.media.closed.load(Ordering::SeqCst), 1);
    assert_eq!(harness.trackers.closed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_alternating_track_confirms_at_frame_fifty() {
    let harness = Harness::new(FakeMedia::new(60), ScriptedTrackers::new(alternating_then_no_helmet));
    harness.init().await;

    let output = pipeline(&harness)
        .run(&JobId::new(), Path::new("road.mp4"))
        .await
        .unwrap();

    assert_eq!(output.total_frames, 60);
    assert_eq!(output.violations.len(), 1);

    let violation = &output.violations[0];
    assert_eq!(violation.track_id, TrackId(7));
    assert_eq!(violation.frame_idx, 50);
    assert!((violation.no_helmet_ratio - 41.0 / 51.0).abs() < 1e-12);
    assert_eq!(violation.bbox, PixelBox::new(10, 10, 40, 50));

    let evidence = violation.evidence_image.as_deref().unwrap();
    assert!(evidence.ends_with("viol_track7_f50.jpg"));
    let bytes = tokio::fs::read(harness.violations_dir().join("viol_track7_f50.jpg"))
        .await
        .unwrap();
    assert_eq!(&bytes[..2], &[0xFF, 0xD8]);

    let rows = harness.repository.rows().await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].frame_idx, 50);
    assert_eq!(rows[0].bbox, "10,10,40,50");
    assert_eq!(rows[0].video_name, "road.mp4");

    let report = output.report();
    assert_eq!(report.violations_count, 1);
    assert_eq!(report.violations[0].ratio_no_helmet, 0.804);
    assert_eq!(
        report.violations[0].image_url.as_deref(),
        Some("/violations/viol_track7_f50.jpg")
    );
}

#[tokio::test]
async fn test_thirty_five_frames_are_not_enough() {
    // 25 of 35 observations without a helmet stays under the ratio.
    let harness = Harness::new(FakeMedia::new(35), ScriptedTrackers::new(alternating_then_no_helmet));
    harness.init().await;

    let output = pipeline(&harness)
        .run(&JobId::new(), Path::new("road.mp4"))
        .await
        .unwrap();

    assert!(output.violations.is_empty());
    assert!(harness.repository.rows().await.is_empty());
}

#[tokio::test]
async fn test_persistence_failure_still_reports_violation() {
    let harness = Harness::new(
        FakeMedia::new(40),
        ScriptedTrackers::new(|_| vec![tracked(3, "no_helmet", PixelBox::new(5, 5, 30, 30))]),
    );
    harness.init().await;
    let failing = Arc::new(FailingRepository::default());
    let ctx = PipelineContext {
        repository: failing.clone(),
        ..harness.context()
    };

    let output = pipeline_with(&harness, ctx)
        .run(&JobId::new(), Path::new("road.mp4"))
        .await
        .unwrap();

    assert_eq!(output.violations.len(), 1);
    assert_eq!(output.violations[0].frame_idx, 29);
    assert_eq!(failing.attempts.load(Ordering::SeqCst), 1);
    assert_eq!(output.total_frames, 40);
}

#[tokio::test]
async fn test_box_outside_frame_has_no_evidence() {
    let harness = Harness::new(
        FakeMedia::new(30),
        ScriptedTrackers::new(|_| vec![tracked(1, "No-Helmet", PixelBox::new(100, 100, 140, 140))]),
    );
    harness.init().await;

    let output = pipeline(&harness)
        .run(&JobId::new(), Path::new("road.mp4"))
        .await
        .unwrap();

    assert_eq!(output.violations.len(), 1);
    assert!(output.violations[0].evidence_image.is_none());
    assert!(!harness.violations_dir().join("viol_track1_f29.jpg").exists());

    let rows = harness.repository.rows().await;
    assert_eq!(rows.len(), 1);
    assert!(rows[0].image_path.is_none());
    assert!(rows[0].image_url().is_none());
}

#[tokio::test]
async fn test_negative_box_is_clamped() {
    let harness = Harness::new(
        FakeMedia::new(30),
        ScriptedTrackers::new(|_| vec![tracked(2, "No-Helmet", PixelBox::new(-5, -5, 50, 50))]),
    );
    harness.init().await;

    let output = pipeline(&harness)
        .run(&JobId::new(), Path::new("road.mp4"))
        .await
        .unwrap();

    let violation = &output.violations[0];
    assert_eq!(violation.bbox, PixelBox::new(0, 0, 50, 50));
    assert!(violation.evidence_image.is_some());
    let crop = image::open(harness.violations_dir().join("viol_track2_f29.jpg")).unwrap();
    assert_eq!((crop.width(), crop.height()), (50, 50));
}

#[tokio::test]
async fn test_artifact_failure_keeps_record() {
    let harness = Harness::new(
        FakeMedia::new(30),
        ScriptedTrackers::new(|_| vec![tracked(4, "No-Helmet", PixelBox::new(0, 0, 20, 20))]),
    );
    harness.init().await;
    let ctx = PipelineContext {
        artifacts: Arc::new(FailingArtifacts),
        ..harness.context()
    };

    let output = pipeline_with(&harness, ctx)
        .run(&JobId::new(), Path::new("road.mp4"))
        .await
        .unwrap();

    assert_eq!(output.violations.len(), 1);
    assert!(output.violations[0].evidence_image.is_none());
    assert_eq!(harness.repository.rows().await.len(), 1);
}

#[tokio::test]
async fn test_untracked_detections_are_skipped() {
    let harness = Harness::new(
        FakeMedia::new(80),
        ScriptedTrackers::new(|_| vec![untracked("No-Helmet", PixelBox::new(0, 0, 20, 20))]),
    );
    harness.init().await;

    let output = pipeline(&harness)
        .run(&JobId::new(), Path::new("road.mp4"))
        .await
        .unwrap();

    assert!(output.violations.is_empty());
    assert_eq!(output.total_frames, 80);
    assert_eq!(harness.media.sink(0).lock().unwrap().frames.len(), 80);
}

#[tokio::test]
async fn test_ignored_labels_do_not_skew_ratio() {
    // Riders are ignored, so track 5 has 30 no-helmet events out of 30.
    let harness = Harness::new(
        FakeMedia::new(60),
        ScriptedTrackers::new(|frame| {
            let label = if frame % 2 == 0 { "rider" } else { "No-Helmet" };
            vec![tracked(5, label, PixelBox::new(0, 0, 20, 20))]
        }),
    );
    harness.init().await;

    let output = pipeline(&harness)
        .run(&JobId::new(), Path::new("road.mp4"))
        .await
        .unwrap();

    assert_eq!(output.violations.len(), 1);
    assert_eq!(output.violations[0].frame_idx, 59);
    assert_eq!(output.violations[0].no_helmet_ratio, 1.0);
}

#[tokio::test]
async fn test_tracker_failure_is_fatal() {
    let harness = Harness::new(
        FakeMedia::new(60),
        ScriptedTrackers::new(|_| vec![tracked(9, "No-Helmet", PixelBox::new(0, 0, 20, 20))]).failing_at(45),
    );
    harness.init().await;

    let err = pipeline(&harness)
        .run(&JobId::new(), Path::new("road.mp4"))
        .await
        .unwrap_err();

    assert!(matches!(err, WorkerError::Media(MediaError::DetectionFailed(_))));
    // Confirmed before the failure and not rolled back.
    assert_eq!(harness.repository.list_recent(50).await.unwrap().len(), 1);
    assert_eq!(harness.media.sink(0).lock().unwrap().frames.len(), 45);
    assert_eq!(harness.media.closed.load(Ordering::SeqCst), 1);
    assert_eq!(harness.trackers.closed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unsupported_extension_is_rejected_up_front() {
    let harness = Harness::new(FakeMedia::new(10), ScriptedTrackers::new(|_| Vec::new()));

    let err = pipeline(&harness)
        .run(&JobId::new(), Path::new("notes.txt"))
        .await
        .unwrap_err();

    assert!(matches!(err, WorkerError::UnsupportedVideo(_)));
    assert_eq!(harness.media.opened.load(Ordering::SeqCst), 0);
    assert_eq!(harness.trackers.sessions.load(Ordering::SeqCst), 0);
}
