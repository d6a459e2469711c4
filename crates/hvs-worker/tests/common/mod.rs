//! Fake collaborators for pipeline tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use hvs_media::{
    Detection, Frame, FrameSink, FrameSource, MediaBackend, MediaError, MediaResult, TrackedFrame,
    TrackerProvider, TrackingDetector, VideoInfo,
};
use hvs_models::{NewViolation, PixelBox, StoredViolation, TrackId, VideoName};
use hvs_records::{InMemoryViolationRepository, RecordsError, RecordsResult, ViolationRepository};
use hvs_storage::{ArtifactStore, LocalArtifactStore, StorageError, StorageResult};
use hvs_worker::PipelineContext;
use image::{Rgb, RgbImage};

pub const WIDTH: u32 = 64;
pub const HEIGHT: u32 = 64;

/// Frame `i` carries `i` in the first pixel so order can be checked downstream.
pub fn marker(image: &RgbImage) -> u64 {
    let p = image.get_pixel(0, 0);
    p[0] as u64 | (p[1] as u64) << 8
}

fn synthetic_frame(index: u64) -> Frame {
    let mut image = RgbImage::from_pixel(WIDTH, HEIGHT, Rgb([40, 40, 40]));
    image.put_pixel(0, 0, Rgb([(index & 0xFF) as u8, ((index >> 8) & 0xFF) as u8, 0]));
    Frame::new(index, image)
}

pub fn tracked(track_id: u32, label: &str, bbox: PixelBox) -> Detection {
    Detection {
        track_id: Some(TrackId(track_id)),
        label: label.to_string(),
        bbox,
        confidence: 0.9,
    }
}

pub fn untracked(label: &str, bbox: PixelBox) -> Detection {
    Detection {
        track_id: None,
        label: label.to_string(),
        bbox,
        confidence: 0.9,
    }
}

// ---------------------------------------------------------------------------
// Media
// ---------------------------------------------------------------------------

pub struct SyntheticSource {
    info: VideoInfo,
    frames: u64,
    next: u64,
    delay: Option<Duration>,
    closed: Arc<AtomicUsize>,
}

#[async_trait]
impl FrameSource for SyntheticSource {
    fn info(&self) -> &VideoInfo {
        &self.info
    }

    async fn next_frame(&mut self) -> MediaResult<Option<Frame>> {
        if self.next >= self.frames {
            return Ok(None);
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let frame = synthetic_frame(self.next);
        self.next += 1;
        Ok(Some(frame))
    }

    async fn close(&mut self) -> MediaResult<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Everything one sink received.
#[derive(Default)]
pub struct SinkRecord {
    pub path: PathBuf,
    pub frames: Vec<RgbImage>,
    pub finished: bool,
}

pub struct RecordingSink {
    record: Arc<Mutex<SinkRecord>>,
}

#[async_trait]
impl FrameSink for RecordingSink {
    async fn write_frame(&mut self, image: &RgbImage) -> MediaResult<()> {
        let mut record = self.record.lock().unwrap();
        if record.finished {
            return Err(MediaError::SinkClosed);
        }
        record.frames.push(image.clone());
        Ok(())
    }

    async fn finish(&mut self) -> MediaResult<()> {
        self.record.lock().unwrap().finished = true;
        Ok(())
    }
}

/// Serves synthetic videos of a fixed length and records every sink.
pub struct FakeMedia {
    pub frames: u64,
    pub delay: Option<Duration>,
    pub opened: AtomicUsize,
    pub closed: Arc<AtomicUsize>,
    pub sinks: Mutex<Vec<Arc<Mutex<SinkRecord>>>>,
}

impl FakeMedia {
    pub fn new(frames: u64) -> Self {
        Self {
            frames,
            delay: None,
            opened: AtomicUsize::new(0),
            closed: Arc::new(AtomicUsize::new(0)),
            sinks: Mutex::new(Vec::new()),
        }
    }

    pub fn slow(frames: u64, delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new(frames)
        }
    }

    pub fn sink(&self, index: usize) -> Arc<Mutex<SinkRecord>> {
        Arc::clone(&self.sinks.lock().unwrap()[index])
    }

    pub fn sink_for(&self, file_name: &str) -> Option<Arc<Mutex<SinkRecord>>> {
        self.sinks
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.lock().unwrap().path.file_name().and_then(|n| n.to_str()) == Some(file_name))
            .cloned()
    }
}

#[async_trait]
impl MediaBackend for FakeMedia {
    async fn open_source(&self, _path: &Path) -> MediaResult<Box<dyn FrameSource>> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(SyntheticSource {
            info: VideoInfo::new(WIDTH, HEIGHT, 25.0),
            frames: self.frames,
            next: 0,
            delay: self.delay,
            closed: Arc::clone(&self.closed),
        }))
    }

    async fn create_sink(&self, path: &Path, _info: &VideoInfo) -> MediaResult<Box<dyn FrameSink>> {
        let record = Arc::new(Mutex::new(SinkRecord {
            path: path.to_path_buf(),
            ..SinkRecord::default()
        }));
        self.sinks.lock().unwrap().push(Arc::clone(&record));
        Ok(Box::new(RecordingSink { record }))
    }
}

// ---------------------------------------------------------------------------
// Tracker
// ---------------------------------------------------------------------------

pub type Script = Arc<dyn Fn(u64) -> Vec<Detection> + Send + Sync>;

/// Returns scripted detections per frame index; the annotated frame is the
/// input frame unchanged.
pub struct ScriptedTracker {
    script: Script,
    fail_at: Option<u64>,
    closed: Arc<AtomicUsize>,
}

#[async_trait]
impl TrackingDetector for ScriptedTracker {
    async fn track(&mut self, frame: &Frame) -> MediaResult<TrackedFrame> {
        if self.fail_at == Some(frame.index) {
            return Err(MediaError::detection_failed(format!("inference crashed on frame {}", frame.index)));
        }
        Ok(TrackedFrame {
            detections: (self.script)(frame.index),
            annotated: frame.image.clone(),
        })
    }

    async fn close(&mut self) -> MediaResult<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

pub struct ScriptedTrackers {
    pub script: Script,
    pub fail_at: Option<u64>,
    pub sessions: AtomicUsize,
    pub closed: Arc<AtomicUsize>,
}

impl ScriptedTrackers {
    pub fn new(script: impl Fn(u64) -> Vec<Detection> + Send + Sync + 'static) -> Self {
        Self {
            script: Arc::new(script),
            fail_at: None,
            sessions: AtomicUsize::new(0),
            closed: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing_at(mut self, frame: u64) -> Self {
        self.fail_at = Some(frame);
        self
    }
}

impl TrackerProvider for ScriptedTrackers {
    fn open_session(&self, _video: &VideoName) -> Box<dyn TrackingDetector> {
        self.sessions.fetch_add(1, Ordering::SeqCst);
        Box::new(ScriptedTracker {
            script: Arc::clone(&self.script),
            fail_at: self.fail_at,
            closed: Arc::clone(&self.closed),
        })
    }
}

// ---------------------------------------------------------------------------
// Stores
// ---------------------------------------------------------------------------

/// Repository whose writes always fail.
#[derive(Default)]
pub struct FailingRepository {
    pub attempts: AtomicUsize,
}

#[async_trait]
impl ViolationRepository for FailingRepository {
    async fn init(&self) -> RecordsResult<()> {
        Ok(())
    }

    async fn insert(&self, _row: NewViolation) -> RecordsResult<StoredViolation> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(RecordsError::unavailable("database is down"))
    }

    async fn list_recent(&self, _limit: usize) -> RecordsResult<Vec<StoredViolation>> {
        Ok(Vec::new())
    }

    async fn clear(&self) -> RecordsResult<()> {
        Ok(())
    }
}

/// Artifact store whose writes always fail.
pub struct FailingArtifacts;

#[async_trait]
impl ArtifactStore for FailingArtifacts {
    async fn init(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn put(&self, key: &str, _data: Vec<u8>, _content_type: &str) -> StorageResult<String> {
        Err(StorageError::write_failed(format!("disk full writing {}", key)))
    }

    async fn get(&self, key: &str) -> StorageResult<Vec<u8>> {
        Err(StorageError::not_found(key))
    }

    async fn exists(&self, _key: &str) -> StorageResult<bool> {
        Ok(false)
    }

    async fn delete_all(&self) -> StorageResult<usize> {
        Ok(0)
    }
}

/// Fakes plus real local stores rooted in a temp dir.
pub struct Harness {
    pub dir: tempfile::TempDir,
    pub media: Arc<FakeMedia>,
    pub trackers: Arc<ScriptedTrackers>,
    pub repository: Arc<InMemoryViolationRepository>,
}

impl Harness {
    pub fn new(media: FakeMedia, trackers: ScriptedTrackers) -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
            media: Arc::new(media),
            trackers: Arc::new(trackers),
            repository: Arc::new(InMemoryViolationRepository::new()),
        }
    }

    pub fn violations_dir(&self) -> PathBuf {
        self.dir.path().join("violations_frames")
    }

    pub fn outputs_dir(&self) -> PathBuf {
        self.dir.path().join("outputs")
    }

    pub fn context(&self) -> PipelineContext {
        PipelineContext {
            media: self.media.clone(),
            trackers: self.trackers.clone(),
            artifacts: Arc::new(LocalArtifactStore::new(self.violations_dir())),
            repository: self.repository.clone(),
        }
    }

    pub async fn init(&self) {
        tokio::fs::create_dir_all(self.violations_dir()).await.unwrap();
        tokio::fs::create_dir_all(self.outputs_dir()).await.unwrap();
    }
}

/// Track 7 alternates helmet / no-helmet for 20 frames, then shows no helmet.
pub fn alternating_then_no_helmet(frame: u64) -> Vec<Detection> {
    let label = if frame < 20 && frame % 2 == 0 { "Helmet" } else { "No-Helmet" };
    vec![tracked(7, label, PixelBox::new(10, 10, 40, 50))]
}
