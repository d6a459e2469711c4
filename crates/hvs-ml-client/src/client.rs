//! HTTP client for the detection and tracking service.
//!
//! The service runs the detector with persistent tracker state per session.
//! Each frame is sent as a base64 JPEG together with the session id; the
//! response lists detections with their track ids. The annotated frame is
//! drawn locally from those detections.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use hvs_media::{
    annotate_frame, encode_jpeg, Detection, DetectorOptions, Frame, MediaError, MediaResult,
    TrackedFrame, TrackerProvider, TrackingDetector,
};
use hvs_models::{PixelBox, TrackId, VideoName};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{MlClientError, MlClientResult};

/// JPEG quality for frames sent to the service.
const FRAME_JPEG_QUALITY: u8 = 95;

/// Tracking client configuration.
#[derive(Debug, Clone)]
pub struct TrackerClientConfig {
    /// Service base URL, without trailing slash
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Options forwarded with every frame
    pub options: DetectorOptions,
}

impl TrackerClientConfig {
    pub fn new(base_url: impl Into<String>, options: DetectorOptions) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(30),
            options,
        }
    }
}

#[derive(Debug, Serialize)]
struct TrackRequest<'a> {
    session_id: &'a str,
    frame_idx: u64,
    /// Base64 JPEG
    image: String,
    model: &'a str,
    conf: f32,
    imgsz: u32,
}

#[derive(Debug, Deserialize)]
struct TrackResponse {
    #[serde(default)]
    detections: Vec<WireDetection>,
}

#[derive(Debug, Deserialize)]
struct WireDetection {
    #[serde(default)]
    track_id: Option<u32>,
    label: String,
    xyxy: [f32; 4],
    #[serde(default)]
    confidence: f32,
}

impl From<WireDetection> for Detection {
    fn from(wire: WireDetection) -> Self {
        Detection {
            track_id: wire.track_id.map(TrackId),
            label: wire.label,
            bbox: PixelBox::from_xyxy(wire.xyxy),
            confidence: wire.confidence,
        }
    }
}

/// Client for the tracking service.
#[derive(Clone)]
pub struct TrackerClient {
    http: Client,
    config: TrackerClientConfig,
}

impl TrackerClient {
    pub fn new(config: TrackerClientConfig) -> MlClientResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(5))
            .user_agent(concat!("hvs-ml-client/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, config })
    }

    pub fn options(&self) -> &DetectorOptions {
        &self.config.options
    }

    /// Check that the service answers its health endpoint.
    pub async fn health(&self) -> MlClientResult<()> {
        let url = format!("{}/health", self.config.base_url);
        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MlClientError::service(status.as_u16(), body));
        }
        Ok(())
    }

    /// Run detection + tracking on one frame of a session.
    pub async fn track_frame(&self, session_id: &str, frame: &Frame) -> MlClientResult<Vec<Detection>> {
        let jpeg = encode_jpeg(&frame.image, FRAME_JPEG_QUALITY)?;
        let options = &self.config.options;
        let request = TrackRequest {
            session_id,
            frame_idx: frame.index,
            image: base64::engine::general_purpose::STANDARD.encode(jpeg),
            model: &options.model_name,
            conf: options.confidence_threshold,
            imgsz: options.inference_resolution,
        };

        let url = format!("{}/v1/track", self.config.base_url);
        let response = self.http.post(&url).json(&request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MlClientError::service(status.as_u16(), body));
        }

        let body = response.bytes().await?;
        let parsed: TrackResponse = serde_json::from_slice(&body)
            .map_err(|e| MlClientError::invalid_response(format!("track response: {}", e)))?;

        debug!(
            session_id,
            frame = frame.index,
            detections = parsed.detections.len(),
            "Frame tracked"
        );

        Ok(parsed.detections.into_iter().map(Detection::from).collect())
    }

    /// Drop the service-side tracker state of a session.
    pub async fn close_session(&self, session_id: &str) -> MlClientResult<()> {
        let url = format!("{}/v1/sessions/{}", self.config.base_url, session_id);
        let response = self.http.delete(&url).send().await?;
        let status = response.status();
        if !status.is_success() && status.as_u16() != 404 {
            let body = response.text().await.unwrap_or_default();
            return Err(MlClientError::service(status.as_u16(), body));
        }
        Ok(())
    }
}

impl TrackerProvider for TrackerClient {
    fn open_session(&self, video: &VideoName) -> Box<dyn TrackingDetector> {
        let session_id = Uuid::new_v4().to_string();
        info!(video = %video, session_id = %session_id, "Opening tracker session");
        Box::new(RemoteTrackingSession {
            client: self.clone(),
            session_id,
            closed: false,
        })
    }
}

/// One video's tracker session on the remote service.
pub struct RemoteTrackingSession {
    client: TrackerClient,
    session_id: String,
    closed: bool,
}

impl RemoteTrackingSession {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

#[async_trait]
impl TrackingDetector for RemoteTrackingSession {
    async fn track(&mut self, frame: &Frame) -> MediaResult<TrackedFrame> {
        let detections = self
            .client
            .track_frame(&self.session_id, frame)
            .await
            .map_err(|e| MediaError::detection_failed(format!("frame {}: {}", frame.index, e)))?;
        let annotated = annotate_frame(&frame.image, &detections);
        Ok(TrackedFrame {
            detections,
            annotated,
        })
    }

    async fn close(&mut self) -> MediaResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        if let Err(e) = self.client.close_session(&self.session_id).await {
            warn!(session_id = %self.session_id, error = %e, "Failed to close tracker session");
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "remote-tracker"
    }
}
