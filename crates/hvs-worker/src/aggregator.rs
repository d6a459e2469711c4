//! Per-track violation decisions.
//!
//! The aggregator consumes one classification event per tracked detection,
//! keeps running helmet / no-helmet counts per track and confirms a track as
//! a violator the first time both conditions hold:
//!
//! - `helmet + no_helmet >= min_track_total`
//! - `no_helmet / (helmet + no_helmet) > violator_ratio`
//!
//! A track is confirmed at most once. State lives for one video only.

use std::collections::HashMap;

use hvs_media::extract_crop;
use hvs_models::{HelmetClass, PixelBox, TrackId, VideoName, ViolationRecord};
use image::RgbImage;

use crate::config::AggregatorConfig;

/// Running statistics of one track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackStats {
    pub track_id: TrackId,
    pub helmet_count: u64,
    pub no_helmet_count: u64,
    pub is_confirmed_violator: bool,
}

impl TrackStats {
    fn new(track_id: TrackId) -> Self {
        Self {
            track_id,
            helmet_count: 0,
            no_helmet_count: 0,
            is_confirmed_violator: false,
        }
    }

    pub fn total(&self) -> u64 {
        self.helmet_count + self.no_helmet_count
    }

    /// No-helmet share of the classified observations, 0 when there are none.
    pub fn no_helmet_ratio(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.no_helmet_count as f64 / total as f64,
        }
    }
}

/// A track crossing the violation threshold on a given frame.
#[derive(Debug, Clone)]
pub struct Confirmation {
    pub video_name: VideoName,
    pub track_id: TrackId,
    pub frame_idx: u64,
    /// Detection box with negative coordinates clamped to zero
    pub bbox: PixelBox,
    pub no_helmet_ratio: f64,
    /// Evidence crop, `None` when the box covers nothing of the frame
    pub crop: Option<RgbImage>,
}

impl Confirmation {
    /// Final record once the evidence crop has (or has not) been stored.
    pub fn into_record(self, evidence_image: Option<String>) -> ViolationRecord {
        ViolationRecord {
            video_name: self.video_name,
            track_id: self.track_id,
            frame_idx: self.frame_idx,
            bbox: self.bbox,
            no_helmet_ratio: self.no_helmet_ratio,
            evidence_image,
        }
    }
}

/// Violation state machine for one video.
#[derive(Debug)]
pub struct TrackAggregator {
    video_name: VideoName,
    config: AggregatorConfig,
    tracks: HashMap<TrackId, TrackStats>,
}

impl TrackAggregator {
    pub fn new(video_name: VideoName, config: AggregatorConfig) -> Self {
        Self {
            video_name,
            config,
            tracks: HashMap::new(),
        }
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Count one classified event for `track_id`.
    ///
    /// Returns the triggering ratio when this event confirms the track.
    /// Ignored classes change nothing and never confirm.
    pub fn record(&mut self, track_id: TrackId, class: HelmetClass) -> Option<f64> {
        if !class.is_counted() {
            return None;
        }

        let stats = self
            .tracks
            .entry(track_id)
            .or_insert_with(|| TrackStats::new(track_id));
        match class {
            HelmetClass::Helmet => stats.helmet_count += 1,
            HelmetClass::NoHelmet => stats.no_helmet_count += 1,
            HelmetClass::Ignored => {}
        }

        if stats.is_confirmed_violator || stats.total() < self.config.min_track_total {
            return None;
        }
        let ratio = stats.no_helmet_ratio();
        if ratio > self.config.violator_ratio {
            stats.is_confirmed_violator = true;
            Some(ratio)
        } else {
            None
        }
    }

    /// Feed one tracked detection of frame `frame_idx`.
    ///
    /// On confirmation the evidence crop is cut from `frame` using the box
    /// clamped to the frame.
    pub fn observe(
        &mut self,
        track_id: TrackId,
        label: &str,
        bbox: PixelBox,
        frame_idx: u64,
        frame: &RgbImage,
    ) -> Option<Confirmation> {
        let ratio = self.record(track_id, HelmetClass::from_label(label))?;
        let bbox = bbox.clamp_non_negative();

        Some(Confirmation {
            video_name: self.video_name.clone(),
            track_id,
            frame_idx,
            bbox,
            no_helmet_ratio: ratio,
            crop: extract_crop(frame, &bbox),
        })
    }

    pub fn stats(&self, track_id: TrackId) -> Option<&TrackStats> {
        self.tracks.get(&track_id)
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn confirmed_count(&self) -> usize {
        self.tracks.values().filter(|s| s.is_confirmed_violator).count()
    }
}
