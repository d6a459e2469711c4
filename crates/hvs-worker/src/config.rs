//! Worker configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use hvs_media::DetectorOptions;

use crate::error::{WorkerError, WorkerResult};

/// Violation decision thresholds, fixed for the lifetime of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregatorConfig {
    /// Minimum classified observations before a track can be confirmed
    pub min_track_total: u64,
    /// No-helmet share that must be strictly exceeded
    pub violator_ratio: f64,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            min_track_total: 30,
            violator_ratio: 0.8,
        }
    }
}

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Where input videos are kept
    pub videos_dir: PathBuf,
    /// Where annotated videos are written
    pub outputs_dir: PathBuf,
    /// Where evidence crops are written
    pub violations_dir: PathBuf,
    /// JSON-lines violations file
    pub records_path: PathBuf,
    /// Tracking service base URL
    pub tracker_url: String,
    /// Model identifier forwarded to the tracker
    pub model_name: String,
    pub confidence_threshold: f32,
    pub inference_resolution: u32,
    pub min_track_total: u64,
    pub violator_ratio: f64,
    /// Maximum videos analysed at once
    pub max_concurrent_jobs: usize,
    /// Per-video timeout
    pub job_timeout: Duration,
    /// Rows returned by the recent-violations listing
    pub recent_limit: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            videos_dir: PathBuf::from("videos"),
            outputs_dir: PathBuf::from("outputs"),
            violations_dir: PathBuf::from("violations_frames"),
            records_path: PathBuf::from("violations.jsonl"),
            tracker_url: "http://localhost:9000".to_string(),
            model_name: "best.pt".to_string(),
            confidence_threshold: 0.5,
            inference_resolution: 1280,
            min_track_total: 30,
            violator_ratio: 0.8,
            max_concurrent_jobs: 2,
            job_timeout: Duration::from_secs(3600), // 1 hour
            recent_limit: 50,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary variable lookup; unset or unparsable
    /// values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            videos_dir: lookup("HVS_VIDEOS_DIR").map(PathBuf::from).unwrap_or(defaults.videos_dir),
            outputs_dir: lookup("HVS_OUTPUTS_DIR").map(PathBuf::from).unwrap_or(defaults.outputs_dir),
            violations_dir: lookup("HVS_VIOLATIONS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.violations_dir),
            records_path: lookup("HVS_RECORDS_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.records_path),
            tracker_url: lookup("HVS_TRACKER_URL").unwrap_or(defaults.tracker_url),
            model_name: lookup("HVS_MODEL").unwrap_or(defaults.model_name),
            confidence_threshold: parse_or(lookup("HVS_CONF_THRESHOLD"), defaults.confidence_threshold),
            inference_resolution: parse_var(lookup("HVS_IMG_SIZE")).unwrap_or(defaults.inference_resolution),
            min_track_total: parse_var(lookup("HVS_MIN_TRACK_TOTAL")).unwrap_or(defaults.min_track_total),
            violator_ratio: parse_or(lookup("HVS_VIOLATOR_RATIO"), defaults.violator_ratio),
            max_concurrent_jobs: parse_var(lookup("HVS_MAX_JOBS")).unwrap_or(defaults.max_concurrent_jobs),
            job_timeout: parse_var(lookup("HVS_JOB_TIMEOUT_SECS"))
                .map(Duration::from_secs)
                .unwrap_or(defaults.job_timeout),
            recent_limit: parse_var(lookup("HVS_RECENT_LIMIT")).unwrap_or(defaults.recent_limit),
        }
    }

    /// Reject settings the analysis cannot run with.
    pub fn validate(&self) -> WorkerResult<()> {
        if self.min_track_total == 0 {
            return Err(WorkerError::config_error("HVS_MIN_TRACK_TOTAL must be positive"));
        }
        if !(self.violator_ratio > 0.0 && self.violator_ratio < 1.0) {
            return Err(WorkerError::config_error(format!(
                "HVS_VIOLATOR_RATIO must be in (0, 1), got {}",
                self.violator_ratio
            )));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(WorkerError::config_error(format!(
                "HVS_CONF_THRESHOLD must be in [0, 1], got {}",
                self.confidence_threshold
            )));
        }
        if self.inference_resolution == 0 {
            return Err(WorkerError::config_error("HVS_IMG_SIZE must be positive"));
        }
        if self.max_concurrent_jobs == 0 {
            return Err(WorkerError::config_error("HVS_MAX_JOBS must be positive"));
        }
        Ok(())
    }

    pub fn aggregator(&self) -> AggregatorConfig {
        AggregatorConfig {
            min_track_total: self.min_track_total,
            violator_ratio: self.violator_ratio,
        }
    }

    pub fn detector_options(&self) -> DetectorOptions {
        DetectorOptions {
            model_name: self.model_name.clone(),
            confidence_threshold: self.confidence_threshold,
            inference_resolution: self.inference_resolution,
        }
    }
}

fn parse_var<T: FromStr>(raw: Option<String>) -> Option<T> {
    raw.and_then(|s| s.trim().parse().ok())
}

// Floats reject NaN so a bad value never slips past validation.
fn parse_or<T>(raw: Option<String>, default: T) -> T
where
    T: FromStr + Into<f64> + Copy,
{
    parse_var::<T>(raw)
        .filter(|v| !Into::<f64>::into(*v).is_nan())
        .unwrap_or(default)
}
