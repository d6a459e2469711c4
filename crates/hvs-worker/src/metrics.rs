//! Prometheus metrics for the worker.

use std::net::SocketAddr;

use metrics::counter;
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::{WorkerError, WorkerResult};

/// Metric name constants.
pub mod names {
    pub const FRAMES_PROCESSED_TOTAL: &str = "hvs_frames_processed_total";
    pub const VIOLATIONS_CONFIRMED_TOTAL: &str = "hvs_violations_confirmed_total";
    pub const VIOLATION_PERSIST_FAILURES_TOTAL: &str = "hvs_violation_persist_failures_total";
    pub const EVIDENCE_WRITE_FAILURES_TOTAL: &str = "hvs_evidence_write_failures_total";
    pub const JOBS_TOTAL: &str = "hvs_jobs_total";
}

/// Install the Prometheus recorder with an HTTP scrape listener.
pub fn install_exporter(addr: SocketAddr) -> WorkerResult<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| WorkerError::config_error(format!("metrics exporter: {}", e)))
}

pub fn record_frames(count: u64) {
    counter!(names::FRAMES_PROCESSED_TOTAL).increment(count);
}

pub fn record_violation() {
    counter!(names::VIOLATIONS_CONFIRMED_TOTAL).increment(1);
}

pub fn record_persist_failure() {
    counter!(names::VIOLATION_PERSIST_FAILURES_TOTAL).increment(1);
}

pub fn record_evidence_failure() {
    counter!(names::EVIDENCE_WRITE_FAILURES_TOTAL).increment(1);
}

pub fn record_job(outcome: &'static str) {
    counter!(names::JOBS_TOTAL, "outcome" => outcome).increment(1);
}
