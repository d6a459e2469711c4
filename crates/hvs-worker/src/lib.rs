//! Helmet violation analysis worker.
//!
//! This crate provides:
//! - The per-track violation aggregator
//! - The per-video pipeline tying frames, tracker, aggregator and stores together
//! - A bounded-concurrency executor for several videos
//! - History listing and clearing
//! - Configuration, job logging and metrics

pub mod aggregator;
pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod history;
pub mod logging;
pub mod metrics;
pub mod pipeline;

pub use aggregator::{Confirmation, TrackAggregator, TrackStats};
pub use config::{AggregatorConfig, WorkerConfig};
pub use context::PipelineContext;
pub use error::{WorkerError, WorkerResult};
pub use executor::{JobExecutor, JobOutcome};
pub use history::{ClearSummary, HistoryService};
pub use logging::JobLogger;
pub use pipeline::{PipelineOutput, VideoPipeline};
