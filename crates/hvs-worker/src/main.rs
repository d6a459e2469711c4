//! Helmet violation worker binary.
//!
//! ```text
//! hvs-worker analyze <video>...   analyse videos, print one report per video
//! hvs-worker list                 print the most recent violations
//! hvs-worker clear                wipe records, evidence, outputs and inputs
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use hvs_worker::{HistoryService, JobExecutor, PipelineContext, WorkerConfig};

const USAGE: &str = "usage: hvs-worker <analyze <video>... | list | clear>";

#[derive(Serialize)]
struct AnalyzeFailure {
    video: String,
    error: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables
    dotenvy::dotenv().ok();
    init_tracing();

    match run(std::env::args().skip(1).collect()).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    // Colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let mut env_filter = EnvFilter::from_default_env();
    for directive in ["hvs=info", "hvs_worker=info"] {
        if let Ok(directive) = directive.parse::<Directive>() {
            env_filter = env_filter.add_directive(directive);
        }
    }

    // Logs go to stderr; stdout carries the JSON results.
    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

async fn run(args: Vec<String>) -> anyhow::Result<ExitCode> {
    let Some((command, rest)) = args.split_first() else {
        eprintln!("{}", USAGE);
        return Ok(ExitCode::from(2));
    };

    let config = WorkerConfig::from_env();
    config.validate()?;
    info!("Worker config: {:?}", config);

    if let Ok(addr) = std::env::var("METRICS_ADDR") {
        let addr = addr
            .parse::<SocketAddr>()
            .with_context(|| format!("invalid METRICS_ADDR {}", addr))?;
        hvs_worker::metrics::install_exporter(addr)?;
        info!("Prometheus exporter listening on {}", addr);
    }

    let ctx = PipelineContext::from_config(&config)?;
    ctx.init(&config).await?;

    match command.as_str() {
        "analyze" => analyze(&config, ctx, rest).await,
        "list" => {
            let history = HistoryService::new(ctx.repository.clone(), &config);
            print_json(&history.recent().await?)?;
            Ok(ExitCode::SUCCESS)
        }
        "clear" => {
            let history = HistoryService::new(ctx.repository.clone(), &config);
            print_json(&history.clear().await?)?;
            Ok(ExitCode::SUCCESS)
        }
        other => {
            eprintln!("unknown command '{}'\n{}", other, USAGE);
            Ok(ExitCode::from(2))
        }
    }
}

async fn analyze(config: &WorkerConfig, ctx: PipelineContext, videos: &[String]) -> anyhow::Result<ExitCode> {
    if videos.is_empty() {
        eprintln!("{}", USAGE);
        return Ok(ExitCode::from(2));
    }

    let paths: Vec<PathBuf> = videos
        .iter()
        .map(|v| resolve_video(&config.videos_dir, v))
        .collect();

    let executor = JobExecutor::new(config, ctx);
    let mut failed = false;
    for outcome in executor.analyze_all(paths).await {
        match outcome.result {
            Ok(report) => print_json(&report)?,
            Err(e) => {
                failed = true;
                print_json(&AnalyzeFailure {
                    video: outcome.video.display().to_string(),
                    error: e.to_string(),
                })?;
            }
        }
    }

    Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

/// Bare names that do not exist as given are looked up in the videos directory.
fn resolve_video(videos_dir: &Path, arg: &str) -> PathBuf {
    let direct = PathBuf::from(arg);
    if direct.exists() {
        return direct;
    }
    let in_dir = videos_dir.join(arg);
    if in_dir.exists() {
        in_dir
    } else {
        direct
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
