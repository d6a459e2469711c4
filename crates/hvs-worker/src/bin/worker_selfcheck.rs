use std::path::Path;
use std::process::Command;

use hvs_ml_client::{TrackerClient, TrackerClientConfig};
use hvs_worker::WorkerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = WorkerConfig::from_env();
    config.validate()?;

    println!(
        "worker-selfcheck: starting with videos_dir={} outputs_dir={} violations_dir={}",
        config.videos_dir.display(),
        config.outputs_dir.display(),
        config.violations_dir.display()
    );
    for dir in [&config.videos_dir, &config.outputs_dir, &config.violations_dir] {
        ensure_dir(dir).await?;
    }
    ensure_tool("ffmpeg")?;
    ensure_tool("ffprobe")?;
    ensure_tracker(&config).await?;

    println!("worker-selfcheck: ok");
    Ok(())
}

async fn ensure_dir<P: AsRef<Path>>(path: P) -> anyhow::Result<()> {
    let path = path.as_ref();
    tokio::fs::create_dir_all(path).await?;
    Ok(())
}

fn ensure_tool(name: &str) -> anyhow::Result<()> {
    let output = Command::new(name)
        .arg("-version")
        .output()
        .map_err(|e| anyhow::anyhow!("{} not available: {}", name, e))?;

    if !output.status.success() {
        return Err(anyhow::anyhow!("{} -version failed: {:?}", name, output.status));
    }
    Ok(())
}

async fn ensure_tracker(config: &WorkerConfig) -> anyhow::Result<()> {
    let client = TrackerClient::new(TrackerClientConfig::new(
        config.tracker_url.clone(),
        config.detector_options(),
    ))?;
    client
        .health()
        .await
        .map_err(|e| anyhow::anyhow!("tracker at {} not reachable: {}", config.tracker_url, e))?;
    Ok(())
}
