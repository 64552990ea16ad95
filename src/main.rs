use anyhow::Result;
use clap::Parser;
use openaddresses_s3::{store::S3Store, Publisher, SourceConfig, DEFAULT_BASE_REMOTE_PATH};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

/// Convert OpenAddresses CSVs to line-delimited GeoJSON and upload them to S3.
#[derive(Parser, Debug)]
struct Args {
    /// Base directory of an OpenAddresses download, or a single source CSV inside it
    path: PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let args = Args::parse();

    if let Err(e) = run(&args).await {
        error!(path = %args.path.display(), "publish failed: {:#}", e);
        return Err(e);
    }
    Ok(())
}

async fn run(args: &Args) -> Result<()> {
    // ─── 2) load source layout ───────────────────────────────────────
    let config = SourceConfig::bundled()?;
    info!(sources = config.sources().len(), "loaded source config");

    // ─── 3) convert + upload ─────────────────────────────────────────
    let publisher = Publisher::new(S3Store::from_env().await, config);
    let reports = publisher.publish(&args.path, DEFAULT_BASE_REMOTE_PATH).await?;

    let features: u64 = reports.iter().map(|r| r.stats.features).sum();
    info!(files = reports.len(), features, "all done");
    Ok(())
}
