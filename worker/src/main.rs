use anyhow::Result;
use clap::Parser;
use common::app_by_name;
use tracing_subscriber::EnvFilter;

use worker::WorkerConfig;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("worker=debug,common=info,reqwest=info")),
        )
        .init();

    let config = WorkerConfig::parse();
    let app = app_by_name(&config.app)?;

    worker::run(config, app).await?;
    Ok(())
}
