use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use coordinator::{build_router, config::CoordinatorConfig, AppState};

const DONE_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("coordinator=debug,tower_http=info")),
        )
        .init();

    let config = CoordinatorConfig::parse();
    let files = config.input_files()?;

    info!(
        "job con {} archivos de entrada, n_reduce={}, timeout={}s",
        files.len(),
        config.n_reduce,
        config.timeout_secs
    );

    let state = AppState::new(files, config.n_reduce, config.task_timeout());
    let app = build_router(state.clone());

    let listener = TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("no se pudo escuchar en {}", config.listen))?;
    info!("coordinator escuchando en {}", listener.local_addr()?);

    let grace = config.shutdown_grace();
    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_job(state, grace))
        .await
        .context("error en el servidor HTTP")?;

    info!("coordinator terminado");
    Ok(())
}

/// Espera a que el job termine (o a Ctrl-C) y deja un margen para que los
/// workers que siguen preguntando reciban `done = true`.
async fn wait_for_job(state: AppState, grace: Duration) {
    let job_done = async {
        while !state.is_done() {
            tokio::time::sleep(DONE_POLL_INTERVAL).await;
        }
        info!("job terminado, apagando en {:?}", grace);
        tokio::time::sleep(grace).await;
    };

    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("no se pudo escuchar Ctrl-C: {}", e);
            // sin señal, solo queda esperar al job
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        _ = job_done => {}
        _ = ctrl_c => warn!("Ctrl-C recibido, apagando sin terminar el job"),
    }
}
