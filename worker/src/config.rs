use std::{path::PathBuf, time::Duration};

use clap::Parser;

/// Configuración del worker. Cada flag tiene su env var equivalente, así el
/// mismo binario sirve en Docker y en local.
#[derive(Debug, Clone, Parser)]
#[command(name = "worker")]
#[command(about = "Worker map/reduce: pide tareas al coordinator hasta que el job termina")]
pub struct WorkerConfig {
    /// URL base del coordinator
    #[arg(long, env = "COORDINATOR_URL", default_value = "http://localhost:8080")]
    pub coordinator_url: String,

    /// Aplicación map/reduce a ejecutar (wc, indexer)
    #[arg(long, env = "MR_APP", default_value = "wc")]
    pub app: String,

    /// Directorio para los archivos intermedios mr-X-Y
    #[arg(long, env = "MR_WORK_DIR", default_value = ".")]
    pub work_dir: PathBuf,

    /// Directorio para las salidas mr-out-N
    #[arg(long, env = "MR_OUTPUT_DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Espera entre pedidos cuando no hay tareas
    #[arg(long, env = "MR_POLL_INTERVAL_MS", default_value_t = 1000)]
    pub poll_interval_ms: u64,

    /// Timeout de cada llamada al coordinator
    #[arg(long, env = "MR_RPC_TIMEOUT_MS", default_value_t = 1000)]
    pub rpc_timeout_ms: u64,
}

impl WorkerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_timeout_ms)
    }
}
