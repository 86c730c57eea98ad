use std::{net::SocketAddr, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use glob::glob;
use tracing::warn;

/// Configuración del coordinator: flags de línea de comandos con fallback a env vars.
#[derive(Debug, Clone, Parser)]
#[command(name = "coordinator")]
#[command(about = "Coordinator map/reduce: reparte tareas a los workers y detecta los caídos")]
pub struct CoordinatorConfig {
    /// Archivos de entrada o patrones glob (ej: "data/pg-*.txt")
    #[arg(value_name = "INPUTS", required = true)]
    pub inputs: Vec<String>,

    /// Cantidad de particiones de reduce
    #[arg(long, env = "MR_N_REDUCE", default_value_t = 10,
          value_parser = clap::value_parser!(u32).range(1..))]
    pub n_reduce: u32,

    /// Segundos sin reporte tras los cuales una tarea se reentrega
    #[arg(long, env = "MR_TASK_TIMEOUT_SECS", default_value_t = 10)]
    pub timeout_secs: u64,

    /// Dirección donde escucha el servidor HTTP
    #[arg(long, env = "COORDINATOR_ADDR", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Segundos que se sigue atendiendo después de terminar, para que los
    /// workers se enteren de que el job terminó
    #[arg(long, env = "MR_SHUTDOWN_GRACE_SECS", default_value_t = 3)]
    pub shutdown_grace_secs: u64,
}

impl CoordinatorConfig {
    pub fn task_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    /// Expande los patrones de entrada a la lista de archivos del job.
    pub fn input_files(&self) -> Result<Vec<String>> {
        expand_inputs(&self.inputs)
    }
}

/// Expande cada patrón con glob, en orden y sin repetidos.
/// Un patrón sin coincidencias se deja tal cual (el worker fallará al leerlo).
pub fn expand_inputs(patterns: &[String]) -> Result<Vec<String>> {
    let mut out: Vec<String> = Vec::new();

    for pattern in patterns {
        let mut matched = false;
        let entries = glob(pattern).with_context(|| format!("patrón de entrada inválido: {pattern}"))?;

        for entry in entries {
            match entry {
                Ok(path) if path.is_file() => {
                    matched = true;
                    let p = path.to_string_lossy().to_string();
                    if !out.contains(&p) {
                        out.push(p);
                    }
                }
                Ok(_) => {}
                Err(e) => warn!("no se pudo leer {}: {}", e.path().display(), e.error()),
            }
        }

        if !matched {
            warn!("{} no coincide con ningún archivo, se usa literal", pattern);
            if !out.contains(pattern) {
                out.push(pattern.clone());
            }
        }
    }

    Ok(out)
}
