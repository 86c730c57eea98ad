use std::time::Duration;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use common::JobStatusResponse;
use reqwest::Client;

#[derive(Parser)]
#[command(name = "client")]
#[command(about = "CLI simple para consultar al coordinator")]
struct Cli {
    /// URL base del coordinator
    #[arg(long, env = "COORDINATOR_URL", default_value = "http://localhost:8080")]
    coordinator_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Muestra el estado del job
    Status,
    /// Espera hasta que el job termine
    Wait {
        /// Segundos entre consultas
        #[arg(long, default_value_t = 1)]
        interval_secs: u64,
    },
}

async fn fetch_status(client: &Client, base_url: &str) -> Result<JobStatusResponse> {
    let url = format!("{}/api/v1/job", base_url);
    let resp = client.get(&url).send().await?;
    if !resp.status().is_success() {
        bail!("error consultando {} (status {})", url, resp.status());
    }
    Ok(resp.json().await?)
}

fn print_status(job: &JobStatusResponse) {
    println!("Job:");
    println!("  fase: {}", job.phase());
    println!("  terminado: {}", job.done);
    println!("  n_reduce: {}", job.n_reduce);
    println!(
        "  maps: total={}, pendientes={}, en curso={}",
        job.total_map_tasks, job.map_remaining, job.map_in_progress
    );
    println!(
        "  reduces: pendientes={}, en curso={}",
        job.reduce_remaining, job.reduce_in_progress
    );
    println!(
        "  asignaciones={}, reentregas={}, reportes ignorados={}",
        job.assignments, job.reassignments, job.ignored_reports
    );

    // progreso calculado localmente
    let total = job.total_map_tasks + job.n_reduce;
    if total > 0 {
        let done = total - job.map_remaining - job.reduce_remaining;
        let pct = (done as f64 / total as f64) * 100.0;
        println!("  progreso: {:.1}%", pct);
    } else {
        println!("  progreso: (sin tareas)");
    }

    println!("  iniciado: {}", job.started_at);
    if let Some(ref finished) = job.finished_at {
        println!("  finalizado: {}", finished);
    }
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    let client = Client::new();
    let base_url = cli.coordinator_url.trim_end_matches('/').to_string();

    match cli.command {
        Commands::Status => {
            let job = fetch_status(&client, &base_url).await?;
            print_status(&job);
        }

        Commands::Wait { interval_secs } => loop {
            let job = fetch_status(&client, &base_url).await?;
            if job.done {
                print_status(&job);
                break;
            }
            println!(
                "fase {}: {} maps y {} reduces pendientes...",
                job.phase(),
                job.map_remaining,
                job.reduce_remaining
            );
            tokio::time::sleep(Duration::from_secs(interval_secs.max(1))).await;
        },
    }

    Ok(())
}
