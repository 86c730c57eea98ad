use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, bail, Result};
use common::{engine, MapReduceApp, TaskReportRequest, Work};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::client::CoordinatorClient;
use crate::config::WorkerConfig;

/// Cuántas tareas ejecutó este worker antes de salir.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WorkerSummary {
    pub maps: u32,
    pub reduces: u32,
}

/// Nombre para los logs; el worker no tiene identidad entre tareas.
fn worker_label() -> String {
    let host = hostname::get()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();
    format!("{}-{}", host, std::process::id())
}

/// Loop principal del worker:
/// - pide una tarea al coordinator
/// - si el job terminó (o el coordinator no responde), sale
/// - si no hay tarea, duerme `poll_interval` y vuelve a pedir
/// - si hay map o reduce, lo ejecuta en un hilo de bloqueo y reporta
///
/// Un error local de I/O (entrada ilegible, no se puede publicar la salida)
/// termina el loop con `Err` sin reportar la tarea.
pub async fn run(config: WorkerConfig, app: Arc<dyn MapReduceApp>) -> Result<WorkerSummary> {
    let client = CoordinatorClient::new(&config.coordinator_url, config.rpc_timeout())?;
    let label = worker_label();
    let mut summary = WorkerSummary::default();

    info!(
        "worker {} arrancando (app={}, coordinator={})",
        label,
        app.name(),
        client.base_url()
    );

    loop {
        // Un RequestTask fallido cuenta como "job terminado"
        let reply = match client.request_task().await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("RequestTask falló ({:#}), se asume job terminado", e);
                break;
            }
        };

        let work = reply
            .into_work()
            .map_err(|e| anyhow!("respuesta inválida del coordinator: {e}"))?;

        match work {
            Work::Done => {
                info!("el coordinator avisa que el job terminó");
                break;
            }
            Work::Idle => {
                debug!("no hay tareas, esperando {:?}...", config.poll_interval());
                sleep(config.poll_interval()).await;
            }
            Work::Map {
                input_file,
                assignment,
                n_reduce,
            } => {
                info!("tengo tarea map {} (asignación {})", input_file, assignment);

                let produced =
                    run_map(app.clone(), input_file.clone(), assignment, n_reduce, config.work_dir.clone())
                        .await?;

                let report = TaskReportRequest::map(input_file, assignment, produced);
                send_report(&client, &report).await;
                summary.maps += 1;
            }
            Work::Reduce {
                partition,
                assignment,
                intermediates,
            } => {
                info!(
                    "tengo tarea reduce {} (asignación {}, {} intermedios)",
                    partition,
                    assignment,
                    intermediates.len()
                );

                run_reduce(app.clone(), partition, intermediates, config.output_dir.clone()).await?;

                send_report(&client, &TaskReportRequest::reduce(partition, assignment)).await;
                summary.reduces += 1;
            }
        }
    }

    info!(
        "worker {} terminado: {} maps, {} reduces",
        label, summary.maps, summary.reduces
    );
    Ok(summary)
}

async fn run_map(
    app: Arc<dyn MapReduceApp>,
    input_file: String,
    assignment: u64,
    n_reduce: u32,
    work_dir: PathBuf,
) -> Result<Vec<String>> {
    let handle = tokio::task::spawn_blocking(move || {
        engine::execute_map_task(app.as_ref(), &input_file, assignment, n_reduce, &work_dir)
            .map_err(|e| (input_file, e))
    });

    match handle.await {
        Ok(Ok(produced)) => Ok(produced),
        Ok(Err((input_file, e))) => bail!("error procesando map {}: {}", input_file, e),
        Err(e) => bail!("panic o join error en map (asignación {}): {:?}", assignment, e),
    }
}

async fn run_reduce(
    app: Arc<dyn MapReduceApp>,
    partition: u32,
    intermediates: Vec<String>,
    output_dir: PathBuf,
) -> Result<PathBuf> {
    let handle = tokio::task::spawn_blocking(move || {
        engine::execute_reduce_task(app.as_ref(), partition, &intermediates, &output_dir)
    });

    match handle.await {
        Ok(Ok(path)) => {
            info!("reduce {} publicado en {}", partition, path.display());
            Ok(path)
        }
        Ok(Err(e)) => bail!("error procesando reduce {}: {}", partition, e),
        Err(e) => bail!("panic o join error en reduce {}: {:?}", partition, e),
    }
}

/// ReportTask. Si falla solo se loguea: el coordinator reentrega la tarea
/// cuando venza su asignación.
async fn send_report(client: &CoordinatorClient, report: &TaskReportRequest) {
    match client.report_task(report).await {
        Ok(ack) if ack.accepted => {
            debug!("reporte aceptado (asignación {})", report.assignment)
        }
        Ok(_) => info!(
            "reporte de la asignación {} ignorado: la tarea ya estaba terminada",
            report.assignment
        ),
        Err(e) => warn!("ReportTask falló para la asignación {}: {:#}", report.assignment, e),
    }
}
