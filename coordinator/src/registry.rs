use std::{
    collections::{HashMap, HashSet},
    time::{Duration, Instant},
};

use chrono::{DateTime, Utc};
use common::{
    AssignmentId, JobStatusResponse, TaskAssignmentResponse, TaskKind, TaskReportRequest,
};
use tracing::{debug, info, warn};

/// Estado de una tarea que sigue en el registro.
/// Una tarea terminada se borra del registro; no queda rastro de ella.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// nunca asignada
    Pending,
    InProgress {
        since: Instant,
        assignment: AssignmentId,
    },
}

impl TaskState {
    /// Se puede (re)entregar si nunca se asignó o si su asignación venció.
    fn is_eligible(&self, now: Instant, timeout: Duration) -> bool {
        match self {
            TaskState::Pending => true,
            TaskState::InProgress { since, .. } => now.saturating_duration_since(*since) > timeout,
        }
    }

    fn is_in_progress(&self, now: Instant, timeout: Duration) -> bool {
        !self.is_eligible(now, timeout)
    }
}

/// Resultado de un ReportTask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    Accepted,
    /// la tarea ya no estaba en el registro (duplicado, tardío o desconocido)
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReportError {
    /// ReportTask con kind NONE o sin la clave de la tarea
    #[error("reporte inválido: {0}")]
    Malformed(String),
}

/// Registro de tareas del job. Todo el estado de scheduling vive acá;
/// el que lo use tiene que serializar el acceso (un solo lock por operación).
#[derive(Debug)]
pub struct TaskRegistry {
    map_tasks: HashMap<String, TaskState>,
    reduce_tasks: HashMap<u32, TaskState>,
    /// partición -> intermedios de los maps terminados (solo crece)
    intermediates: HashMap<u32, Vec<String>>,
    n_reduce: u32,
    timeout: Duration,
    total_map_tasks: u32,

    // Métricas
    next_assignment: AssignmentId,
    reassignments: u64,
    ignored_reports: u64,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

impl TaskRegistry {
    pub fn new<I, S>(files: I, n_reduce: u32, timeout: Duration) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut map_tasks = HashMap::new();
        for f in files {
            let f: String = f.into();
            if seen.insert(f.clone()) {
                map_tasks.insert(f, TaskState::Pending);
            }
        }

        let reduce_tasks = (0..n_reduce).map(|i| (i, TaskState::Pending)).collect();
        let intermediates = (0..n_reduce).map(|i| (i, Vec::new())).collect();

        let total_map_tasks = map_tasks.len() as u32;
        let started_at = Utc::now();
        let finished_at = if total_map_tasks == 0 && n_reduce == 0 {
            Some(started_at)
        } else {
            None
        };

        Self {
            map_tasks,
            reduce_tasks,
            intermediates,
            n_reduce,
            timeout,
            total_map_tasks,
            next_assignment: 0,
            reassignments: 0,
            ignored_reports: 0,
            started_at,
            finished_at,
        }
    }

    pub fn n_reduce(&self) -> u32 {
        self.n_reduce
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// true cuando no quedan tareas map ni reduce.
    pub fn done(&self) -> bool {
        self.map_tasks.is_empty() && self.reduce_tasks.is_empty()
    }

    /// Intermedios acumulados para una partición (vacío si no hay).
    pub fn intermediates_for(&self, partition: u32) -> &[String] {
        self.intermediates
            .get(&partition)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn request_task(&mut self) -> TaskAssignmentResponse {
        self.request_task_at(Instant::now())
    }

    /// RequestTask con el reloj explícito:
    ///   1. una tarea map elegible (pendiente o vencida)
    ///   2. si ya no quedan maps, una tarea reduce elegible
    ///   3. si no, "no hay tarea" con `done` calculado
    pub fn request_task_at(&mut self, now: Instant) -> TaskAssignmentResponse {
        let timeout = self.timeout;

        if let Some(file) = pick_eligible(&self.map_tasks, now, timeout) {
            let assignment = self.next_assignment_id();
            let prev = self.map_tasks.insert(
                file.clone(),
                TaskState::InProgress {
                    since: now,
                    assignment,
                },
            );
            self.note_reassignment(prev, &file);

            info!("asignando map {} (asignación {})", file, assignment);
            return TaskAssignmentResponse {
                kind: TaskKind::Map,
                input_file: Some(file),
                partition: None,
                assignment,
                n_reduce: self.n_reduce,
                intermediates: Vec::new(),
                done: false,
            };
        }

        // barrera: ningún reduce mientras quede algún map
        if self.map_tasks.is_empty() {
            if let Some(partition) = pick_eligible(&self.reduce_tasks, now, timeout) {
                let assignment = self.next_assignment_id();
                let prev = self.reduce_tasks.insert(
                    partition,
                    TaskState::InProgress {
                        since: now,
                        assignment,
                    },
                );
                self.note_reassignment(prev, &partition.to_string());

                let intermediates = self.intermediates_for(partition).to_vec();
                info!(
                    "asignando reduce {} (asignación {}, {} intermedios)",
                    partition,
                    assignment,
                    intermediates.len()
                );
                return TaskAssignmentResponse {
                    kind: TaskKind::Reduce,
                    input_file: None,
                    partition: Some(partition),
                    assignment,
                    n_reduce: self.n_reduce,
                    intermediates,
                    done: false,
                };
            }
        }

        debug!(
            "sin tareas disponibles ({} maps, {} reduces pendientes)",
            self.map_tasks.len(),
            self.reduce_tasks.len()
        );
        TaskAssignmentResponse::idle(self.n_reduce, self.done())
    }

    /// ReportTask. Es idempotente: solo se acepta el primer reporte de una
    /// tarea que sigue en el registro; los siguientes no tocan nada.
    pub fn report_task(&mut self, report: &TaskReportRequest) -> Result<ReportOutcome, ReportError> {
        let outcome = match report.kind {
            TaskKind::Map => {
                let file = report.input_file.as_deref().ok_or_else(|| {
                    ReportError::Malformed("reporte map sin archivo de entrada".to_string())
                })?;

                if self.map_tasks.remove(file).is_some() {
                    self.append_intermediates(file, &report.intermediates);
                    info!(
                        "map {} terminado (asignación {}), quedan {}",
                        file,
                        report.assignment,
                        self.map_tasks.len()
                    );
                    ReportOutcome::Accepted
                } else {
                    warn!(
                        "reporte map ignorado para {} (asignación {}): ya terminado o desconocido",
                        file, report.assignment
                    );
                    ReportOutcome::Ignored
                }
            }
            TaskKind::Reduce => {
                let partition = report.partition.ok_or_else(|| {
                    ReportError::Malformed("reporte reduce sin partición".to_string())
                })?;

                if self.reduce_tasks.remove(&partition).is_some() {
                    info!(
                        "reduce {} terminado (asignación {}), quedan {}",
                        partition,
                        report.assignment,
                        self.reduce_tasks.len()
                    );
                    ReportOutcome::Accepted
                } else {
                    warn!(
                        "reporte reduce ignorado para {} (asignación {}): ya terminado o desconocido",
                        partition, report.assignment
                    );
                    ReportOutcome::Ignored
                }
            }
            TaskKind::None => {
                return Err(ReportError::Malformed(
                    "reporte sin tipo de tarea".to_string(),
                ))
            }
        };

        match outcome {
            ReportOutcome::Ignored => self.ignored_reports += 1,
            ReportOutcome::Accepted => {
                if self.done() && self.finished_at.is_none() {
                    self.finished_at = Some(Utc::now());
                    info!("job terminado: todas las tareas completas");
                }
            }
        }

        Ok(outcome)
    }

    pub fn status(&self) -> JobStatusResponse {
        self.status_at(Instant::now())
    }

    pub fn status_at(&self, now: Instant) -> JobStatusResponse {
        let timeout = self.timeout;

        JobStatusResponse {
            done: self.done(),
            n_reduce: self.n_reduce,
            total_map_tasks: self.total_map_tasks,
            map_remaining: self.map_tasks.len() as u32,
            map_in_progress: count_in_progress(self.map_tasks.values(), now, timeout),
            reduce_remaining: self.reduce_tasks.len() as u32,
            reduce_in_progress: count_in_progress(self.reduce_tasks.values(), now, timeout),
            assignments: self.next_assignment,
            reassignments: self.reassignments,
            ignored_reports: self.ignored_reports,
            started_at: self.started_at,
            finished_at: self.finished_at,
        }
    }

    fn next_assignment_id(&mut self) -> AssignmentId {
        self.next_assignment += 1;
        self.next_assignment
    }

    fn note_reassignment(&mut self, prev: Option<TaskState>, task: &str) {
        if let Some(TaskState::InProgress { assignment, .. }) = prev {
            self.reassignments += 1;
            warn!(
                "tarea {} vencida (asignación {}), se reentrega",
                task, assignment
            );
        }
    }

    fn append_intermediates(&mut self, file: &str, produced: &[String]) {
        if produced.len() != self.n_reduce as usize {
            warn!(
                "map {} reportó {} intermedios para {} particiones",
                file,
                produced.len(),
                self.n_reduce
            );
        }
        for (partition, location) in produced.iter().enumerate() {
            let partition = partition as u32;
            if partition >= self.n_reduce {
                break;
            }
            self.intermediates
                .entry(partition)
                .or_default()
                .push(location.clone());
        }
    }
}

/// Cualquier tarea elegible; el orden de elección no está definido.
fn pick_eligible<K: Clone>(
    tasks: &HashMap<K, TaskState>,
    now: Instant,
    timeout: Duration,
) -> Option<K> {
    tasks
        .iter()
        .find(|(_, state)| state.is_eligible(now, timeout))
        .map(|(k, _)| k.clone())
}

fn count_in_progress<'a>(
    states: impl Iterator<Item = &'a TaskState>,
    now: Instant,
    timeout: Duration,
) -> u32 {
    states.filter(|s| s.is_in_progress(now, timeout)).count() as u32
}
