use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Estado del job tal como lo ve un operador (`GET /api/v1/job`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub done: bool,
    pub n_reduce: u32,

    /// -------- Progreso por fase --------
    pub total_map_tasks: u32,
    pub map_remaining: u32,
    pub map_in_progress: u32,
    pub reduce_remaining: u32,
    pub reduce_in_progress: u32,

    /// -------- Métricas de asignación --------
    pub assignments: u64,
    /// tareas reentregadas porque su asignación anterior venció
    pub reassignments: u64,
    /// reportes ignorados (duplicados, tardíos o de tareas desconocidas)
    pub ignored_reports: u64,

    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl JobStatusResponse {
    /// Fase actual, solo para mostrar.
    pub fn phase(&self) -> &'static str {
        if self.done {
            "DONE"
        } else if self.map_remaining > 0 {
            "MAP"
        } else {
            "REDUCE"
        }
    }
}
