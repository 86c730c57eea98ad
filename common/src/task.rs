use serde::{Deserialize, Serialize};

/// Número de asignación: único por cada vez que el coordinator entrega una
/// tarea, no por tarea.
pub type AssignmentId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskKind {
    None,
    Map,
    Reduce,
}

/* --------- RequestTask --------- */

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskAssignmentResponse {
    pub kind: TaskKind,
    /// Archivo de entrada (solo en tareas Map)
    pub input_file: Option<String>,
    /// Partición de reduce (solo en tareas Reduce)
    pub partition: Option<u32>,
    pub assignment: AssignmentId,
    pub n_reduce: u32,
    /// Archivos intermedios de la partición (solo en tareas Reduce)
    #[serde(default)]
    pub intermediates: Vec<String>,
    pub done: bool,
}

impl TaskAssignmentResponse {
    /// Respuesta "no hay tarea ahora"; el worker vuelve a preguntar más tarde.
    pub fn idle(n_reduce: u32, done: bool) -> Self {
        Self {
            kind: TaskKind::None,
            input_file: None,
            partition: None,
            assignment: 0,
            n_reduce,
            intermediates: Vec::new(),
            done,
        }
    }

    /// Vista del worker sobre la respuesta.
    /// Falla si el coordinator manda un Map sin archivo o un Reduce sin partición.
    pub fn into_work(self) -> Result<Work, String> {
        if self.done {
            return Ok(Work::Done);
        }
        match self.kind {
            TaskKind::None => Ok(Work::Idle),
            TaskKind::Map => {
                let input_file = self
                    .input_file
                    .ok_or_else(|| format!("tarea map {} sin archivo de entrada", self.assignment))?;
                Ok(Work::Map {
                    input_file,
                    assignment: self.assignment,
                    n_reduce: self.n_reduce,
                })
            }
            TaskKind::Reduce => {
                let partition = self
                    .partition
                    .ok_or_else(|| format!("tarea reduce {} sin partición", self.assignment))?;
                Ok(Work::Reduce {
                    partition,
                    assignment: self.assignment,
                    intermediates: self.intermediates,
                })
            }
        }
    }
}

/// Lo que el worker tiene que hacer después de un RequestTask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Work {
    Map {
        input_file: String,
        assignment: AssignmentId,
        n_reduce: u32,
    },
    Reduce {
        partition: u32,
        assignment: AssignmentId,
        intermediates: Vec<String>,
    },
    Idle,
    Done,
}

/* --------- ReportTask --------- */

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskReportRequest {
    pub kind: TaskKind,
    pub input_file: Option<String>,
    pub partition: Option<u32>,
    pub assignment: AssignmentId,
    /// `intermediates[i]` es el archivo producido para la partición `i`
    #[serde(default)]
    pub intermediates: Vec<String>,
}

impl TaskReportRequest {
    pub fn map(input_file: impl Into<String>, assignment: AssignmentId, intermediates: Vec<String>) -> Self {
        Self {
            kind: TaskKind::Map,
            input_file: Some(input_file.into()),
            partition: None,
            assignment,
            intermediates,
        }
    }

    pub fn reduce(partition: u32, assignment: AssignmentId) -> Self {
        Self {
            kind: TaskKind::Reduce,
            input_file: None,
            partition: Some(partition),
            assignment,
            intermediates: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskReportResponse {
    pub ok: bool,
    /// false si el reporte era duplicado, tardío o de una tarea desconocida
    pub accepted: bool,
}
