// coordinator/src/state.rs

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use tracing::warn;

use crate::registry::TaskRegistry;

/// Estado compartido entre los handlers HTTP.
/// Un solo lock para todo el registro: cada RPC lo toma de principio a fin.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Mutex<TaskRegistry>>,
}

impl AppState {
    pub fn new(files: Vec<String>, n_reduce: u32, timeout: Duration) -> Self {
        Self::from_registry(TaskRegistry::new(files, n_reduce, timeout))
    }

    pub fn from_registry(registry: TaskRegistry) -> Self {
        Self {
            registry: Arc::new(Mutex::new(registry)),
        }
    }

    pub fn lock(
        &self,
    ) -> Result<MutexGuard<'_, TaskRegistry>, PoisonError<MutexGuard<'_, TaskRegistry>>> {
        self.registry.lock()
    }

    /// Done() del job. Un lock envenenado cuenta como "no terminado".
    pub fn is_done(&self) -> bool {
        match self.registry.lock() {
            Ok(r) => r.done(),
            Err(_) => {
                warn!("lock del registro envenenado en is_done");
                false
            }
        }
    }
}
