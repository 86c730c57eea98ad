pub mod config;
pub mod handlers;
pub mod registry;
pub mod state;

pub use handlers::build_router;
pub use registry::{ReportOutcome, TaskRegistry, TaskState};
pub use state::AppState;
