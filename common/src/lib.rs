pub mod apps;
pub mod codec;
pub mod engine;
pub mod job;
pub mod kv;
pub mod partition;
pub mod task;

pub use apps::{app_by_name, MapReduceApp};
pub use job::JobStatusResponse;
pub use kv::KeyValue;
pub use partition::{ihash, partition_for};
pub use task::{
    AssignmentId, TaskAssignmentResponse, TaskKind, TaskReportRequest, TaskReportResponse, Work,
};
