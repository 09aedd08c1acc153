//! src/worker/service.rs
use crate::aggregate::PartialAggregate;
use crate::tracks::TrackRecord;
use uuid::Uuid;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize)]
pub struct WorkerId(Uuid);

impl WorkerId {
    pub fn new() -> Self {
        WorkerId(Uuid::new_v4())
    }
}

impl Default for WorkerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for WorkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(PartialEq, Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum WorkerStatus {
    Idle(WorkerId),
    Busy { id: WorkerId, in_flight: u64 },
}

#[derive(thiserror::Error, PartialEq, Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum WorkerError {
    #[error("Worker {worker} failed to map batch: {message}")]
    MapFailed { worker: WorkerId, message: String },
}

#[tarpc::service]
pub trait WorkerService {
    async fn ping() -> bool;

    async fn status() -> WorkerStatus;

    /// Number of batches this worker has mapped since it started.
    async fn batches_mapped() -> u64;

    async fn map_batch(batch: Vec<TrackRecord>) -> Result<PartialAggregate, WorkerError>;
}
