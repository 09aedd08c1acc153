//! src/executors/distributed.rs
use crate::aggregate::PartialAggregate;
use crate::error::JobError;
use crate::executors::Executor;
use crate::ingest::Batch;
use crate::worker::WorkerServiceClient;
use futures::{StreamExt, TryStreamExt};
use std::time::{Duration, Instant};
use tarpc::context;

/// Sends batches round-robin to remote workers, keeping at most
/// `max_in_flight` calls outstanding.
#[derive(Clone)]
pub struct DistributedExecutor {
    clients: Vec<WorkerServiceClient>,
    max_in_flight: usize,
    timeout: Duration,
}

impl DistributedExecutor {
    pub fn new(clients: Vec<WorkerServiceClient>, max_in_flight: usize, timeout: Duration) -> Self {
        Self {
            clients,
            max_in_flight: max_in_flight.max(1),
            timeout,
        }
    }

    async fn dispatch(&self, index: usize, batch: Batch) -> Result<PartialAggregate, JobError> {
        let client = &self.clients[index % self.clients.len()];
        let mut ctx = context::current();
        ctx.deadline = Instant::now() + self.timeout;

        tracing::debug!(batch = index, records = batch.len(), "Dispatching batch");
        client
            .map_batch(ctx, batch)
            .await
            .map_err(|e| JobError::BatchFailed {
                batch: index,
                source: anyhow::Error::new(e).context("Worker call failed"),
            })?
            .map_err(|e| JobError::BatchFailed {
                batch: index,
                source: e.into(),
            })
    }
}

impl Executor for DistributedExecutor {
    #[tracing::instrument(name = "Distributed map phase", skip_all, fields(workers = self.clients.len()))]
    async fn map_batches<I>(&self, batches: I) -> Result<Vec<PartialAggregate>, JobError>
    where
        I: Iterator<Item = Result<Batch, JobError>> + Send + 'static,
    {
        if self.clients.is_empty() {
            return Err(JobError::Config(
                "the distributed executor needs at least one worker".to_string(),
            ));
        }

        futures::stream::iter(batches.enumerate())
            .map(|(index, batch)| async move { self.dispatch(index, batch?).await })
            .buffer_unordered(self.max_in_flight)
            .try_collect()
            .await
    }
}
