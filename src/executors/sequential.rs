//! src/executors/sequential.rs
use crate::aggregate::{PartialAggregate, map_batch};
use crate::error::JobError;
use crate::executors::Executor;
use crate::ingest::Batch;

/// Maps batches one after another on the calling task.
#[derive(Debug, Default)]
pub struct SequentialExecutor;

impl Executor for SequentialExecutor {
    #[tracing::instrument(name = "Sequential map phase", skip_all)]
    async fn map_batches<I>(&self, batches: I) -> Result<Vec<PartialAggregate>, JobError>
    where
        I: Iterator<Item = Result<Batch, JobError>> + Send + 'static,
    {
        let mut results = vec![];
        for (index, batch) in batches.enumerate() {
            let batch = batch?;
            tracing::debug!(batch = index, records = batch.len(), "Mapping batch");
            results.push(map_batch(&batch));
        }
        Ok(results)
    }
}
