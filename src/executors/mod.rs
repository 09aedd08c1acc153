//! src/executors/mod.rs
//!
//! Executors run the map phase: `map_batch` over every batch, returning only
//! once all of them have finished. Any failed batch fails the whole phase.
use crate::aggregate::PartialAggregate;
use crate::error::JobError;
use crate::ingest::Batch;

pub trait Executor {
    fn map_batches<I>(
        &self,
        batches: I,
    ) -> impl Future<Output = Result<Vec<PartialAggregate>, JobError>> + Send
    where
        I: Iterator<Item = Result<Batch, JobError>> + Send + 'static;
}

mod distributed;
pub use distributed::DistributedExecutor;

mod parallel;
pub use parallel::ParallelExecutor;

mod sequential;
pub use sequential::SequentialExecutor;
