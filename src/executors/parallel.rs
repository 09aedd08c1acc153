//! src/executors/parallel.rs
use crate::aggregate::{PartialAggregate, map_batch};
use crate::error::JobError;
use crate::executors::Executor;
use crate::ingest::Batch;
use anyhow::Context;
use rayon::prelude::*;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Maps batches on a dedicated rayon pool. Batches share nothing, so results
/// come back in completion order rather than input order.
#[derive(Debug, Clone)]
pub struct ParallelExecutor {
    pool: Arc<rayon::ThreadPool>,
}

impl ParallelExecutor {
    pub fn new(workers: usize) -> Result<Self, anyhow::Error> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("trackstats-map-{i}"))
            .build()
            .context("Failed to build map thread pool")?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

impl Executor for ParallelExecutor {
    #[tracing::instrument(name = "Parallel map phase", skip_all, fields(threads = self.pool.current_num_threads()))]
    async fn map_batches<I>(&self, batches: I) -> Result<Vec<PartialAggregate>, JobError>
    where
        I: Iterator<Item = Result<Batch, JobError>> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            pool.install(|| {
                batches
                    .enumerate()
                    .par_bridge()
                    .map(|(index, batch)| {
                        let batch = batch?;
                        tracing::debug!(batch = index, records = batch.len(), "Mapping batch");
                        panic::catch_unwind(AssertUnwindSafe(|| map_batch(&batch))).map_err(
                            |payload| JobError::BatchFailed {
                                batch: index,
                                source: anyhow::anyhow!(panic_message(payload.as_ref())),
                            },
                        )
                    })
                    .collect::<Result<Vec<_>, JobError>>()
            })
        })
        .await
        .context("Map phase task was aborted")?
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "map step panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::merge_all;
    use crate::executors::SequentialExecutor;
    use crate::test_utils::track;
    use crate::tracks::TrackRecord;
    use claims::assert_matches;

    fn records() -> Vec<TrackRecord> {
        (0..200)
            .map(|i| {
                track(
                    &format!("{}:{:02}", i % 6, i % 60),
                    &format!("{}-05-05", 1990 + i % 30),
                    i % 100,
                    if i % 4 == 0 { "Yes" } else { "No" },
                    &format!("Artist {}", i % 13),
                    (i % 16) as f64 / 16.0,
                )
            })
            .collect()
    }

    fn batches(
        records: Vec<TrackRecord>,
        size: usize,
    ) -> impl Iterator<Item = Result<Batch, JobError>> + Send + 'static {
        records
            .chunks(size)
            .map(|chunk| Ok(chunk.to_vec()))
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[tokio::test]
    async fn parallel_and_sequential_map_phases_merge_to_the_same_aggregate() {
        let executor = ParallelExecutor::new(4).expect("Failed to build executor");

        let parallel = executor
            .map_batches(batches(records(), 7))
            .await
            .expect("Parallel map phase failed");
        let sequential = SequentialExecutor
            .map_batches(batches(records(), 7))
            .await
            .expect("Sequential map phase failed");

        assert_eq!(parallel.len(), sequential.len());
        assert_eq!(merge_all(parallel), merge_all(sequential));
    }

    #[tokio::test]
    async fn an_ingestion_error_fails_the_whole_phase() {
        let executor = ParallelExecutor::new(2).expect("Failed to build executor");
        let mut input: Vec<Result<Batch, JobError>> = batches(records(), 10).collect();
        input.insert(
            3,
            Err(JobError::InputRead {
                line: 31,
                source: std::io::Error::other("disk went away"),
            }),
        );

        let result = executor.map_batches(input.into_iter()).await;
        assert_matches!(result, Err(JobError::InputRead { line: 31, .. }));
    }

    #[test]
    fn panic_payloads_are_rendered() {
        assert_eq!(panic_message(&"boom"), "boom");
        assert_eq!(panic_message(&String::from("bang")), "bang");
        assert_eq!(panic_message(&42u8), "map step panicked");
    }
}
