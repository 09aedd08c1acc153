//! src/job.rs
use crate::aggregate::{PartialAggregate, par_merge_all};
use crate::configuration::{ExecutorKind, Settings};
use crate::error::JobError;
use crate::executors::{DistributedExecutor, Executor, ParallelExecutor, SequentialExecutor};
use crate::ingest::BatchReader;
use crate::report::FinalReport;
use crate::storage::ReportStore;
use crate::worker::{WorkerServer, WorkerServiceClient, WorkerStatus, connect_worker};
use anyhow::Context;
use tarpc::context;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use uuid::Uuid;

#[derive(Debug)]
pub struct JobSummary {
    pub job_id: Uuid,
    pub batches: usize,
    pub report: FinalReport,
    pub location: String,
}

/// Folds every per-batch aggregate, finalizes and persists the result. The
/// report is only returned once it has been written.
#[tracing::instrument(name = "Reduce", skip_all, fields(partials = results.len()))]
pub async fn reduce_all(
    results: Vec<PartialAggregate>,
    store: &ReportStore,
) -> Result<(FinalReport, String), JobError> {
    let merged = tokio::task::spawn_blocking(move || par_merge_all(results))
        .await
        .context("Merge task was aborted")?;
    tracing::info!(tracks = merged.track_count, "Merged partial aggregates");

    let report = FinalReport::finalize(&merged);
    let location = store.persist(&report).await?;
    Ok((report, location))
}

#[derive(Debug)]
pub struct StatsJob {
    job_id: Uuid,
    settings: Settings,
    store: ReportStore,
    handles: Vec<JoinHandle<anyhow::Result<()>>>,
    shutdown_tx: broadcast::Sender<()>,
    worker_service_clients: Vec<WorkerServiceClient>,
}

impl StatsJob {
    /// Prepares the output store and, for the distributed executor, spawns
    /// and connects the configured number of workers.
    #[tracing::instrument(name = "Start StatsJob", skip_all)]
    pub async fn start(settings: Settings) -> Result<Self, anyhow::Error> {
        let store = ReportStore::from_settings(&settings.output)
            .await
            .context("Failed to prepare the report store")?;
        let (shutdown_tx, _) = broadcast::channel::<()>(1);

        let mut handles = vec![];
        let mut worker_clients = vec![];
        if settings.cluster.executor == ExecutorKind::Distributed {
            for i in 0..settings.cluster.workers {
                let server = WorkerServer::build(&settings)?;
                let (socket_addr, handle) = server
                    .start(&shutdown_tx)
                    .await
                    .context(format!("Failed to start worker {i}"))?;
                handles.push(handle);
                worker_clients.push(connect_worker(socket_addr).await?);
            }
        }

        let job_id = Uuid::new_v4();
        tracing::info!(%job_id, executor = ?settings.cluster.executor, "Job started");
        Ok(Self {
            job_id,
            settings,
            store,
            handles,
            shutdown_tx,
            worker_service_clients: worker_clients,
        })
    }

    #[tracing::instrument(name = "Run StatsJob", skip_all, fields(job_id = %self.job_id))]
    pub async fn run(&self) -> Result<JobSummary, JobError> {
        let batches = BatchReader::open(&self.settings.input.path, self.settings.input.batch_size)?;
        let results = match self.settings.cluster.executor {
            ExecutorKind::Sequential => SequentialExecutor.map_batches(batches).await?,
            ExecutorKind::Parallel => {
                ParallelExecutor::new(usize::from(self.settings.cluster.workers))?
                    .map_batches(batches)
                    .await?
            }
            ExecutorKind::Distributed => {
                DistributedExecutor::new(
                    self.worker_service_clients.clone(),
                    self.settings.rpc.max_in_flight,
                    self.settings.rpc.timeout(),
                )
                .map_batches(batches)
                .await?
            }
        };
        let batch_count = results.len();
        tracing::info!(batches = batch_count, "Map phase complete");

        let (report, location) = reduce_all(results, &self.store).await?;
        Ok(JobSummary {
            job_id: self.job_id,
            batches: batch_count,
            report,
            location,
        })
    }

    pub async fn worker_statuses(&self) -> Result<Vec<WorkerStatus>, anyhow::Error> {
        let mut statuses = vec![];
        for worker_client in self.worker_service_clients.iter() {
            let status = worker_client
                .status(context::current())
                .await
                .context("Failed to get status from worker")?;
            statuses.push(status);
        }

        Ok(statuses)
    }

    #[tracing::instrument("Shutdown StatsJob", skip_all)]
    pub async fn shutdown(self) -> anyhow::Result<()> {
        self.shutdown_tx.send(()).ok();

        // Wait for all workers
        for handle in self.handles {
            handle.await??;
        }

        tracing::info!("All services shut down gracefully");
        Ok(())
    }
}
