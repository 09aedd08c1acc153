//! src/worker/server.rs
use crate::aggregate::{self, PartialAggregate};
use crate::configuration::Settings;
use crate::tracks::TrackRecord;
use crate::worker::service::{WorkerError, WorkerId, WorkerService, WorkerServiceClient, WorkerStatus};
use anyhow::Context;
use futures::{StreamExt, future};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tarpc::client::Config;
use tarpc::context;
use tarpc::server::{BaseChannel, Channel};
use tarpc::tokio_serde::formats::Json;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::Instrument;

const MAX_CONNECTIONS: usize = 32;

#[derive(Clone, Debug)]
pub struct Worker {
    id: WorkerId,
    in_flight: Arc<AtomicU64>,
    batches_mapped: Arc<AtomicU64>,
}

impl Default for Worker {
    fn default() -> Self {
        Self::new()
    }
}

impl Worker {
    pub fn new() -> Self {
        Self {
            id: WorkerId::new(),
            in_flight: Arc::new(AtomicU64::new(0)),
            batches_mapped: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn id(&self) -> &WorkerId {
        &self.id
    }
}

impl WorkerService for Worker {
    async fn ping(self, _: context::Context) -> bool {
        true
    }

    async fn status(self, _: context::Context) -> WorkerStatus {
        match self.in_flight.load(Ordering::Relaxed) {
            0 => WorkerStatus::Idle(self.id),
            in_flight => WorkerStatus::Busy {
                id: self.id,
                in_flight,
            },
        }
    }

    async fn batches_mapped(self, _: context::Context) -> u64 {
        self.batches_mapped.load(Ordering::Relaxed)
    }

    #[tracing::instrument(name = "Map batch", skip_all, fields(worker = %self.id, records = batch.len()))]
    async fn map_batch(
        self,
        _: context::Context,
        batch: Vec<TrackRecord>,
    ) -> Result<PartialAggregate, WorkerError> {
        self.in_flight.fetch_add(1, Ordering::Relaxed);
        let result = tokio::task::spawn_blocking(move || aggregate::map_batch(&batch)).await;
        self.in_flight.fetch_sub(1, Ordering::Relaxed);

        match result {
            Ok(partial) => {
                self.batches_mapped.fetch_add(1, Ordering::Relaxed);
                Ok(partial)
            }
            Err(e) => {
                tracing::error!(error = %e, "Map task aborted");
                Err(WorkerError::MapFailed {
                    worker: self.id,
                    message: e.to_string(),
                })
            }
        }
    }
}

pub struct WorkerServer {
    worker: Worker,
    address: SocketAddr,
}

impl WorkerServer {
    pub fn build(configuration: &Settings) -> Result<Self, anyhow::Error> {
        let host = configuration.rpc.get_host()?;
        Ok(Self {
            worker: Worker::new(),
            address: SocketAddr::new(host, configuration.rpc.port),
        })
    }

    /// Binds the listener and serves until `shutdown_tx` fires. Returns the
    /// bound address, which differs from the configured one when port 0 was
    /// requested.
    #[tracing::instrument(name = "Start worker", skip_all, fields(worker = %self.worker.id()))]
    pub async fn start(
        &self,
        shutdown_tx: &broadcast::Sender<()>,
    ) -> Result<(SocketAddr, JoinHandle<anyhow::Result<()>>), anyhow::Error> {
        let mut listener = tarpc::serde_transport::tcp::listen(self.address, Json::default)
            .await
            .context(format!("Failed to bind worker to {}", self.address))?;
        listener.config_mut().max_frame_length(usize::MAX);
        let local_addr = listener.local_addr();

        let worker = self.worker.clone();
        let mut shutdown_rx = shutdown_tx.subscribe();
        let span = tracing::info_span!("Worker server", worker = %worker.id(), %local_addr);
        let handle = tokio::spawn(
            async move {
                let serve = listener
                    .filter_map(|connection| future::ready(connection.ok()))
                    .map(BaseChannel::with_defaults)
                    .map(move |channel| channel.execute(worker.clone().serve()).for_each(spawn))
                    .buffer_unordered(MAX_CONNECTIONS)
                    .for_each(|_| async {});

                tokio::select! {
                    _ = serve => {
                        tracing::warn!("Worker listener closed");
                    }
                    _ = shutdown_rx.recv() => {
                        tracing::info!("Worker shutting down");
                    }
                }
                Ok(())
            }
            .instrument(span),
        );

        tracing::debug!(%local_addr, "Worker listening");
        Ok((local_addr, handle))
    }
}

async fn spawn(fut: impl Future<Output = ()> + Send + 'static) {
    tokio::spawn(fut);
}

pub async fn connect_worker(address: SocketAddr) -> Result<WorkerServiceClient, anyhow::Error> {
    let mut transport = tarpc::serde_transport::tcp::connect(address, Json::default);
    transport.config_mut().max_frame_length(usize::MAX);
    let transport = transport
        .await
        .context(format!("Failed to connect to worker at {address}"))?;
    Ok(WorkerServiceClient::new(Config::default(), transport).spawn())
}
