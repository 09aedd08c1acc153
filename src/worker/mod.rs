//! src/worker/mod.rs
mod server;
mod service;

pub use server::{Worker, WorkerServer, connect_worker};
pub use service::{WorkerError, WorkerId, WorkerService, WorkerServiceClient, WorkerStatus};
