//! src/lib.rs
pub mod aggregate;
pub mod configuration;
pub mod error;
pub mod executors;
pub mod ingest;
pub mod job;
pub mod report;
pub mod storage;
pub mod telemetry;
#[cfg(test)]
mod test_utils;
pub mod tracks;
pub mod worker;
