//! src/storage/mod.rs
mod file;
mod s3;

pub use file::FileStore;
pub use s3::S3Storage;

use crate::configuration::{OutputBackend, OutputSettings};
use crate::error::JobError;
use crate::report::FinalReport;
use anyhow::Context;

/// Where the final report ends up.
#[derive(Debug)]
pub enum ReportStore {
    File(FileStore),
    S3(S3Storage),
}

impl ReportStore {
    pub async fn from_settings(settings: &OutputSettings) -> Result<Self, anyhow::Error> {
        match settings.backend {
            OutputBackend::File => Ok(ReportStore::File(FileStore::new(&settings.path))),
            OutputBackend::S3 => {
                let s3 = settings
                    .s3
                    .as_ref()
                    .context("The s3 backend needs an `output.s3` section")?;
                Ok(ReportStore::S3(S3Storage::new(s3).await?))
            }
        }
    }

    /// Returns the location the report was written to.
    #[tracing::instrument(name = "Persist report", skip_all)]
    pub async fn persist(&self, report: &FinalReport) -> Result<String, JobError> {
        let json = report
            .to_json_pretty()
            .context("Failed to serialize the final report")
            .map_err(JobError::Persist)?;
        let location = match self {
            ReportStore::File(store) => store.persist(&json).await,
            ReportStore::S3(store) => store.persist(&json).await,
        }
        .map_err(JobError::Persist)?;

        tracing::info!(%location, "Report persisted");
        Ok(location)
    }
}
