//! src/error.rs
use std::path::PathBuf;

#[derive(thiserror::Error)]
pub enum JobError {
    #[error("Failed to open input file {}", .path.display())]
    InputUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to read line {line} of the input")]
    InputRead {
        line: usize,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed track record on line {line}")]
    MalformedRecord {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("Map step failed for batch {batch}")]
    BatchFailed {
        batch: usize,
        #[source]
        source: anyhow::Error,
    },
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Failed to persist the final report")]
    Persist(#[source] anyhow::Error),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl std::fmt::Debug for JobError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(f, self)
    }
}

pub fn error_chain_fmt(
    f: &mut std::fmt::Formatter<'_>,
    e: &impl std::error::Error,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}
