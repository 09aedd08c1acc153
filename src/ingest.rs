//! src/ingest.rs
use crate::error::JobError;
use crate::tracks::TrackRecord;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

pub type Batch = Vec<TrackRecord>;

/// Reads a line-delimited JSON dataset as fixed-size batches. Only the last
/// batch may be short. Iteration stops after the first error.
#[derive(Debug)]
pub struct BatchReader {
    lines: Lines<BufReader<File>>,
    batch_size: usize,
    line: usize,
    done: bool,
}

impl BatchReader {
    #[tracing::instrument(name = "Open input", skip(path), fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>, batch_size: usize) -> Result<Self, JobError> {
        let path = path.as_ref();
        if batch_size == 0 {
            return Err(JobError::Config(
                "input.batch_size must be greater than zero".to_string(),
            ));
        }
        let file = File::open(path).map_err(|source| JobError::InputUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(BatchReader {
            lines: BufReader::new(file).lines(),
            batch_size,
            line: 0,
            done: false,
        })
    }

    fn next_batch(&mut self) -> Result<Option<Batch>, JobError> {
        let mut batch = Vec::with_capacity(self.batch_size);
        while batch.len() < self.batch_size {
            let Some(line) = self.lines.next() else {
                break;
            };
            self.line += 1;
            let line = line.map_err(|source| JobError::InputRead {
                line: self.line,
                source,
            })?;
            if line.trim().is_empty() {
                continue;
            }
            let record = serde_json::from_str(&line).map_err(|source| {
                JobError::MalformedRecord {
                    line: self.line,
                    source,
                }
            })?;
            batch.push(record);
        }
        if batch.is_empty() {
            return Ok(None);
        }
        tracing::debug!(records = batch.len(), last_line = self.line, "Read batch");
        Ok(Some(batch))
    }
}

impl Iterator for BatchReader {
    type Item = Result<Batch, JobError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_batch() {
            Ok(Some(batch)) => Some(Ok(batch)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
