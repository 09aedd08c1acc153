//! src/storage/file.rs
use anyhow::Context;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes next to the target and renames over it, so the target is
    /// either the previous report or the complete new one.
    #[tracing::instrument(name = "Write report file", skip(self, json), fields(path = %self.path.display()))]
    pub async fn persist(&self, json: &str) -> Result<String, anyhow::Error> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .context(format!("Failed to create directory {}", parent.display()))?;
        }

        let mut staging = self.path.clone().into_os_string();
        staging.push(".tmp");
        let staging = PathBuf::from(staging);

        tokio::fs::write(&staging, json)
            .await
            .context(format!("Failed to write {}", staging.display()))?;
        if let Err(e) = tokio::fs::rename(&staging, &self.path).await {
            tokio::fs::remove_file(&staging).await.ok();
            return Err(e).context(format!("Failed to move report into {}", self.path.display()));
        }
        Ok(self.path.display().to_string())
    }
}
