//! Artifact storage: turns produced files into stable, retrievable locators.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

/// Resolves produced artifacts to locator strings. The pipeline never assumes
/// a particular backend; the default stores on the local filesystem and hands
/// back paths served under `/files/`.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Persist the file at `source` under the given folder and return its
    /// locator string.
    async fn store(&self, source: &Path, folder: &str) -> Result<String, StorageError>;
}

/// Local filesystem store rooted at the configured output directory.
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ArtifactStore for LocalStorage {
    async fn store(&self, source: &Path, folder: &str) -> Result<String, StorageError> {
        let file_name = source
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| StorageError::InvalidSource(source.display().to_string()))?;

        let target_dir = self.root.join(folder);
        tokio::fs::create_dir_all(&target_dir)
            .await
            .map_err(StorageError::Io)?;

        // Unique name so repeated submissions of the same file never clobber
        // each other's artifacts.
        let unique_name = format!("{}_{}", Uuid::new_v4().simple(), file_name);
        let target = target_dir.join(&unique_name);
        tokio::fs::copy(source, &target)
            .await
            .map_err(StorageError::Io)?;

        Ok(format!("/files/{folder}/{unique_name}"))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("source path has no usable file name: {0}")]
    InvalidSource(String),
}
