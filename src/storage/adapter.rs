//! Stage adapter turning blob store calls into local files and stage-specific failures.

use crate::storage::{
    scratch::ScratchFile,
    types::{BlobStore, StorageError},
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

/// Uploads, lists, and downloads documents through a [`BlobStore`].
pub struct BlobStoreAdapter {
    store: Arc<dyn BlobStore>,
    scratch_root: PathBuf,
    extension: String,
}

impl BlobStoreAdapter {
    /// Create an adapter that downloads into `scratch_root` and lists keys ending in `extension`.
    pub fn new(
        store: Arc<dyn BlobStore>,
        scratch_root: impl Into<PathBuf>,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            store,
            scratch_root: scratch_root.into(),
            extension: extension.into(),
        }
    }

    /// Upload the file at `local_path`, keyed by its base name.
    pub async fn store(&self, local_path: &Path) -> Result<String, StorageError> {
        let key = base_name(local_path)?;
        let bytes = tokio::fs::read(local_path)
            .await
            .map_err(|error| StorageError::Write {
                key: key.clone(),
                reason: format!("failed to read {}: {error}", local_path.display()),
            })?;
        self.put(key, bytes).await
    }

    /// Upload `bytes` received under `file_name`, keyed by its base name.
    pub async fn store_bytes(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, StorageError> {
        let key = base_name(Path::new(file_name))?;
        self.put(key, bytes).await
    }

    async fn put(&self, key: String, bytes: Vec<u8>) -> Result<String, StorageError> {
        let size = bytes.len();
        let stored = self
            .store
            .put(&key, bytes)
            .await
            .map_err(|error| StorageError::Write {
                key: key.clone(),
                reason: error.to_string(),
            })?;
        tracing::info!(key = %stored, bytes = size, "Document stored");
        Ok(stored)
    }

    /// List stored document keys ending with the configured extension, in store order.
    pub async fn list(&self) -> Result<Vec<String>, StorageError> {
        let keys = self
            .store
            .list()
            .await
            .map_err(|error| StorageError::List(error.to_string()))?;
        Ok(keys
            .into_iter()
            .filter(|key| key.ends_with(&self.extension))
            .collect())
    }

    /// Download `key` into a fresh scratch directory named after its final path segment.
    pub async fn fetch(&self, key: &str) -> Result<ScratchFile, StorageError> {
        let file_name = final_segment(key).ok_or_else(|| StorageError::Read {
            key: key.to_string(),
            reason: "key has no final path segment".into(),
        })?;
        let bytes = self.read(key).await?;

        let dir = self.scratch_root.join(Uuid::new_v4().to_string());
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|error| StorageError::Read {
                key: key.to_string(),
                reason: format!("failed to create scratch directory: {error}"),
            })?;
        let scratch = ScratchFile::new(dir, file_name);
        tokio::fs::write(scratch.path(), &bytes)
            .await
            .map_err(|error| StorageError::Read {
                key: key.to_string(),
                reason: format!("failed to write {}: {error}", scratch.path().display()),
            })?;

        tracing::debug!(key, path = %scratch.path().display(), bytes = bytes.len(), "Document fetched");
        Ok(scratch)
    }

    /// Read the raw bytes stored under `key`.
    pub async fn read(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        self.store
            .get(key)
            .await
            .map_err(|error| StorageError::Read {
                key: key.to_string(),
                reason: error.to_string(),
            })
    }
}

fn base_name(path: &Path) -> Result<String, StorageError> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| StorageError::Write {
            key: path.display().to_string(),
            reason: "path has no file name".into(),
        })
}

fn final_segment(key: &str) -> Option<&str> {
    key.rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
}
