//! JSON-file text store: one file per document under a directory.

use crate::text_store::types::{TextRecord, TextStore, TextStoreError};
use async_trait::async_trait;
use std::path::PathBuf;

/// Stores each record as `<dir>/<hex(document_id)>.json`.
pub struct FileTextStore {
    dir: PathBuf,
}

impl FileTextStore {
    /// Create a store writing under `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn record_path(&self, document_id: &str) -> PathBuf {
        // Hex keeps arbitrary identifiers (slashes, dots) filesystem safe.
        self.dir.join(format!("{}.json", hex::encode(document_id)))
    }
}

#[async_trait]
impl TextStore for FileTextStore {
    async fn upsert(&self, document_id: &str, record: &TextRecord) -> Result<(), TextStoreError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let payload = serde_json::to_vec_pretty(record)
            .map_err(|error| TextStoreError::InvalidRecord(error.to_string()))?;
        let path = self.record_path(document_id);
        let staging = path.with_extension("json.tmp");
        tokio::fs::write(&staging, payload).await?;
        tokio::fs::rename(&staging, &path).await?;
        tracing::debug!(document_id, path = %path.display(), "Wrote text record");
        Ok(())
    }

    async fn fetch(&self, document_id: &str) -> Result<Option<TextRecord>, TextStoreError> {
        let path = self.record_path(document_id);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(error.into()),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|error| TextStoreError::InvalidRecord(error.to_string()))
    }
}
