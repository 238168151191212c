//! Blob store contract and the errors raised on either side of it.

use async_trait::async_trait;
use thiserror::Error;

/// Errors returned by a blob store backend.
#[derive(Debug, Error)]
pub enum BlobError {
    /// No object exists under the requested key.
    #[error("object not found: {0}")]
    NotFound(String),
    /// Backend rejected or failed the request.
    #[error("blob backend error: {0}")]
    Backend(String),
    /// Local filesystem access failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Stage-level failures surfaced by [`crate::storage::BlobStoreAdapter`].
#[derive(Debug, Error)]
pub enum StorageError {
    /// Uploading a document failed.
    #[error("failed to store '{key}': {reason}")]
    Write {
        /// Key the upload targeted.
        key: String,
        /// Underlying cause.
        reason: String,
    },
    /// Downloading a document failed.
    #[error("failed to fetch '{key}': {reason}")]
    Read {
        /// Key the download targeted.
        key: String,
        /// Underlying cause.
        reason: String,
    },
    /// Enumerating stored documents failed.
    #[error("failed to list documents: {0}")]
    List(String),
}

/// Durable object storage keyed by name.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under `name`, overwriting any existing object. Returns the stored key.
    async fn put(&self, name: &str, bytes: Vec<u8>) -> Result<String, BlobError>;

    /// Enumerate every key in the store, in the backend's native order.
    async fn list(&self) -> Result<Vec<String>, BlobError>;

    /// Read the object stored under `key`.
    async fn get(&self, key: &str) -> Result<Vec<u8>, BlobError>;
}
