//! Text store contract, persisted record, and errors.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Errors raised by a text store backend.
#[derive(Debug, Error)]
pub enum TextStoreError {
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Backend responded with an unexpected status code.
    #[error("unexpected response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the backend.
        status: reqwest::StatusCode,
        /// Response body associated with the failure.
        body: String,
    },
    /// Stored payload could not be encoded or decoded.
    #[error("invalid stored record: {0}")]
    InvalidRecord(String),
    /// Local filesystem access failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Store settings are missing or malformed.
    #[error("invalid text store configuration: {0}")]
    Config(String),
}

/// Stage-level failure while persisting extracted text.
#[derive(Debug, Error)]
#[error("failed to persist text for '{document_id}': {reason}")]
pub struct PersistenceError {
    /// Document whose text was being written.
    pub document_id: String,
    /// Underlying cause.
    pub reason: String,
}

/// Extracted text as stored for one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRecord {
    /// Concatenated page text.
    pub text: String,
    /// Hex-encoded SHA-256 of `text`.
    pub content_hash: String,
    /// RFC 3339 timestamp of the extraction that produced this record.
    pub extracted_at: String,
}

impl TextRecord {
    /// Build a record for `text`, stamped with the current time.
    pub fn new(text: String) -> Self {
        let extracted_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_else(|_| OffsetDateTime::now_utc().unix_timestamp().to_string());
        Self {
            content_hash: content_hash(&text),
            text,
            extracted_at,
        }
    }
}

/// Hex-encoded SHA-256 digest of `text`.
pub fn content_hash(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

/// Keyed store for extracted text.
#[async_trait]
pub trait TextStore: Send + Sync {
    /// Insert or overwrite the record stored under `document_id`.
    async fn upsert(&self, document_id: &str, record: &TextRecord) -> Result<(), TextStoreError>;

    /// Read the record stored under `document_id`, if any.
    async fn fetch(&self, document_id: &str) -> Result<Option<TextRecord>, TextStoreError>;
}
