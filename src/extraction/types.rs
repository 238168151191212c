//! Decoder contract and extraction errors.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by a PDF decoder backend.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Bytes could not be parsed as a paginated document.
    #[error("unsupported or corrupt document: {0}")]
    Open(String),
    /// A page exists but its text could not be produced.
    #[error("failed to read text of page {index}: {reason}")]
    Page {
        /// Zero-based page index.
        index: usize,
        /// Backend message.
        reason: String,
    },
}

/// Stage-level failures of text extraction.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The downloaded file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The decoder rejected the document.
    #[error("failed to open document: {0}")]
    Open(String),
    /// A page failed mid-extraction.
    #[error("failed to extract page {index}: {reason}")]
    Page {
        /// Zero-based page index.
        index: usize,
        /// Backend message.
        reason: String,
    },
    /// Extraction finished but produced no text.
    #[error("no text extracted from the document")]
    Empty,
    /// The blocking extraction task did not complete.
    #[error("extraction task aborted: {0}")]
    Aborted(String),
}

impl From<DecodeError> for ExtractionError {
    fn from(error: DecodeError) -> Self {
        match error {
            DecodeError::Open(reason) => Self::Open(reason),
            DecodeError::Page { index, reason } => Self::Page { index, reason },
        }
    }
}

/// Opens PDF byte streams.
pub trait PdfDecoder: Send + Sync {
    /// Parse `bytes` into a paginated document handle.
    fn open(&self, bytes: &[u8]) -> Result<Box<dyn PdfPages>, DecodeError>;
}

/// An opened, paginated document.
pub trait PdfPages: Send {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Plain text of the page at zero-based `index`.
    fn page_text(&self, index: usize) -> Result<String, DecodeError>;
}
