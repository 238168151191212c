//! Outcomes and failures of pipeline workflows.

use crate::answering::QuestionAnswer;
use crate::completion::CompletionError;
use crate::storage::BlobError;
use crate::text_store::TextStoreError;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Pipeline stage a workflow can be in, or fail in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Uploading a local file to the blob store.
    Storing,
    /// Enumerating stored documents.
    Listing,
    /// Downloading a document from the blob store.
    Fetching,
    /// Turning the downloaded PDF into text.
    Extracting,
    /// Writing extracted text to the text store.
    Persisting,
    /// Answering questions against extracted text.
    Synthesizing,
}

impl Stage {
    /// Lowercase stage name used in logs and responses.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Storing => "storing",
            Self::Listing => "listing",
            Self::Fetching => "fetching",
            Self::Extracting => "extracting",
            Self::Persisting => "persisting",
            Self::Synthesizing => "synthesizing",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal failure of a workflow: the stage that failed and why.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{stage} stage failed: {reason}")]
pub struct PipelineFailure {
    /// Stage that short-circuited the workflow.
    pub stage: Stage,
    /// Underlying cause.
    pub reason: String,
}

impl PipelineFailure {
    /// Tag `reason` with the failing `stage`.
    pub fn new(stage: Stage, reason: impl fmt::Display) -> Self {
        Self {
            stage,
            reason: reason.to_string(),
        }
    }
}

/// Result of a successful extract-and-persist run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOutcome {
    /// Document the text belongs to.
    pub document_id: String,
    /// Extracted and persisted text.
    pub text: String,
    /// SHA-256 of `text` as stored.
    pub content_hash: String,
}

/// Where the text used for answering came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextSource {
    /// Downloaded and extracted for this request.
    Extracted,
    /// Read from the text store.
    Persisted,
}

/// Result of a successful answer-questions run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOutcome {
    /// Document the questions were asked about.
    pub document_id: String,
    /// Answers for the questions that succeeded, in input order.
    pub answers: Vec<QuestionAnswer>,
    /// Origin of the document text.
    pub text_source: TextSource,
}

/// Errors raised while wiring production collaborators from configuration.
#[derive(Debug, Error)]
pub enum PipelineBuildError {
    /// Blob store could not be initialized.
    #[error("failed to initialize blob store: {0}")]
    BlobStore(#[from] BlobError),
    /// Text store could not be initialized.
    #[error("failed to initialize text store: {0}")]
    TextStore(#[from] TextStoreError),
    /// Completion client could not be initialized.
    #[error("failed to initialize completion client: {0}")]
    Completion(#[from] CompletionError),
}
