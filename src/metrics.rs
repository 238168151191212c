//! In-process counters for pipeline activity.

use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing pipeline activity.
#[derive(Default)]
pub struct PipelineMetrics {
    documents_uploaded: AtomicU64,
    documents_extracted: AtomicU64,
    question_batches: AtomicU64,
    answers_produced: AtomicU64,
    questions_skipped: AtomicU64,
    workflow_failures: AtomicU64,
}

impl PipelineMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful upload.
    pub fn record_upload(&self) {
        self.documents_uploaded.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a completed extract-and-persist workflow.
    pub fn record_extraction(&self) {
        self.documents_extracted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a completed question batch, split into answered and skipped questions.
    pub fn record_batch(&self, answered: u64, skipped: u64) {
        self.question_batches.fetch_add(1, Ordering::Relaxed);
        self.answers_produced.fetch_add(answered, Ordering::Relaxed);
        self.questions_skipped.fetch_add(skipped, Ordering::Relaxed);
    }

    /// Record a workflow that terminated in a failed stage.
    pub fn record_failure(&self) {
        self.workflow_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_uploaded: self.documents_uploaded.load(Ordering::Relaxed),
            documents_extracted: self.documents_extracted.load(Ordering::Relaxed),
            question_batches: self.question_batches.load(Ordering::Relaxed),
            answers_produced: self.answers_produced.load(Ordering::Relaxed),
            questions_skipped: self.questions_skipped.load(Ordering::Relaxed),
            workflow_failures: self.workflow_failures.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of pipeline counters used for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Documents stored through the upload operation since startup.
    pub documents_uploaded: u64,
    /// Documents whose text was extracted and persisted.
    pub documents_extracted: u64,
    /// Question batches resolved (including batches with skipped questions).
    pub question_batches: u64,
    /// Answers returned across all batches.
    pub answers_produced: u64,
    /// Non-blank questions dropped because synthesis failed.
    pub questions_skipped: u64,
    /// Workflows that ended in a failed stage.
    pub workflow_failures: u64,
}
