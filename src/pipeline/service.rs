//! Pipeline service composing blob storage, extraction, persistence, and answering.

use crate::{
    answering::{AnswerOptions, AnswerSynthesizer, is_blank_question},
    completion::completion_client_from_config,
    config::{BlobStoreKind, Config, TextStoreKind},
    extraction::{ExtractionError, LopdfDecoder, TextExtractor},
    metrics::{MetricsSnapshot, PipelineMetrics},
    pipeline::{
        types::{
            AnswerOutcome, ExtractOutcome, PipelineBuildError, PipelineFailure, Stage, TextSource,
        },
        workflow::{Workflow, WorkflowKind},
    },
    storage::{BlobStore, BlobStoreAdapter, LocalBlobStore, S3BlobStore},
    text_store::{FileTextStore, FirestoreTextStore, MemoryTextStore, TextStore, TextStoreAdapter},
};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

/// Collaborators the pipeline is built from.
pub struct PipelineComponents {
    /// Document blob storage.
    pub blobs: BlobStoreAdapter,
    /// PDF-to-text conversion.
    pub extractor: TextExtractor,
    /// Extracted-text persistence.
    pub texts: TextStoreAdapter,
    /// Question answering.
    pub synthesizer: AnswerSynthesizer,
}

/// Behavior switches for the pipeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineOptions {
    /// Answer from persisted text when present instead of re-extracting.
    pub read_through: bool,
}

/// Runs the document workflows against injected collaborators.
///
/// Holds no per-request state: every call builds its own workflow, so one instance can be
/// shared through an `Arc` by the HTTP handlers and the CLI alike.
pub struct PipelineService {
    blobs: BlobStoreAdapter,
    extractor: TextExtractor,
    texts: TextStoreAdapter,
    synthesizer: AnswerSynthesizer,
    options: PipelineOptions,
    metrics: Arc<PipelineMetrics>,
}

/// Operations exposed to transport layers (HTTP, CLI).
#[async_trait]
pub trait DocumentApi: Send + Sync {
    /// Upload the file at `path`; returns its key.
    async fn upload_document(&self, path: &Path) -> Result<String, PipelineFailure>;

    /// Upload bytes received under `file_name`; returns their key.
    async fn upload_bytes(&self, file_name: &str, bytes: Vec<u8>)
    -> Result<String, PipelineFailure>;

    /// List stored document keys.
    async fn list_documents(&self) -> Result<Vec<String>, PipelineFailure>;

    /// Read a stored document's bytes.
    async fn download_document(&self, document_id: &str) -> Result<Vec<u8>, PipelineFailure>;

    /// Fetch, extract, and persist a document's text.
    async fn extract_and_persist(&self, document_id: &str)
    -> Result<ExtractOutcome, PipelineFailure>;

    /// Fetch and extract a document, then answer each question against its text.
    async fn answer_questions(
        &self,
        document_id: &str,
        questions: Vec<String>,
    ) -> Result<AnswerOutcome, PipelineFailure>;

    /// Current pipeline counters.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl PipelineService {
    /// Assemble a service from explicitly constructed collaborators.
    pub fn new(components: PipelineComponents, options: PipelineOptions) -> Self {
        let PipelineComponents {
            blobs,
            extractor,
            texts,
            synthesizer,
        } = components;
        Self {
            blobs,
            extractor,
            texts,
            synthesizer,
            options,
            metrics: Arc::new(PipelineMetrics::new()),
        }
    }

    /// Wire the production collaborators selected by `config`.
    pub async fn from_config(config: &Config) -> Result<Self, PipelineBuildError> {
        tracing::info!(backend = ?config.blob_store, "Initializing blob store");
        let blob_store: Arc<dyn BlobStore> = match config.blob_store {
            BlobStoreKind::S3 => Arc::new(S3BlobStore::from_config(config).await?),
            BlobStoreKind::Local => Arc::new(LocalBlobStore::new(&config.local_blob_dir)),
        };

        tracing::info!(backend = ?config.text_store, "Initializing text store");
        let text_store: Arc<dyn TextStore> = match config.text_store {
            TextStoreKind::Firestore => Arc::new(FirestoreTextStore::from_config(config)?),
            TextStoreKind::File => Arc::new(FileTextStore::new(&config.text_store_dir)),
            TextStoreKind::Memory => Arc::new(MemoryTextStore::new()),
        };

        tracing::info!(
            provider = ?config.completion_provider,
            model = %config.completion_model,
            "Initializing completion client"
        );
        let completion = completion_client_from_config(config)?;

        let components = PipelineComponents {
            blobs: BlobStoreAdapter::new(
                blob_store,
                &config.scratch_dir,
                &config.document_extension,
            ),
            extractor: TextExtractor::new(Arc::new(LopdfDecoder::new())),
            texts: TextStoreAdapter::new(text_store),
            synthesizer: AnswerSynthesizer::new(completion, AnswerOptions::from_config(config)),
        };
        let options = PipelineOptions {
            read_through: config.read_through_text_store,
        };
        Ok(Self::new(components, options))
    }

    /// Upload the file at `path` to the blob store, keyed by its base name.
    pub async fn upload_document(&self, path: &Path) -> Result<String, PipelineFailure> {
        let key = self
            .blobs
            .store(path)
            .await
            .map_err(|error| self.failed(PipelineFailure::new(Stage::Storing, error)))?;
        self.metrics.record_upload();
        Ok(key)
    }

    /// Upload bytes received over the wire, keyed by the base name of `file_name`.
    pub async fn upload_bytes(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<String, PipelineFailure> {
        let key = self
            .blobs
            .store_bytes(file_name, bytes)
            .await
            .map_err(|error| self.failed(PipelineFailure::new(Stage::Storing, error)))?;
        self.metrics.record_upload();
        Ok(key)
    }

    /// List stored document keys with the configured extension.
    pub async fn list_documents(&self) -> Result<Vec<String>, PipelineFailure> {
        self.blobs
            .list()
            .await
            .map_err(|error| self.failed(PipelineFailure::new(Stage::Listing, error)))
    }

    /// Read a stored document's bytes.
    pub async fn download_document(&self, document_id: &str) -> Result<Vec<u8>, PipelineFailure> {
        self.blobs
            .read(document_id)
            .await
            .map_err(|error| self.failed(PipelineFailure::new(Stage::Fetching, error)))
    }

    /// Fetching → Extracting → Persisting. `Done` carries the persisted text.
    pub async fn extract_and_persist(
        &self,
        document_id: &str,
    ) -> Result<ExtractOutcome, PipelineFailure> {
        let mut workflow = Workflow::start(WorkflowKind::ExtractAndPersist, document_id);
        let text = self
            .fetch_and_extract(&mut workflow, document_id)
            .await
            .map_err(|failure| self.failed(failure))?;

        workflow.enter(Stage::Persisting);
        let record = match self.texts.persist(document_id, &text).await {
            Ok(record) => record,
            Err(error) => return Err(self.failed(workflow.fail(error))),
        };

        workflow.finish();
        self.metrics.record_extraction();
        tracing::info!(document_id, chars = text.chars().count(), "Text extracted and stored");
        Ok(ExtractOutcome {
            document_id: document_id.to_string(),
            text,
            content_hash: record.content_hash,
        })
    }

    /// Fetching → Extracting → Synthesizing. `Done` carries the answers that succeeded.
    pub async fn answer_questions(
        &self,
        document_id: &str,
        questions: &[String],
    ) -> Result<AnswerOutcome, PipelineFailure> {
        let mut workflow = Workflow::start(WorkflowKind::AnswerQuestions, document_id);

        let (text, text_source) = match self.persisted_text(document_id).await {
            Some(text) => (text, TextSource::Persisted),
            None => {
                let text = self
                    .fetch_and_extract(&mut workflow, document_id)
                    .await
                    .map_err(|failure| self.failed(failure))?;
                (text, TextSource::Extracted)
            }
        };

        workflow.enter(Stage::Synthesizing);
        let answers = self.synthesizer.answer_all(&text, questions).await;
        workflow.finish();

        let asked = questions
            .iter()
            .filter(|question| !is_blank_question(question))
            .count();
        let skipped = asked.saturating_sub(answers.len());
        self.metrics
            .record_batch(answers.len() as u64, skipped as u64);
        tracing::info!(
            document_id,
            asked,
            answered = answers.len(),
            skipped,
            source = ?text_source,
            "Questions answered"
        );

        Ok(AnswerOutcome {
            document_id: document_id.to_string(),
            answers,
            text_source,
        })
    }

    /// Return the current pipeline counters.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    async fn fetch_and_extract(
        &self,
        workflow: &mut Workflow<'_>,
        document_id: &str,
    ) -> Result<String, PipelineFailure> {
        workflow.enter(Stage::Fetching);
        let scratch = self
            .blobs
            .fetch(document_id)
            .await
            .map_err(|error| workflow.fail(error))?;

        workflow.enter(Stage::Extracting);
        let text = self
            .extractor
            .extract(scratch.path())
            .await
            .map_err(|error| workflow.fail(error))?;
        // Whitespace-only output (image-only scans) counts as no text.
        if text.trim().is_empty() {
            return Err(workflow.fail(ExtractionError::Empty));
        }
        Ok(text)
    }

    async fn persisted_text(&self, document_id: &str) -> Option<String> {
        if !self.options.read_through {
            return None;
        }
        match self.texts.lookup(document_id).await {
            Ok(Some(text)) if !text.trim().is_empty() => {
                tracing::debug!(document_id, "Using persisted text");
                Some(text)
            }
            Ok(_) => None,
            Err(error) => {
                tracing::warn!(document_id, error = %error, "Text store lookup failed; re-extracting");
                None
            }
        }
    }

    fn failed(&self, failure: PipelineFailure) -> PipelineFailure {
        self.metrics.record_failure();
        failure
    }
}

#[async_trait]
impl DocumentApi for PipelineService {
    async fn upload_document(&self, path: &Path) -> Result<String, PipelineFailure> {
        PipelineService::upload_document(self, path).await
    }

    async fn upload_bytes(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<String, PipelineFailure> {
        PipelineService::upload_bytes(self, file_name, bytes).await
    }

    async fn list_documents(&self) -> Result<Vec<String>, PipelineFailure> {
        PipelineService::list_documents(self).await
    }

    async fn download_document(&self, document_id: &str) -> Result<Vec<u8>, PipelineFailure> {
        PipelineService::download_document(self, document_id).await
    }

    async fn extract_and_persist(
        &self,
        document_id: &str,
    ) -> Result<ExtractOutcome, PipelineFailure> {
        PipelineService::extract_and_persist(self, document_id).await
    }

    async fn answer_questions(
        &self,
        document_id: &str,
        questions: Vec<String>,
    ) -> Result<AnswerOutcome, PipelineFailure> {
        PipelineService::answer_questions(self, document_id, &questions).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        PipelineService::metrics_snapshot(self)
    }
}
