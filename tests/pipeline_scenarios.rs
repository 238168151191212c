use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use pdfqa::{
    answering::{AnswerOptions, AnswerSynthesizer},
    completion::{CompletionClient, CompletionError, CompletionRequest},
    extraction::{DecodeError, PdfDecoder, PdfPages, TextExtractor},
    pipeline::{PipelineComponents, PipelineOptions, PipelineService, Stage, TextSource},
    storage::{BlobStore, BlobStoreAdapter, LocalBlobStore},
    text_store::{MemoryTextStore, TextRecord, TextStore, TextStoreAdapter, TextStoreError},
};
use tempfile::TempDir;

/// Decoder over `%PDF\n` followed by form-feed separated pages.
#[derive(Default)]
struct CountingDecoder {
    opened: AtomicUsize,
}

struct FormFeedPages(Vec<String>);

impl PdfDecoder for CountingDecoder {
    fn open(&self, bytes: &[u8]) -> Result<Box<dyn PdfPages>, DecodeError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        let text = std::str::from_utf8(bytes).map_err(|e| DecodeError::Open(e.to_string()))?;
        let pages = text
            .strip_prefix("%PDF\n")
            .ok_or_else(|| DecodeError::Open("missing header".into()))?;
        Ok(Box::new(FormFeedPages(
            pages.split('\u{c}').map(str::to_string).collect(),
        )))
    }
}

impl PdfPages for FormFeedPages {
    fn page_count(&self) -> usize {
        self.0.len()
    }

    fn page_text(&self, index: usize) -> Result<String, DecodeError> {
        Ok(self.0[index].clone())
    }
}

/// Answers `answer: <question>`; questions containing "fail" error out.
#[derive(Default)]
struct ScriptedClient {
    prompts: std::sync::Mutex<Vec<String>>,
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    fn model(&self) -> &str {
        "gpt-3.5-turbo"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        self.prompts
            .lock()
            .expect("prompts lock")
            .push(request.prompt.clone());
        let question = request
            .prompt
            .rsplit("Question: ")
            .next()
            .unwrap_or_default()
            .to_string();
        if question.contains("fail") {
            return Err(CompletionError::GenerationFailed("quota exceeded".into()));
        }
        Ok(format!("answer: {question}"))
    }
}

/// Text store whose reads and writes always fail.
struct UnavailableTextStore;

#[async_trait]
impl TextStore for UnavailableTextStore {
    async fn upsert(&self, _id: &str, _record: &TextRecord) -> Result<(), TextStoreError> {
        Err(TextStoreError::Io(std::io::Error::other("text store offline")))
    }

    async fn fetch(&self, _id: &str) -> Result<Option<TextRecord>, TextStoreError> {
        Err(TextStoreError::Io(std::io::Error::other("text store offline")))
    }
}

struct Harness {
    _dirs: TempDir,
    inbox: std::path::PathBuf,
    blobs: Arc<LocalBlobStore>,
    decoder: Arc<CountingDecoder>,
    texts: Arc<MemoryTextStore>,
    client: Arc<ScriptedClient>,
    service: PipelineService,
}

impl Harness {
    fn new(read_through: bool) -> Self {
        Self::build(read_through, None)
    }

    fn with_text_store(read_through: bool, backend: Arc<dyn TextStore>) -> Self {
        Self::build(read_through, Some(backend))
    }

    fn build(read_through: bool, backend: Option<Arc<dyn TextStore>>) -> Self {
        let dirs = tempfile::tempdir().expect("tempdir");
        let inbox = dirs.path().join("inbox");
        std::fs::create_dir_all(&inbox).expect("inbox");

        let blobs = Arc::new(LocalBlobStore::new(dirs.path().join("blobs")));
        let decoder = Arc::new(CountingDecoder::default());
        let texts = Arc::new(MemoryTextStore::new());
        let client = Arc::new(ScriptedClient::default());
        let backend: Arc<dyn TextStore> = match backend {
            Some(backend) => backend,
            None => texts.clone(),
        };

        let components = PipelineComponents {
            blobs: BlobStoreAdapter::new(blobs.clone(), dirs.path().join("scratch"), ".pdf"),
            extractor: TextExtractor::new(decoder.clone()),
            texts: TextStoreAdapter::new(backend),
            synthesizer: AnswerSynthesizer::new(
                client.clone(),
                AnswerOptions {
                    concurrency: 3,
                    ..AnswerOptions::default()
                },
            ),
        };
        let service = PipelineService::new(components, PipelineOptions { read_through });

        Self {
            _dirs: dirs,
            inbox,
            blobs,
            decoder,
            texts,
            client,
            service,
        }
    }

    async fn upload(&self, name: &str, pages: &[&str]) -> String {
        let path = self.inbox.join(name);
        std::fs::write(&path, format!("%PDF\n{}", pages.join("\u{c}"))).expect("write pdf");
        self.service
            .upload_document(&path)
            .await
            .expect("upload succeeds")
    }

    fn decodes(&self) -> usize {
        self.decoder.opened.load(Ordering::SeqCst)
    }

    fn completions(&self) -> usize {
        self.client.prompts.lock().expect("prompts lock").len()
    }
}

fn questions(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

#[tokio::test]
async fn extract_and_persist_stores_concatenated_pages() {
    let harness = Harness::new(false);
    let key = harness.upload("report.pdf", &["Hello ", "World"]).await;
    assert_eq!(key, "report.pdf");

    let outcome = harness
        .service
        .extract_and_persist("report.pdf")
        .await
        .expect("extract succeeds");

    assert_eq!(outcome.text, "Hello World");
    let stored = harness
        .texts
        .fetch("report.pdf")
        .await
        .expect("fetch")
        .expect("record persisted");
    assert_eq!(stored.text, "Hello World");
    assert_eq!(stored.content_hash, outcome.content_hash);

    let metrics = harness.service.metrics_snapshot();
    assert_eq!(metrics.documents_uploaded, 1);
    assert_eq!(metrics.documents_extracted, 1);
}

#[tokio::test]
async fn extract_and_persist_twice_overwrites_single_record() {
    let harness = Harness::new(false);
    harness.upload("report.pdf", &["Hello ", "World"]).await;

    let first = harness
        .service
        .extract_and_persist("report.pdf")
        .await
        .expect("first run");
    let second = harness
        .service
        .extract_and_persist("report.pdf")
        .await
        .expect("second run");

    assert_eq!(first.text, second.text);
    assert_eq!(first.content_hash, second.content_hash);
    assert_eq!(harness.texts.len().await, 1);
}

#[tokio::test]
async fn answer_questions_skips_blank_questions() {
    let harness = Harness::new(false);
    harness.upload("report.pdf", &["Hello ", "World"]).await;

    let outcome = harness
        .service
        .answer_questions("report.pdf", &questions(&["Who said hello?", ""]))
        .await
        .expect("answers");

    assert_eq!(outcome.text_source, TextSource::Extracted);
    assert_eq!(outcome.answers.len(), 1);
    assert_eq!(outcome.answers[0].question, "Who said hello?");
    assert_eq!(outcome.answers[0].answer, "answer: Who said hello?");

    let prompts = harness.client.prompts.lock().expect("prompts lock");
    assert_eq!(
        prompts.as_slice(),
        ["PDF Content:\nHello World\n\nQuestion: Who said hello?"]
    );
}

#[tokio::test]
async fn failing_question_is_dropped_and_order_kept() {
    let harness = Harness::new(false);
    harness.upload("report.pdf", &["Hello World"]).await;

    let outcome = harness
        .service
        .answer_questions("report.pdf", &questions(&["first", "please fail", "third"]))
        .await
        .expect("batch still succeeds");

    let asked: Vec<&str> = outcome
        .answers
        .iter()
        .map(|qa| qa.question.as_str())
        .collect();
    assert_eq!(asked, ["first", "third"]);

    let metrics = harness.service.metrics_snapshot();
    assert_eq!(metrics.question_batches, 1);
    assert_eq!(metrics.answers_produced, 2);
    assert_eq!(metrics.questions_skipped, 1);
}

#[tokio::test]
async fn missing_document_fails_at_fetching_without_extraction() {
    let harness = Harness::new(false);

    let failure = harness
        .service
        .extract_and_persist("missing.pdf")
        .await
        .expect_err("missing document");
    assert_eq!(failure.stage, Stage::Fetching);

    let failure = harness
        .service
        .answer_questions("missing.pdf", &questions(&["Anything?"]))
        .await
        .expect_err("missing document");
    assert_eq!(failure.stage, Stage::Fetching);

    assert_eq!(harness.decodes(), 0);
    assert_eq!(harness.completions(), 0);
    assert!(harness.texts.is_empty().await);
    assert_eq!(harness.service.metrics_snapshot().workflow_failures, 2);
}

#[tokio::test]
async fn whitespace_only_text_fails_at_extracting_and_persists_nothing() {
    let harness = Harness::new(false);
    harness.upload("scanned.pdf", &["", "  \n"]).await;

    let failure = harness
        .service
        .extract_and_persist("scanned.pdf")
        .await
        .expect_err("empty text");
    assert_eq!(failure.stage, Stage::Extracting);
    assert!(harness.texts.is_empty().await);

    let failure = harness
        .service
        .answer_questions("scanned.pdf", &questions(&["What is it?"]))
        .await
        .expect_err("empty text");
    assert_eq!(failure.stage, Stage::Extracting);
    assert_eq!(harness.completions(), 0);
}

#[tokio::test]
async fn read_through_answers_from_persisted_text() {
    let harness = Harness::new(true);
    harness
        .texts
        .upsert("archived.pdf", &TextRecord::new("Stored text".into()))
        .await
        .expect("seed record");

    let outcome = harness
        .service
        .answer_questions("archived.pdf", &questions(&["What is stored?"]))
        .await
        .expect("answers from store");

    assert_eq!(outcome.text_source, TextSource::Persisted);
    assert_eq!(outcome.answers.len(), 1);
    assert_eq!(harness.decodes(), 0);
}

#[tokio::test]
async fn read_through_falls_back_to_extraction() {
    let harness = Harness::new(true);
    harness.upload("report.pdf", &["Hello World"]).await;

    let outcome = harness
        .service
        .answer_questions("report.pdf", &questions(&["Who said hello?"]))
        .await
        .expect("answers");

    assert_eq!(outcome.text_source, TextSource::Extracted);
    assert_eq!(harness.decodes(), 1);
}

#[tokio::test]
async fn listing_filters_by_extension_and_download_returns_bytes() {
    let harness = Harness::new(false);
    harness.upload("b.pdf", &["B"]).await;
    harness.upload("a.pdf", &["A"]).await;
    harness
        .blobs
        .put("notes.txt", b"not a pdf".to_vec())
        .await
        .expect("put");

    let listed = harness.service.list_documents().await.expect("list");
    assert_eq!(listed, ["a.pdf", "b.pdf"]);

    let bytes = harness
        .service
        .download_document("a.pdf")
        .await
        .expect("download");
    assert_eq!(bytes, b"%PDF\nA");

    let failure = harness
        .service
        .download_document("nope.pdf")
        .await
        .expect_err("missing");
    assert_eq!(failure.stage, Stage::Fetching);
}

#[tokio::test]
async fn upload_of_missing_file_fails_at_storing() {
    let harness = Harness::new(false);
    let failure = harness
        .service
        .upload_document(Path::new("/definitely/not/here.pdf"))
        .await
        .expect_err("missing local file");
    assert_eq!(failure.stage, Stage::Storing);
}

#[tokio::test]
async fn text_store_write_failure_stops_at_persisting() {
    let harness = Harness::with_text_store(false, Arc::new(UnavailableTextStore));
    harness.upload("report.pdf", &["Hello ", "World"]).await;

    let failure = harness
        .service
        .extract_and_persist("report.pdf")
        .await
        .expect_err("store offline");

    assert_eq!(failure.stage, Stage::Persisting);
    assert!(failure.reason.contains("text store offline"));
    assert_eq!(harness.decodes(), 1);

    let metrics = harness.service.metrics_snapshot();
    assert_eq!(metrics.documents_extracted, 0);
    assert_eq!(metrics.workflow_failures, 1);
}

#[tokio::test]
async fn read_through_lookup_failure_falls_back_to_extraction() {
    let harness = Harness::with_text_store(true, Arc::new(UnavailableTextStore));
    harness.upload("report.pdf", &["Hello World"]).await;

    let outcome = harness
        .service
        .answer_questions("report.pdf", &questions(&["Who said hello?"]))
        .await
        .expect("answers after fallback");

    assert_eq!(outcome.text_source, TextSource::Extracted);
    assert_eq!(outcome.answers.len(), 1);
    assert_eq!(harness.decodes(), 1);
    assert_eq!(harness.service.metrics_snapshot().workflow_failures, 0);
}

#[tokio::test]
async fn rejected_upload_bytes_count_as_storing_failure() {
    let harness = Harness::new(false);

    let key = harness
        .service
        .upload_bytes("inbox/report.pdf", b"%PDF\nHello".to_vec())
        .await
        .expect("stored by base name");
    assert_eq!(key, "report.pdf");

    let failure = harness
        .service
        .upload_bytes("..", b"%PDF\n".to_vec())
        .await
        .expect_err("no file name");
    assert_eq!(failure.stage, Stage::Storing);

    let metrics = harness.service.metrics_snapshot();
    assert_eq!(metrics.documents_uploaded, 1);
    assert_eq!(metrics.workflow_failures, 1);
}
