//! HTTP surface for pdfqa.
//!
//! This module exposes a compact Axum router over the document pipeline:
//!
//! - `POST /upload` – Multipart upload (field `file`); stores the PDF under its file name.
//! - `GET /pdfs` – List stored PDF keys.
//! - `GET /pdf/{key}` – Download a stored PDF.
//! - `POST /extract` – Extract a stored PDF's text and persist it (`{ "pdf_key": ... }`).
//! - `POST /ask` – Answer a batch of questions about a stored PDF
//!   (`{ "pdf_key": ..., "questions": [...] }`).
//! - `GET /metrics` – Pipeline counters.
//! - `GET /commands` – Machine-readable command catalog for quick discovery by tools/hosts.
//!
//! Pipeline failures are reported as `500` with `{ "error": ..., "stage": ... }`.

use crate::answering::QuestionAnswer;
use crate::metrics::MetricsSnapshot;
use crate::pipeline::{DocumentApi, PipelineFailure};
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path as UrlPath, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;

const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Build the HTTP router exposing the document API surface.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: DocumentApi + 'static,
{
    Router::new()
        .route(
            "/upload",
            post(upload_document::<S>).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/pdfs", get(list_documents::<S>))
        .route("/pdf/*key", get(download_document::<S>))
        .route("/extract", post(extract_text::<S>))
        .route("/ask", post(ask_questions::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route("/commands", get(get_commands))
        .with_state(service)
}

/// Success response for `POST /upload`.
#[derive(Serialize)]
struct UploadResponse {
    message: &'static str,
    pdf_key: String,
}

/// Hand the multipart `file` field to the pipeline under its base file name.
async fn upload_document<S>(
    State(service): State<Arc<S>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError>
where
    S: DocumentApi,
{
    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| AppError::BadRequest(format!("Failed to read form field: {error}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field
            .file_name()
            .and_then(|name| Path::new(name).file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let data = field
            .bytes()
            .await
            .map_err(|error| AppError::BadRequest(format!("Failed to read file data: {error}")))?;
        upload = Some((file_name, data.to_vec()));
    }

    let Some((file_name, data)) = upload else {
        return Err(AppError::BadRequest("No file part".into()));
    };
    if file_name.is_empty() {
        return Err(AppError::BadRequest("No selected file".into()));
    }

    let size = data.len();
    let pdf_key = service.upload_bytes(&file_name, data).await?;
    tracing::info!(pdf_key = %pdf_key, bytes = size, "Upload request completed");
    Ok(Json(UploadResponse {
        message: "Upload successful",
        pdf_key,
    }))
}

/// Response body for `GET /pdfs`.
#[derive(Serialize)]
struct DocumentsResponse {
    pdf_files: Vec<String>,
}

/// List stored PDF keys.
async fn list_documents<S>(
    State(service): State<Arc<S>>,
) -> Result<Json<DocumentsResponse>, AppError>
where
    S: DocumentApi,
{
    let pdf_files = service.list_documents().await?;
    Ok(Json(DocumentsResponse { pdf_files }))
}

/// Stream a stored PDF back to the caller.
async fn download_document<S>(
    State(service): State<Arc<S>>,
    UrlPath(key): UrlPath<String>,
) -> Result<Response, AppError>
where
    S: DocumentApi,
{
    let bytes = service.download_document(&key).await?;
    Ok(([(header::CONTENT_TYPE, "application/pdf")], bytes).into_response())
}

/// Request body for `POST /extract`.
#[derive(Deserialize)]
struct ExtractRequest {
    /// Key of the stored PDF.
    pdf_key: String,
}

/// Success response for `POST /extract`.
#[derive(Serialize)]
struct ExtractResponse {
    message: &'static str,
    text: String,
}

/// Extract a stored PDF's text and persist it.
async fn extract_text<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<ExtractRequest>,
) -> Result<Json<ExtractResponse>, AppError>
where
    S: DocumentApi,
{
    let outcome = service.extract_and_persist(&request.pdf_key).await?;
    Ok(Json(ExtractResponse {
        message: "Text extracted and stored successfully",
        text: outcome.text,
    }))
}

/// Request body for `POST /ask`.
#[derive(Deserialize)]
struct AskRequest {
    /// Key of the stored PDF.
    pdf_key: String,
    /// Questions to answer; blank entries are ignored.
    #[serde(default)]
    questions: Vec<String>,
}

/// Success response for `POST /ask`.
#[derive(Serialize)]
struct AskResponse {
    message: &'static str,
    qa: Vec<QuestionAnswer>,
}

/// Answer a batch of questions about a stored PDF.
async fn ask_questions<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>, AppError>
where
    S: DocumentApi,
{
    let outcome = service
        .answer_questions(&request.pdf_key, request.questions)
        .await?;
    Ok(Json(AskResponse {
        message: "Questions answered successfully",
        qa: outcome.answers,
    }))
}

/// Return the pipeline counters.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<MetricsSnapshot>
where
    S: DocumentApi,
{
    Json(service.metrics_snapshot())
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<serde_json::Value>,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery/UX in hosts and tools.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "upload",
                method: "POST",
                path: "/upload",
                description: "Upload a PDF as multipart field `file`. Response returns { \"pdf_key\": string }.",
                request_example: None,
            },
            CommandDescriptor {
                name: "list",
                method: "GET",
                path: "/pdfs",
                description: "Return the keys of stored PDFs.",
                request_example: None,
            },
            CommandDescriptor {
                name: "download",
                method: "GET",
                path: "/pdf/{key}",
                description: "Return the stored PDF bytes.",
                request_example: None,
            },
            CommandDescriptor {
                name: "extract",
                method: "POST",
                path: "/extract",
                description: "Extract a stored PDF's text, persist it, and return it.",
                request_example: Some(json!({ "pdf_key": "report.pdf" })),
            },
            CommandDescriptor {
                name: "ask",
                method: "POST",
                path: "/ask",
                description: "Answer questions about a stored PDF. Failed or blank questions are omitted from `qa`.",
                request_example: Some(json!({
                    "pdf_key": "report.pdf",
                    "questions": ["Who wrote this report?"]
                })),
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return pipeline counters useful for observability dashboards.",
                request_example: None,
            },
        ],
    })
}

enum AppError {
    BadRequest(String),
    Failure(PipelineFailure),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            Self::Failure(failure) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": failure.to_string(), "stage": failure.stage })),
            )
                .into_response(),
        }
    }
}

impl From<PipelineFailure> for AppError {
    fn from(inner: PipelineFailure) -> Self {
        Self::Failure(inner)
    }
}

#[cfg(test)]
mod tests {
    use super::{create_router, get_commands};
    use crate::answering::QuestionAnswer;
    use crate::metrics::MetricsSnapshot;
    use crate::pipeline::{
        AnswerOutcome, DocumentApi, ExtractOutcome, PipelineFailure, Stage, TextSource,
    };
    use async_trait::async_trait;
    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode},
    };
    use serde_json::json;
    use std::path::Path;
    use std::sync::Arc;
    use tokio::sync::Mutex;
    use tower::ServiceExt;

    #[tokio::test]
    async fn commands_catalog_exposes_ask_endpoint() {
        let response = get_commands().await;
        let commands = response.0.commands;
        let ask = commands
            .iter()
            .find(|cmd| cmd.name == "ask")
            .expect("ask command present");

        assert_eq!(ask.method, "POST");
        assert_eq!(ask.path, "/ask");
        assert!(commands.iter().any(|cmd| cmd.path == "/upload"));
    }

    #[tokio::test]
    async fn ask_route_forwards_questions_and_returns_pairs() {
        let service = Arc::new(StubDocumentService::default());
        let app = create_router(service.clone());

        let payload = json!({
            "pdf_key": "report.pdf",
            "questions": ["Who said hello?", ""]
        });
        let response = app
            .oneshot(json_request(Method::POST, "/ask", payload))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["qa"][0]["question"], "Who said hello?");
        assert_eq!(json["qa"][0]["answer"], "answer to Who said hello?");
        assert_eq!(json["qa"].as_array().expect("qa array").len(), 1);

        let calls = service.calls.lock().await;
        assert_eq!(calls.as_slice(), ["ask:report.pdf:2"]);
    }

    #[tokio::test]
    async fn pipeline_failure_maps_to_tagged_error() {
        let service = Arc::new(StubDocumentService::default());
        let app = create_router(service);

        let response = app
            .oneshot(json_request(
                Method::POST,
                "/extract",
                json!({ "pdf_key": "missing.pdf" }),
            ))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["stage"], "fetching");
        assert!(
            json["error"]
                .as_str()
                .expect("error string")
                .contains("missing.pdf")
        );
    }

    #[tokio::test]
    async fn extract_route_returns_text() {
        let service = Arc::new(StubDocumentService::default());
        let app = create_router(service);

        let response = app
            .oneshot(json_request(
                Method::POST,
                "/extract",
                json!({ "pdf_key": "report.pdf" }),
            ))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["text"], "Hello World");
    }

    #[tokio::test]
    async fn upload_forwards_file_bytes() {
        let service = Arc::new(StubDocumentService::default());
        let app = create_router(service.clone());

        let response = app
            .oneshot(multipart_request("scans/report.pdf", "%PDF-1.4 body"))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["pdf_key"], "report.pdf");

        let calls = service.calls.lock().await;
        assert_eq!(calls.as_slice(), ["upload:report.pdf:%PDF-1.4 body"]);
    }

    #[tokio::test]
    async fn upload_storage_failure_maps_to_storing_stage() {
        let service = Arc::new(StubDocumentService::default());
        let app = create_router(service);

        let response = app
            .oneshot(multipart_request("../private/locked.pdf", "%PDF-1.4"))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["stage"], "storing");
        assert!(
            json["error"]
                .as_str()
                .expect("error string")
                .contains("read-only")
        );
    }

    #[tokio::test]
    async fn upload_without_file_part_is_bad_request() {
        let service = Arc::new(StubDocumentService::default());
        let app = create_router(service);

        let boundary = "pdfqa-boundary";
        let body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nhello\r\n--{boundary}--\r\n"
        );
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/upload")
                    .header(
                        "content-type",
                        format!("multipart/form-data; boundary={boundary}"),
                    )
                    .body(Body::from(body))
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "No file part");
    }

    #[tokio::test]
    async fn list_and_download_routes() {
        let service = Arc::new(StubDocumentService::default());
        let app = create_router(service);

        let response = app
            .clone()
            .oneshot(empty_request("/pdfs"))
            .await
            .expect("list response");
        assert_eq!(body_json(response).await["pdf_files"], json!(["report.pdf"]));

        let response = app
            .oneshot(empty_request("/pdf/reports/report.pdf"))
            .await
            .expect("download response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["content-type"],
            "application/pdf"
        );
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        assert_eq!(&bytes[..], b"pdf:reports/report.pdf");
    }

    fn json_request(method: Method, uri: &str, payload: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(payload.to_string()))
            .expect("request")
    }

    fn multipart_request(file_name: &str, contents: &str) -> Request<Body> {
        let boundary = "pdfqa-boundary";
        let body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: application/pdf\r\n\r\n{contents}\r\n--{boundary}--\r\n"
        );
        Request::builder()
            .method(Method::POST)
            .uri("/upload")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .expect("request")
    }

    fn empty_request(uri: &str) -> Request<Body> {
        Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .expect("request")
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        serde_json::from_slice(&body).expect("json body")
    }

    #[derive(Default)]
    struct StubDocumentService {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl DocumentApi for StubDocumentService {
        async fn upload_document(&self, path: &Path) -> Result<String, PipelineFailure> {
            Ok(path.display().to_string())
        }

        async fn upload_bytes(
            &self,
            file_name: &str,
            bytes: Vec<u8>,
        ) -> Result<String, PipelineFailure> {
            if file_name == "locked.pdf" {
                return Err(PipelineFailure::new(Stage::Storing, "bucket is read-only"));
            }
            let contents = String::from_utf8(bytes).expect("utf8 body");
            self.calls
                .lock()
                .await
                .push(format!("upload:{file_name}:{contents}"));
            Ok(file_name.to_string())
        }

        async fn list_documents(&self) -> Result<Vec<String>, PipelineFailure> {
            Ok(vec!["report.pdf".into()])
        }

        async fn download_document(&self, document_id: &str) -> Result<Vec<u8>, PipelineFailure> {
            Ok(format!("pdf:{document_id}").into_bytes())
        }

        async fn extract_and_persist(
            &self,
            document_id: &str,
        ) -> Result<ExtractOutcome, PipelineFailure> {
            if document_id == "missing.pdf" {
                return Err(PipelineFailure::new(
                    Stage::Fetching,
                    format!("object not found: {document_id}"),
                ));
            }
            Ok(ExtractOutcome {
                document_id: document_id.into(),
                text: "Hello World".into(),
                content_hash: "hash".into(),
            })
        }

        async fn answer_questions(
            &self,
            document_id: &str,
            questions: Vec<String>,
        ) -> Result<AnswerOutcome, PipelineFailure> {
            self.calls
                .lock()
                .await
                .push(format!("ask:{document_id}:{}", questions.len()));
            let answers = questions
                .into_iter()
                .filter(|question| !question.is_empty())
                .map(|question| QuestionAnswer {
                    answer: format!("answer to {question}"),
                    question,
                })
                .collect();
            Ok(AnswerOutcome {
                document_id: document_id.into(),
                answers,
                text_source: TextSource::Extracted,
            })
        }

        fn metrics_snapshot(&self) -> MetricsSnapshot {
            MetricsSnapshot::default()
        }
    }
}
