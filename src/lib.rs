#![deny(missing_docs)]

//! Core library for pdfqa: PDF upload, text extraction, persistence, and question answering.

/// Question answering over extracted text.
pub mod answering;
/// HTTP routing and REST handlers.
pub mod api;
/// Language-model completion clients.
pub mod completion;
/// Environment-driven configuration management.
pub mod config;
/// PDF text extraction.
pub mod extraction;
/// Structured logging and tracing setup.
pub mod logging;
/// Pipeline counters.
pub mod metrics;
/// Workflow orchestration across storage, extraction, persistence, and answering.
pub mod pipeline;
/// Blob storage for uploaded documents.
pub mod storage;
/// Persistence of extracted text.
pub mod text_store;
