//! Pipeline orchestration: upload, listing, extract-and-persist, and question answering.

mod service;
pub mod types;
mod workflow;

pub use service::{DocumentApi, PipelineComponents, PipelineOptions, PipelineService};
pub use types::{
    AnswerOutcome, ExtractOutcome, PipelineBuildError, PipelineFailure, Stage, TextSource,
};
pub use workflow::{WorkflowKind, WorkflowState};
