//! Language-model completion clients used by the answer synthesizer.
//!
//! Both adapters issue HTTP requests directly with `reqwest`: the OpenAI client talks to any
//! `/chat/completions`-compatible server, the Ollama client to a local runtime's
//! `/api/generate` endpoint.

mod ollama;
mod openai;

use crate::config::{CompletionProvider, Config};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

pub use ollama::OllamaCompletionClient;
pub use openai::OpenAiCompletionClient;

/// Errors surfaced while requesting a completion.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// Provider was misconfigured or unreachable.
    #[error("Completion provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// Provider returned an error response (quota, rate limit, server error).
    #[error("Failed to generate completion: {0}")]
    GenerationFailed(String),
    /// Provider response could not be parsed or carried no content.
    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
}

/// A single prompt sent to the completion service.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Optional instruction establishing the assistant's role.
    pub system: Option<String>,
    /// User prompt.
    pub prompt: String,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
}

/// Interface implemented by completion providers.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Model identifier requests are sent to.
    fn model(&self) -> &str;

    /// Generate a completion for `request`.
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError>;
}

/// Build the completion client selected by configuration.
pub fn completion_client_from_config(
    config: &Config,
) -> Result<Arc<dyn CompletionClient>, CompletionError> {
    match config.completion_provider {
        CompletionProvider::OpenAI => {
            let api_key = config.openai_api_key.clone().ok_or_else(|| {
                CompletionError::ProviderUnavailable("OPENAI_API_KEY is not set".into())
            })?;
            let base_url = config
                .openai_base_url
                .clone()
                .unwrap_or_else(|| openai::DEFAULT_OPENAI_URL.to_string());
            Ok(Arc::new(OpenAiCompletionClient::new(
                base_url,
                api_key,
                config.completion_model.clone(),
            )?))
        }
        CompletionProvider::Ollama => {
            let base_url = config
                .ollama_url
                .clone()
                .unwrap_or_else(|| ollama::DEFAULT_OLLAMA_URL.to_string());
            Ok(Arc::new(OllamaCompletionClient::new(
                base_url,
                config.completion_model.clone(),
            )?))
        }
    }
}

fn http_client(user_agent: &str) -> Result<reqwest::Client, CompletionError> {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .build()
        .map_err(|error| {
            CompletionError::ProviderUnavailable(format!("failed to build HTTP client: {error}"))
        })
}
