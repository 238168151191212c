use crate::answering::prompt::{SYSTEM_PROMPT, build_prompt, estimate_prompt_tokens};
use crate::completion::{CompletionClient, CompletionError, CompletionRequest};
use crate::config::Config;
use futures_util::{StreamExt, future, stream};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tiktoken_rs::model::get_context_size;

/// A question paired with the answer produced for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionAnswer {
    /// Question text exactly as supplied.
    pub question: String,
    /// Trimmed model answer.
    pub answer: String,
}

/// Sampling and batching parameters for answer synthesis.
#[derive(Debug, Clone, Copy)]
pub struct AnswerOptions {
    /// Upper bound on tokens generated per answer.
    pub max_tokens: u32,
    /// Sampling temperature; kept low for fact retrieval.
    pub temperature: f32,
    /// Questions in flight at once. Output order never depends on this.
    pub concurrency: usize,
}

impl Default for AnswerOptions {
    fn default() -> Self {
        Self {
            max_tokens: 100,
            temperature: 0.5,
            concurrency: 1,
        }
    }
}

impl AnswerOptions {
    /// Read answer parameters from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_tokens: config.answer_max_tokens,
            temperature: config.answer_temperature,
            concurrency: config.answer_concurrency.max(1),
        }
    }
}

/// Resolves a batch of questions against one document's text.
#[derive(Clone)]
pub struct AnswerSynthesizer {
    client: Arc<dyn CompletionClient>,
    options: AnswerOptions,
}

impl AnswerSynthesizer {
    /// Create a synthesizer over `client`.
    pub fn new(client: Arc<dyn CompletionClient>, options: AnswerOptions) -> Self {
        Self { client, options }
    }

    /// Answer every non-blank question, in input order.
    ///
    /// Questions whose completion fails are logged and left out, so the result may be shorter
    /// than the input. The batch itself never fails.
    pub async fn answer_all(&self, text: &str, questions: &[String]) -> Vec<QuestionAnswer> {
        let asked: Vec<&String> = questions
            .iter()
            .filter(|question| !is_blank_question(question))
            .collect();
        if asked.is_empty() {
            return Vec::new();
        }
        self.warn_if_oversized(text);

        let pending: Vec<_> = asked
            .into_iter()
            .map(|question| async move {
                match self.answer_one(text, question).await {
                    Ok(answer) => Some(QuestionAnswer {
                        question: question.clone(),
                        answer,
                    }),
                    Err(error) => {
                        tracing::warn!(
                            question = %question,
                            error = %error,
                            "Skipping question after completion failure"
                        );
                        None
                    }
                }
            })
            .collect();
        stream::iter(pending)
            .buffered(self.options.concurrency.max(1))
            .filter_map(future::ready)
            .collect()
            .await
    }

    /// Answer a single question against `text`.
    pub async fn answer_one(&self, text: &str, question: &str) -> Result<String, CompletionError> {
        let answer = self
            .client
            .complete(CompletionRequest {
                system: Some(SYSTEM_PROMPT.to_string()),
                prompt: build_prompt(text, question),
                max_tokens: self.options.max_tokens,
                temperature: self.options.temperature,
            })
            .await?;
        tracing::debug!(question, chars = answer.chars().count(), "Question answered");
        Ok(answer)
    }

    fn warn_if_oversized(&self, text: &str) {
        let model = self.client.model();
        let Some(prompt_tokens) = estimate_prompt_tokens(&build_prompt(text, "")) else {
            return;
        };
        let budget = prompt_tokens + self.options.max_tokens as usize;
        let context = get_context_size(model);
        if budget > context {
            tracing::warn!(
                model,
                prompt_tokens,
                context_window = context,
                "Document text likely exceeds the model context window; answers may fail"
            );
        }
    }
}

/// Whether `question` is empty or whitespace only.
pub(crate) fn is_blank_question(question: &str) -> bool {
    question.trim().is_empty()
}
