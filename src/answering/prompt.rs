//! Prompt assembly and token estimates.

use std::sync::OnceLock;
use tiktoken_rs::{CoreBPE, cl100k_base};

/// Instruction sent as the system message with every question.
pub const SYSTEM_PROMPT: &str = "You are an assistant that answers questions based on PDF content.";

/// Embed the full document text and the question into one user prompt.
pub fn build_prompt(text: &str, question: &str) -> String {
    format!("PDF Content:\n{text}\n\nQuestion: {question}")
}

/// Approximate token count of `prompt` using the `cl100k_base` vocabulary.
///
/// Returns `None` if the tokenizer could not be loaded.
pub fn estimate_prompt_tokens(prompt: &str) -> Option<usize> {
    static BPE: OnceLock<Option<CoreBPE>> = OnceLock::new();
    BPE.get_or_init(|| match cl100k_base() {
        Ok(bpe) => Some(bpe),
        Err(error) => {
            tracing::warn!(error = %error, "Tokenizer unavailable; prompt sizes will not be checked");
            None
        }
    })
    .as_ref()
    .map(|bpe| bpe.encode_with_special_tokens(prompt).len())
}
