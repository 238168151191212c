//! Answer synthesis: one completion per question against a document's full text.

mod prompt;
mod synthesizer;

pub use prompt::{SYSTEM_PROMPT, build_prompt, estimate_prompt_tokens};
pub use synthesizer::{AnswerOptions, AnswerSynthesizer, QuestionAnswer};
pub(crate) use synthesizer::is_blank_question;
