//! Assistant service: render the prompt template and forward it to the
//! completion service.
//!
//! The call is a straight pass-through: no retries, no history, no tools.

use crate::llm::LlmChat;
use crate::llm::types::{LlmError, Message};

const PROMPT_TEMPLATE: &str = include_str!("../../templates/assistant_prompt.txt");
const QUERY_PLACEHOLDER: &str = "{query_str}";
const MAX_TOKENS: u32 = 1024;

#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("no query provided")]
    EmptyQuery,
    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// Trimmed query, or `None` when there is nothing to ask.
#[must_use]
pub fn normalize_query(query: &str) -> Option<&str> {
    let trimmed = query.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

#[must_use]
pub fn render_prompt(query: &str) -> String {
    PROMPT_TEMPLATE.replace(QUERY_PLACEHOLDER, query)
}

/// Ask the completion service about `query` and return its text.
///
/// # Errors
///
/// Returns [`AssistantError::EmptyQuery`] for a blank query, or the
/// provider error if the completion call fails.
pub async fn answer(llm: &dyn LlmChat, query: &str) -> Result<String, AssistantError> {
    let query = normalize_query(query).ok_or(AssistantError::EmptyQuery)?;
    let messages = [Message::user(render_prompt(query))];

    let response = llm.chat(MAX_TOKENS, &messages).await?;
    tracing::debug!(
        model = %response.model,
        input_tokens = response.input_tokens,
        output_tokens = response.output_tokens,
        "assistant completion"
    );
    Ok(response.text)
}

#[cfg(test)]
#[path = "assistant_test.rs"]
mod tests;
