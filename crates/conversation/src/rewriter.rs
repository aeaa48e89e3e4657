//! Question Rewriter.
//!
//! Turns a follow-up that leans on earlier turns ("and how long does that
//! take?") into a standalone retrieval query.

use crate::settings::ConversationSettings;
use scarbot_core::{AppError, AppResult};
use scarbot_llm::{LlmClient, Message};
use scarbot_prompt::PromptRegistry;

/// Flatten a transcript into `role: content` entries separated by blank lines.
pub fn flatten_history(history: &[Message]) -> String {
    history
        .iter()
        .map(|m| format!("{}: {}\n\n", m.role, m.content))
        .collect()
}

/// Ask the model for a standalone version of `question`.
///
/// Returns the model's text verbatim.
pub async fn rewrite(
    llm: &dyn LlmClient,
    prompts: &PromptRegistry,
    settings: &ConversationSettings,
    history: &[Message],
    question: &str,
) -> AppResult<String> {
    let rendered = prompts.rewrite(&flatten_history(history), question)?;
    let instruction = rendered.instruction.ok_or_else(|| {
        AppError::Template(format!(
            "Template '{}' has no instruction",
            rendered.source_prompt_id
        ))
    })?;

    let request = settings.request(vec![
        Message::system(instruction),
        Message::user(rendered.body),
    ]);
    let response = llm.complete(&request).await?;

    tracing::debug!("Rewrote {:?} as {:?}", question, response.content);

    Ok(response.content)
}
