//! Answer Composer.

use crate::settings::ConversationSettings;
use scarbot_core::AppResult;
use scarbot_llm::{LlmClient, Message};

/// Generate the next assistant reply over the full model log.
///
/// The log is passed verbatim and the reply returned unmodified. One attempt;
/// retries are the client's business.
pub async fn compose(
    llm: &dyn LlmClient,
    settings: &ConversationSettings,
    model_log: &[Message],
) -> AppResult<String> {
    tracing::debug!(
        "Composing answer over {} messages with {}",
        model_log.len(),
        llm.provider_name()
    );

    let response = llm.complete(&settings.request(model_log.to_vec())).await?;

    tracing::debug!(
        "Answer: {} chars, {} tokens",
        response.content.len(),
        response.usage.total_tokens
    );

    Ok(response.content)
}
