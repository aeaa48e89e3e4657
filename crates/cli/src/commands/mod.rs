//! Command handlers for the Scarbot CLI.

pub mod ask;
pub mod chat;
pub mod prompts;

pub use ask::AskCommand;
pub use chat::ChatCommand;
pub use prompts::PromptsCommand;

use scarbot_conversation::{ConversationEngine, ConversationSettings};
use scarbot_core::config::{AppConfig, ProviderConfig};
use scarbot_core::{AppError, AppResult, Language};
use scarbot_knowledge::create_retriever;
use scarbot_llm::{create_client, ClientOptions};
use scarbot_prompt::PromptRegistry;

/// Wire the configured LLM client, retriever and prompt registry into an engine.
pub(crate) async fn build_engine(config: &AppConfig) -> AppResult<ConversationEngine> {
    config.validate()?;

    let provider_config = config.get_provider_config(&config.provider);
    let endpoint = provider_config.and_then(ProviderConfig::endpoint);
    let api_key = config.resolve_api_key(&config.provider);

    let llm = create_client(
        &config.provider,
        endpoint,
        api_key.as_deref(),
        &client_options(provider_config),
    )
    .map_err(AppError::Config)?;

    let retriever = create_retriever(
        &config.retrieval,
        config.resolve_embedding_api_key().as_deref(),
    )
    .await?;

    let prompts = PromptRegistry::load(&config.workspace)?;

    Ok(ConversationEngine::new(
        retriever,
        llm,
        prompts,
        ConversationSettings::from_config(config),
    ))
}

fn client_options(provider_config: Option<&ProviderConfig>) -> ClientOptions {
    match provider_config {
        Some(ProviderConfig::OpenAI {
            organization_env,
            max_retries,
            timeout,
            ..
        }) => ClientOptions {
            timeout_secs: *timeout,
            max_retries: *max_retries,
            organization: organization_env
                .as_ref()
                .and_then(|var| std::env::var(var).ok()),
        },
        Some(ProviderConfig::Ollama { timeout, .. }) => ClientOptions {
            timeout_secs: *timeout,
            ..Default::default()
        },
        None => ClientOptions::default(),
    }
}

/// Status line shown while an answer is being prepared.
pub(crate) fn status_line(language: &Language) -> &'static str {
    if language.is_english() {
        "Browsing website..."
    } else {
        "Website doorzoeken..."
    }
}
