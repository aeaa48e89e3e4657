//! LLM provider factory.
//!
//! Builds an `LlmClient` from the configured provider name, endpoint and
//! secrets.

use crate::client::LlmClient;
use crate::providers::{OllamaClient, OpenAiClient};
use crate::types::ProviderType;
use std::sync::Arc;
use std::time::Duration;

/// Optional knobs shared by the HTTP providers.
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,

    /// Retries after the first attempt (OpenAI only)
    pub max_retries: Option<u32>,

    /// OpenAI organization header value
    pub organization: Option<String>,
}

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("openai", "ollama")
/// * `endpoint` - Optional custom endpoint URL
/// * `api_key` - Optional API key (required by OpenAI)
/// * `options` - Timeout, retry and organization settings
///
/// # Errors
/// Returns an error message if the provider is unknown or a required secret
/// is missing.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
    options: &ClientOptions,
) -> Result<Arc<dyn LlmClient>, String> {
    match ProviderType::parse(provider) {
        Some(ProviderType::Ollama) => {
            let base_url = endpoint.unwrap_or(crate::providers::ollama::DEFAULT_OLLAMA_URL);
            let client = match options.timeout_secs {
                Some(secs) => OllamaClient::with_timeout(base_url, Duration::from_secs(secs)),
                None => OllamaClient::with_base_url(base_url),
            };
            Ok(Arc::new(client))
        }
        Some(ProviderType::OpenAI) => {
            let api_key = api_key.ok_or_else(|| "OpenAI provider requires API key".to_string())?;
            let base_url = endpoint.unwrap_or(crate::providers::openai::DEFAULT_OPENAI_URL);

            let mut client = OpenAiClient::with_base_url(base_url, api_key);
            if let Some(max_retries) = options.max_retries {
                client = client.with_max_retries(max_retries);
            }
            if let Some(secs) = options.timeout_secs {
                client = client.with_timeout(Duration::from_secs(secs));
            }
            if let Some(ref organization) = options.organization {
                client = client.with_organization(organization);
            }
            Ok(Arc::new(client))
        }
        None => Err(format!("Unknown provider: {}", provider)),
    }
}
