//! OpenAI-compatible chat completions provider.
//!
//! Works against api.openai.com and any server exposing the
//! `/chat/completions` endpoint. Transient failures (transport errors,
//! 429 and 5xx responses) are retried with exponential backoff.

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use crate::types::Message;
use reqwest::StatusCode;
use scarbot_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Default OpenAI API base URL
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";

/// Default retry count after the first attempt
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Initial backoff duration in milliseconds
const INITIAL_BACKOFF_MS: u64 = 500;

/// Upper bound for a single backoff
const MAX_BACKOFF_MS: u64 = 30_000;

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    model: String,
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Outcome of a single attempt.
enum AttemptError {
    Retryable(AppError),
    Fatal(AppError),
}

/// OpenAI chat client.
pub struct OpenAiClient {
    base_url: String,
    api_key: String,
    organization: Option<String>,
    max_retries: u32,
    client: reqwest::Client,
}

impl OpenAiClient {
    /// Create a client for api.openai.com.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_OPENAI_URL, api_key)
    }

    /// Create a client for a custom OpenAI-compatible endpoint.
    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            organization: None,
            max_retries: DEFAULT_MAX_RETRIES,
            client: build_http_client(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
        }
    }

    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = build_http_client(timeout);
        self
    }

    fn to_openai_request<'a>(&self, request: &'a LlmRequest) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &request.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }

    fn convert_response(&self, response: ChatCompletionResponse) -> AppResult<LlmResponse> {
        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                AppError::Generation("OpenAI response contained no message content".to_string())
            })?;

        let usage = response
            .usage
            .map(|u| LlmUsage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        Ok(LlmResponse {
            content,
            model: response.model,
            usage,
        })
    }

    async fn attempt(&self, request: &LlmRequest) -> Result<LlmResponse, AttemptError> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut builder = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.to_openai_request(request));

        if let Some(ref organization) = self.organization {
            builder = builder.header("OpenAI-Organization", organization);
        }

        let response = builder.send().await.map_err(|e| {
            AttemptError::Retryable(AppError::Generation(format!(
                "Failed to send request to OpenAI: {}",
                e
            )))
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let message = serde_json::from_str::<ErrorEnvelope>(&error_text)
                .map(|envelope| envelope.error.message)
                .unwrap_or(error_text);
            let err = AppError::Generation(format!("OpenAI API error ({}): {}", status, message));

            return Err(if is_retryable(status) {
                AttemptError::Retryable(err)
            } else {
                AttemptError::Fatal(err)
            });
        }

        let body: ChatCompletionResponse = response.json().await.map_err(|e| {
            AttemptError::Fatal(AppError::Generation(format!(
                "Failed to parse OpenAI response: {}",
                e
            )))
        })?;

        self.convert_response(body).map_err(AttemptError::Fatal)
    }
}

fn build_http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Delay before retry number `attempt` (1-based), doubling up to a cap.
fn backoff_delay(attempt: u32) -> Duration {
    let factor = 2_u64
        .checked_pow(attempt.saturating_sub(1))
        .unwrap_or(u64::MAX);
    Duration::from_millis(INITIAL_BACKOFF_MS.saturating_mul(factor).min(MAX_BACKOFF_MS))
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

#[async_trait::async_trait]
impl LlmClient for OpenAiClient {
    fn provider_name(&self) -> &str {
        "openai"
    }

    #[instrument(skip(self, request), fields(model = %request.model, messages = request.messages.len()))]
    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        let mut attempt = 0;

        loop {
            match self.attempt(request).await {
                Ok(response) => {
                    debug!(
                        "Received completion from OpenAI ({} tokens)",
                        response.usage.total_tokens
                    );
                    return Ok(response);
                }
                Err(AttemptError::Fatal(e)) => return Err(e),
                Err(AttemptError::Retryable(e)) => {
                    if attempt >= self.max_retries {
                        return Err(e);
                    }
                    attempt += 1;
                    let delay = backoff_delay(attempt);
                    warn!(
                        "OpenAI request failed (attempt {}/{}), retrying in {}ms: {}",
                        attempt,
                        self.max_retries.saturating_add(1),
                        delay.as_millis(),
                        e
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
