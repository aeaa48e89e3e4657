//! LLM integration crate for Scarbot.
//!
//! Provides the language-model capability consumed by the conversation
//! core: a provider-agnostic `LlmClient` trait that turns an ordered list of
//! chat messages into generated text.
//!
//! # Providers
//! - **OpenAI**: chat completions API (default), with retries
//! - **Ollama**: local LLM runtime
//!
//! # Example
//! ```no_run
//! use scarbot_llm::{LlmClient, LlmRequest, Message, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new(vec![Message::user("Hello, world!")], "llama3.2");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::{create_client, ClientOptions};
pub use providers::{OllamaClient, OpenAiClient};
pub use types::{Message, ProviderType, Role};
