//! Generation and retrieval settings for a conversation engine.

use scarbot_core::AppConfig;
use scarbot_llm::{LlmRequest, Message};

/// Passages injected for the opening question.
pub const DEFAULT_FIRST_TURN_CHUNKS: usize = 3;

/// Passages injected for each follow-up.
pub const DEFAULT_FOLLOW_UP_CHUNKS: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct ConversationSettings {
    /// Model identifier sent with every request
    pub model: String,

    pub temperature: Option<f32>,

    pub max_tokens: Option<u32>,

    /// Chunk budget for the first question
    pub first_turn_chunks: usize,

    /// Chunk budget for follow-ups
    pub follow_up_chunks: usize,
}

impl Default for ConversationSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            temperature: None,
            max_tokens: None,
            first_turn_chunks: DEFAULT_FIRST_TURN_CHUNKS,
            follow_up_chunks: DEFAULT_FOLLOW_UP_CHUNKS,
        }
    }
}

impl ConversationSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.conversation.temperature,
            max_tokens: config.conversation.max_tokens,
            first_turn_chunks: config.conversation.first_turn_chunks,
            follow_up_chunks: config.conversation.follow_up_chunks,
        }
    }

    /// Build a request over `messages` with these settings applied.
    pub fn request(&self, messages: Vec<Message>) -> LlmRequest {
        let mut request = LlmRequest::new(messages, &self.model);
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }
        request
    }
}
