//! Conversation core for Scarbot.
//!
//! This crate provides:
//! - `SessionState`, the per-conversation transcript and phase
//! - The Question Rewriter and Answer Composer
//! - `ConversationEngine`, which drives rewrite, retrieval, context
//!   injection and generation for each user turn

pub mod composer;
pub mod rewriter;
pub mod session;
pub mod settings;
pub mod state;

#[cfg(test)]
mod tests;

// Re-export main types
pub use composer::compose;
pub use rewriter::{flatten_history, rewrite};
pub use session::ConversationEngine;
pub use settings::ConversationSettings;
pub use state::{Phase, SessionState};
