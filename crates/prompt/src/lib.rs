//! Prompt Template Registry for Scarbot.
//!
//! This crate provides:
//! - The built-in persona, context-injection and question-rewrite templates
//! - Handlebars rendering with required-slot checking
//! - YAML overrides from `.scarbot/prompts/<id>.yml`

pub mod builder;
pub mod defaults;
pub mod loader;
pub mod registry;
pub mod types;

// Re-export main types
pub use builder::render_prompt;
pub use loader::{list_prompts, load_prompt, prompt_path, validate_prompt};
pub use registry::PromptRegistry;
pub use types::{
    PromptDefinition, RenderedPrompt, SlotValues, CONTEXT_PROMPT_ID, KNOWN_PROMPT_IDS,
    PERSONA_PROMPT_ID, REWRITE_PROMPT_ID,
};
