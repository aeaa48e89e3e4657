//! Prompt types for Scarbot.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identifier of the system persona template.
pub const PERSONA_PROMPT_ID: &str = "scarbot.persona";

/// Identifier of the context injection template.
pub const CONTEXT_PROMPT_ID: &str = "scarbot.context";

/// Identifier of the question rewrite template.
pub const REWRITE_PROMPT_ID: &str = "scarbot.rewrite";

/// All template identifiers the registry serves.
pub const KNOWN_PROMPT_IDS: [&str; 3] = [PERSONA_PROMPT_ID, CONTEXT_PROMPT_ID, REWRITE_PROMPT_ID];

/// A prompt template definition, built in or loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PromptDefinition {
    /// Unique prompt identifier
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// API version for schema evolution
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Creator identifier
    #[serde(rename = "createdBy", default)]
    pub created_by: String,

    /// Named slots that must be supplied when rendering
    #[serde(default)]
    pub slots: Vec<String>,

    /// Optional instruction part, sent as a separate system message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instruction: Option<String>,

    /// Template body with Handlebars syntax
    pub template: String,
}

/// A rendered template ready to be turned into messages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RenderedPrompt {
    /// Rendered instruction part, if the template has one
    pub instruction: Option<String>,

    /// Rendered body
    pub body: String,

    /// Source prompt ID
    #[serde(rename = "sourcePromptId")]
    pub source_prompt_id: String,
}

/// Slot values keyed by slot name.
pub type SlotValues = HashMap<String, String>;
