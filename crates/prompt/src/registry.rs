//! Prompt Template Registry.
//!
//! Holds the three named templates the conversation core consumes and
//! exposes typed rendering helpers for each of them.

use crate::builder::render_prompt;
use crate::defaults::builtin_definitions;
use crate::loader::{list_prompts, load_prompt, validate_prompt};
use crate::types::{
    PromptDefinition, RenderedPrompt, SlotValues, CONTEXT_PROMPT_ID, KNOWN_PROMPT_IDS,
    PERSONA_PROMPT_ID, REWRITE_PROMPT_ID,
};
use scarbot_core::{AppError, AppResult};
use std::collections::HashMap;
use std::path::Path;

/// Registry of prompt templates keyed by id.
#[derive(Debug, Clone)]
pub struct PromptRegistry {
    definitions: HashMap<String, PromptDefinition>,
}

impl PromptRegistry {
    /// Registry with the built-in templates only.
    pub fn builtin() -> Self {
        let definitions = builtin_definitions()
            .into_iter()
            .map(|def| (def.id.clone(), def))
            .collect();

        Self { definitions }
    }

    /// Built-in templates, overridden by any `.scarbot/prompts/<id>.yml`
    /// found in the workspace.
    pub fn load(workspace_path: &Path) -> AppResult<Self> {
        let mut registry = Self::builtin();

        for id in list_prompts(workspace_path)? {
            if !KNOWN_PROMPT_IDS.contains(&id.as_str()) {
                tracing::warn!("Ignoring unknown prompt override: {}", id);
                continue;
            }
            registry.insert(load_prompt(workspace_path, &id)?)?;
        }

        Ok(registry)
    }

    /// Replace a template definition.
    pub fn insert(&mut self, definition: PromptDefinition) -> AppResult<()> {
        validate_prompt(&definition)?;
        self.definitions.insert(definition.id.clone(), definition);
        Ok(())
    }

    /// Look up a template by id.
    pub fn get(&self, id: &str) -> AppResult<&PromptDefinition> {
        self.definitions
            .get(id)
            .ok_or_else(|| AppError::Template(format!("Unknown template: {}", id)))
    }

    /// Template definitions in a stable order.
    pub fn definitions(&self) -> Vec<&PromptDefinition> {
        KNOWN_PROMPT_IDS
            .iter()
            .filter_map(|id| self.definitions.get(*id))
            .collect()
    }

    /// Render a template by id.
    pub fn render(&self, id: &str, values: &SlotValues) -> AppResult<RenderedPrompt> {
        render_prompt(self.get(id)?, values)
    }

    /// System persona instructing the model to answer in `language`.
    pub fn persona(&self, language: &str) -> AppResult<String> {
        let values = slot_values(&[("language", language)]);
        Ok(self.render(PERSONA_PROMPT_ID, &values)?.body)
    }

    /// System message injecting an assembled context block.
    pub fn context_injection(&self, context: &str) -> AppResult<String> {
        let values = slot_values(&[("context", context)]);
        Ok(self.render(CONTEXT_PROMPT_ID, &values)?.body)
    }

    /// Instruction and request body for a question rewrite.
    pub fn rewrite(&self, chat_history: &str, question: &str) -> AppResult<RenderedPrompt> {
        let values = slot_values(&[("chat_history", chat_history), ("question", question)]);
        self.render(REWRITE_PROMPT_ID, &values)
    }
}

impl Default for PromptRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn slot_values(pairs: &[(&str, &str)]) -> SlotValues {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_persona_language_slot() {
        let registry = PromptRegistry::builtin();
        let persona = registry.persona("english").unwrap();

        assert!(persona.contains("Please make sure your answer is provided in english."));
        assert!(persona.contains("You can read more about"));
        assert!(!persona.contains("{{"));
    }

    #[test]
    fn test_context_injection() {
        let registry = PromptRegistry::builtin();
        let block = "###\nSilicone sheeting\n This info was retrieved from: https://example.com/a\n###\n";

        assert_eq!(
            registry.context_injection(block).unwrap(),
            format!("The following context has been added to the conversation: {}", block)
        );
        assert_eq!(
            registry.context_injection("").unwrap(),
            "The following context has been added to the conversation: "
        );
    }

    #[test]
    fn test_rewrite_has_instruction_and_body() {
        let registry = PromptRegistry::builtin();
        let rendered = registry
            .rewrite("user: What is a keloid?\n\n", "And how is it treated?")
            .unwrap();

        let instruction = rendered.instruction.unwrap();
        assert!(instruction.contains("standalone question"));
        assert!(rendered.body.contains("Chat history:\nuser: What is a keloid?"));
        assert!(rendered.body.contains("Latest user question:\nAnd how is it treated?"));
    }

    #[test]
    fn test_render_missing_slot() {
        let registry = PromptRegistry::builtin();
        let result = registry.render(PERSONA_PROMPT_ID, &SlotValues::new());

        assert!(matches!(result, Err(AppError::Template(_))));
    }

    #[test]
    fn test_unknown_template() {
        let registry = PromptRegistry::builtin();
        assert!(matches!(registry.get("nope"), Err(AppError::Template(_))));
    }

    #[test]
    fn test_definitions_order() {
        let registry = PromptRegistry::builtin();
        let ids: Vec<&str> = registry.definitions().iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, KNOWN_PROMPT_IDS.to_vec());
    }

    #[test]
    fn test_load_applies_override() {
        let temp_dir = TempDir::new().unwrap();
        let prompts_dir = temp_dir.path().join(".scarbot/prompts");
        fs::create_dir_all(&prompts_dir).unwrap();
        fs::write(
            prompts_dir.join("scarbot.context.yml"),
            r#"
id: scarbot.context
title: Terse context
apiVersion: "1.0"
slots: [context]
template: "CONTEXT: {{context}}"
"#,
        )
        .unwrap();

        let registry = PromptRegistry::load(temp_dir.path()).unwrap();
        assert_eq!(registry.context_injection("x").unwrap(), "CONTEXT: x");
        // untouched templates keep their defaults
        assert!(registry.persona("dutch").unwrap().contains("dutch"));
    }
}
