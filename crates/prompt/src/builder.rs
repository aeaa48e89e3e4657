//! Template rendering.

use crate::types::{PromptDefinition, RenderedPrompt, SlotValues};
use handlebars::Handlebars;
use scarbot_core::{AppError, AppResult};

/// Render a prompt definition with the supplied slot values.
///
/// Every slot the definition declares must be present in `values`; a missing
/// slot is a `Template` error rather than an empty substitution. Rendering
/// runs in Handlebars strict mode, so a placeholder the definition forgot to
/// declare is rejected as well.
///
/// # Example
/// ```no_run
/// use scarbot_prompt::{render_prompt, PromptRegistry, PERSONA_PROMPT_ID};
/// use std::collections::HashMap;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let registry = PromptRegistry::builtin();
/// let mut values = HashMap::new();
/// values.insert("language".to_string(), "english".to_string());
///
/// let rendered = render_prompt(registry.get(PERSONA_PROMPT_ID)?, &values)?;
/// println!("{}", rendered.body);
/// # Ok(())
/// # }
/// ```
pub fn render_prompt(definition: &PromptDefinition, values: &SlotValues) -> AppResult<RenderedPrompt> {
    tracing::debug!("Rendering prompt: {}", definition.id);

    if let Some(missing) = definition.slots.iter().find(|slot| !values.contains_key(*slot)) {
        return Err(AppError::Template(format!(
            "Missing required slot '{}' for template '{}'",
            missing, definition.id
        )));
    }

    let instruction = definition
        .instruction
        .as_deref()
        .map(|instruction| render_template(&definition.id, instruction, values))
        .transpose()?;

    let body = render_template(&definition.id, &definition.template, values)?;

    Ok(RenderedPrompt {
        instruction,
        body,
        source_prompt_id: definition.id.clone(),
    })
}

/// Render a Handlebars template with variables.
fn render_template(id: &str, template: &str, values: &SlotValues) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Plain text, not HTML
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars.set_strict_mode(true);

    handlebars
        .register_template_string(id, template)
        .map_err(|e| AppError::Template(format!("Failed to register template '{}': {}", id, e)))?;

    handlebars
        .render(id, values)
        .map_err(|e| AppError::Template(format!("Failed to render template '{}': {}", id, e)))
}

/// Check that a template body parses.
pub(crate) fn check_syntax(id: &str, template: &str) -> AppResult<()> {
    handlebars::Template::compile(template)
        .map(|_| ())
        .map_err(|e| AppError::Template(format!("Invalid template '{}': {}", id, e)))
}
