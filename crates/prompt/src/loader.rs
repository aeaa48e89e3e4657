//! Loader for YAML template overrides.

use crate::builder::check_syntax;
use crate::types::{PromptDefinition, KNOWN_PROMPT_IDS};
use scarbot_core::{AppError, AppResult};
use std::path::{Path, PathBuf};

/// Directory holding template overrides, relative to the workspace.
const PROMPTS_DIR: &str = ".scarbot/prompts";

fn prompts_dir(workspace_path: &Path) -> PathBuf {
    workspace_path.join(PROMPTS_DIR)
}

/// Path of the override file for a template id.
pub fn prompt_path(workspace_path: &Path, prompt_id: &str) -> PathBuf {
    prompts_dir(workspace_path).join(format!("{}.yml", prompt_id))
}

/// Load a template override by ID from the workspace.
///
/// Looks for `.scarbot/prompts/<id>.yml`.
///
/// # Example
/// ```no_run
/// use scarbot_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new("."), "scarbot.persona")?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = prompt_path(workspace_path, prompt_id);

    tracing::debug!("Loading prompt from: {:?}", prompt_file);

    if !prompt_file.exists() {
        return Err(AppError::Template(format!(
            "Prompt file not found: {:?}",
            prompt_file
        )));
    }

    let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
        AppError::Template(format!(
            "Failed to read prompt file {:?}: {}",
            prompt_file, e
        ))
    })?;

    let definition: PromptDefinition = serde_yaml::from_str(&contents).map_err(|e| {
        AppError::Template(format!(
            "Failed to parse prompt YAML {:?}: {}",
            prompt_file, e
        ))
    })?;

    if definition.id != prompt_id {
        return Err(AppError::Template(format!(
            "Prompt file {:?} declares id '{}', expected '{}'",
            prompt_file, definition.id, prompt_id
        )));
    }

    validate_prompt(&definition)?;

    tracing::info!("Loaded prompt override: {} ({})", definition.id, definition.title);

    Ok(definition)
}

/// List all template override IDs present in the workspace.
pub fn list_prompts(workspace_path: &Path) -> AppResult<Vec<String>> {
    let dir = prompts_dir(workspace_path);

    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut prompt_ids = Vec::new();

    for entry in walkdir::WalkDir::new(&dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("yml") {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                prompt_ids.push(stem.to_string());
            }
        }
    }

    prompt_ids.sort();
    Ok(prompt_ids)
}

/// Validate a prompt definition.
pub fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Template("Prompt ID cannot be empty".to_string()));
    }

    if !KNOWN_PROMPT_IDS.contains(&def.id.as_str()) {
        return Err(AppError::Template(format!(
            "Unknown prompt id '{}'. Known: {}",
            def.id,
            KNOWN_PROMPT_IDS.join(", ")
        )));
    }

    if def.title.is_empty() {
        return Err(AppError::Template("Prompt title cannot be empty".to_string()));
    }

    if def.template.is_empty() {
        return Err(AppError::Template(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Template(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    check_syntax(&def.id, &def.template)?;
    if let Some(ref instruction) = def.instruction {
        check_syntax(&def.id, instruction)?;
    }

    Ok(())
}
