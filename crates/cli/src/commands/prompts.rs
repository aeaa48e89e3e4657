//! Prompt template inspection.

use clap::{Args, Subcommand};
use scarbot_core::{config::AppConfig, AppResult};
use scarbot_prompt::{list_prompts, PromptRegistry};

/// Inspect prompt templates
#[derive(Args, Debug)]
pub struct PromptsCommand {
    #[command(subcommand)]
    pub action: PromptsAction,
}

#[derive(Subcommand, Debug)]
pub enum PromptsAction {
    /// List templates and whether they are overridden
    List,

    /// Print a template
    Show {
        /// Template id (e.g. scarbot.persona)
        id: String,
    },
}

impl PromptsCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let registry = PromptRegistry::load(&config.workspace)?;

        match &self.action {
            PromptsAction::List => {
                let overrides = list_prompts(&config.workspace)?;
                for def in registry.definitions() {
                    let source = if overrides.contains(&def.id) {
                        "workspace"
                    } else {
                        "builtin"
                    };
                    println!("{:<18} v{:<5} {:<10} {}", def.id, def.api_version, source, def.title);
                }
            }
            PromptsAction::Show { id } => {
                let def = registry.get(id)?;
                println!("# {} ({})", def.title, def.id);
                println!("slots: {}", def.slots.join(", "));
                if let Some(instruction) = &def.instruction {
                    println!("\n## instruction\n{}", instruction);
                }
                println!("\n## template\n{}", def.template);
            }
        }

        Ok(())
    }
}
