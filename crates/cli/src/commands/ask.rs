//! Ask command handler.
//!
//! Answers a single question as the opening turn of a fresh conversation.

use super::{build_engine, status_line};
use clap::Args;
use scarbot_core::{config::AppConfig, AppResult};

/// Ask a single question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Output as JSON, including the transcript
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");

        let engine = build_engine(config).await?;
        let mut state = engine.start_session(config.session_language()?);

        if !self.json {
            eprintln!("{}", status_line(state.language()));
        }

        let answer = engine.ask_first_question(&mut state, &self.question).await?;

        if self.json {
            let output = serde_json::json!({
                "answer": answer,
                "language": state.language().tag(),
                "provider": config.provider,
                "model": engine.settings().model,
                "transcript": state.model_log(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", answer);
        }

        Ok(())
    }
}
