//! Interactive chat command.

use super::{build_engine, status_line};
use clap::Args;
use scarbot_conversation::{ConversationEngine, SessionState};
use scarbot_core::{config::AppConfig, AppResult, Language};
use scarbot_llm::Role;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Start an interactive conversation
#[derive(Args, Debug)]
pub struct ChatCommand {}

/// A line typed at the prompt.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Quit,
    New,
    Lang(&'a str),
    History,
    Question(&'a str),
    Empty,
}

fn parse_input(line: &str) -> Input<'_> {
    let line = line.trim();
    match line.split_once(' ').unwrap_or((line, "")) {
        ("", _) => Input::Empty,
        ("/quit" | "/exit", _) => Input::Quit,
        ("/new", _) => Input::New,
        ("/history", _) => Input::History,
        ("/lang", tag) => Input::Lang(tag.trim()),
        _ => Input::Question(line),
    }
}

impl ChatCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Starting chat session");

        let engine = build_engine(config).await?;
        let mut state = engine.start_session(config.session_language()?);

        println!(
            "Scarbot ({}). Commands: /new, /lang <NL|EN>, /history, /quit",
            state.language()
        );

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            print!("> ");
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };

            match parse_input(&line) {
                Input::Empty => continue,
                Input::Quit => break,
                Input::New => {
                    engine.reset_session(&mut state);
                    println!("New conversation started.");
                }
                Input::History => print_history(&state),
                Input::Lang(tag) => match Language::resolve(tag, &config.languages) {
                    Ok(language) => {
                        engine.change_language(&mut state, language);
                        println!("Language set to {}. New conversation started.", state.language());
                    }
                    Err(e) => eprintln!("{}", e),
                },
                Input::Question(question) => ask(&engine, &mut state, question).await,
            }
        }

        Ok(())
    }
}

async fn ask(engine: &ConversationEngine, state: &mut SessionState, question: &str) {
    eprintln!("{}", status_line(state.language()));

    match engine.ask(state, question).await {
        Ok(answer) => println!("\n{}\n", answer),
        // the session is unchanged, so the user can simply retry
        Err(e) => {
            tracing::error!("Turn failed: {}", e);
            eprintln!("Error: {}", e);
        }
    }
}

fn print_history(state: &SessionState) {
    for message in state.visible_messages() {
        let speaker = match message.role {
            Role::User => "you",
            _ => "scarbot",
        };
        println!("[{}] {}\n", speaker, message.content);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input() {
        assert_eq!(parse_input("  "), Input::Empty);
        assert_eq!(parse_input("/quit"), Input::Quit);
        assert_eq!(parse_input("/exit"), Input::Quit);
        assert_eq!(parse_input("/new"), Input::New);
        assert_eq!(parse_input("/history"), Input::History);
        assert_eq!(parse_input("/lang EN"), Input::Lang("EN"));
        assert_eq!(
            parse_input("What is a keloid?\n"),
            Input::Question("What is a keloid?")
        );
    }
}
