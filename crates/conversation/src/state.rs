//! Per-conversation session state.

use scarbot_core::Language;
use scarbot_llm::{Message, Role};
use serde::Serialize;

/// Where the conversation stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Nothing asked yet; the model log is empty
    NewQuestion,
    /// The first question has been answered
    AwaitingFollowUp,
}

/// Transcript and phase of one conversation.
///
/// Owned by the caller and mutated only through `ConversationEngine`.
/// Both logs are append-only; `phase == NewQuestion` holds exactly when the
/// model log is empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionState {
    language: Language,
    question: Option<String>,
    model_log: Vec<Message>,
    display_log: Vec<Message>,
    turn_count: usize,
    phase: Phase,
}

impl SessionState {
    pub fn new(language: Language) -> Self {
        Self {
            language,
            question: None,
            model_log: Vec::new(),
            display_log: Vec::new(),
            turn_count: 0,
            phase: Phase::NewQuestion,
        }
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    /// The question that opened the conversation.
    pub fn question(&self) -> Option<&str> {
        self.question.as_deref()
    }

    /// Every message, in the order presented to the model.
    pub fn model_log(&self) -> &[Message] {
        &self.model_log
    }

    pub fn display_log(&self) -> &[Message] {
        &self.display_log
    }

    /// Number of follow-up questions asked.
    pub fn turn_count(&self) -> usize {
        self.turn_count
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_new(&self) -> bool {
        self.phase == Phase::NewQuestion
    }

    /// Messages to render to the user: the display log without system messages.
    pub fn visible_messages(&self) -> impl Iterator<Item = &Message> {
        self.display_log.iter().filter(|m| !m.is_system())
    }

    /// Content of the most recent user message in the model log.
    pub fn latest_user_message(&self) -> Option<&str> {
        latest_user_message(&self.model_log)
    }

    pub(crate) fn open(&mut self, question: &str, messages: Vec<Message>) {
        self.append(messages);
        self.question = Some(question.to_string());
        self.phase = Phase::AwaitingFollowUp;
    }

    pub(crate) fn record_follow_up(&mut self, messages: Vec<Message>) {
        self.append(messages);
        self.turn_count += 1;
    }

    pub(crate) fn reset(&mut self, language: Language) {
        *self = Self::new(language);
    }

    fn append(&mut self, messages: Vec<Message>) {
        self.display_log.extend(messages.iter().cloned());
        self.model_log.extend(messages);
    }
}

/// Scan a log backwards for the latest user message.
pub(crate) fn latest_user_message(log: &[Message]) -> Option<&str> {
    log.iter()
        .rev()
        .find(|m| m.role == Role::User)
        .map(|m| m.content.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session() {
        let state = SessionState::new(Language::dutch());

        assert!(state.is_new());
        assert!(state.model_log().is_empty());
        assert_eq!(state.turn_count(), 0);
        assert_eq!(state.language().code, "nl");
        assert!(state.latest_user_message().is_none());
    }

    #[test]
    fn test_open_and_follow_up() {
        let mut state = SessionState::new(Language::english());
        state.open(
            "What is a keloid?",
            vec![
                Message::system("persona"),
                Message::system("context"),
                Message::user("What is a keloid?"),
                Message::assistant("A raised scar."),
            ],
        );

        assert_eq!(state.phase(), Phase::AwaitingFollowUp);
        assert_eq!(state.question(), Some("What is a keloid?"));
        assert_eq!(state.turn_count(), 0);

        state.record_follow_up(vec![
            Message::user("How is it treated?"),
            Message::system("context"),
            Message::assistant("With silicone."),
        ]);

        assert_eq!(state.turn_count(), 1);
        assert_eq!(state.model_log().len(), 7);
        assert_eq!(state.display_log(), state.model_log());
        assert_eq!(state.latest_user_message(), Some("How is it treated?"));
    }

    #[test]
    fn test_visible_messages_hide_system() {
        let mut state = SessionState::new(Language::english());
        state.open(
            "Q",
            vec![
                Message::system("persona"),
                Message::user("Q"),
                Message::assistant("A"),
            ],
        );

        let visible: Vec<Role> = state.visible_messages().map(|m| m.role).collect();
        assert_eq!(visible, vec![Role::User, Role::Assistant]);
    }

    #[test]
    fn test_reset() {
        let mut state = SessionState::new(Language::dutch());
        state.open("Q", vec![Message::user("Q"), Message::assistant("A")]);

        state.reset(Language::english());

        assert!(state.is_new());
        assert!(state.model_log().is_empty());
        assert!(state.display_log().is_empty());
        assert!(state.question().is_none());
        assert_eq!(state.language(), &Language::english());
    }
}
