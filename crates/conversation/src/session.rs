//! Conversation Session.
//!
//! `ConversationEngine` drives each user turn through rewrite, retrieval,
//! context injection and generation. It holds only shared, stateless
//! capabilities, so one engine can serve many sessions; the per-conversation
//! transcript lives in the caller's `SessionState`.
//!
//! A turn's messages are staged and committed to the session only once the
//! answer has been generated. A failing dependency therefore leaves the
//! session exactly as it was.

use crate::composer::compose;
use crate::rewriter::rewrite;
use crate::settings::ConversationSettings;
use crate::state::{latest_user_message, Phase, SessionState};
use scarbot_core::{AppError, AppResult, Language};
use scarbot_knowledge::{ContextAssembler, Retriever};
use scarbot_llm::{LlmClient, Message};
use scarbot_prompt::PromptRegistry;
use std::sync::Arc;

pub struct ConversationEngine {
    assembler: ContextAssembler,
    llm: Arc<dyn LlmClient>,
    prompts: PromptRegistry,
    settings: ConversationSettings,
}

impl ConversationEngine {
    pub fn new(
        retriever: Arc<dyn Retriever>,
        llm: Arc<dyn LlmClient>,
        prompts: PromptRegistry,
        settings: ConversationSettings,
    ) -> Self {
        Self {
            assembler: ContextAssembler::new(retriever),
            llm,
            prompts,
            settings,
        }
    }

    pub fn settings(&self) -> &ConversationSettings {
        &self.settings
    }

    pub fn prompts(&self) -> &PromptRegistry {
        &self.prompts
    }

    /// Start an empty conversation in `language`.
    pub fn start_session(&self, language: Language) -> SessionState {
        SessionState::new(language)
    }

    /// Answer `question`, as the opening question or as a follow-up
    /// depending on the session phase.
    pub async fn ask(&self, state: &mut SessionState, question: &str) -> AppResult<String> {
        match state.phase() {
            Phase::NewQuestion => self.ask_first_question(state, question).await,
            Phase::AwaitingFollowUp => self.ask_follow_up(state, question).await,
        }
    }

    /// Answer the question that opens a conversation.
    ///
    /// Appends the persona, the context block for the literal question, the
    /// question itself and the answer.
    pub async fn ask_first_question(
        &self,
        state: &mut SessionState,
        question: &str,
    ) -> AppResult<String> {
        if !state.is_new() {
            return Err(AppError::Session(
                "A question is already in progress; start a new session first".to_string(),
            ));
        }

        let language = state.language().clone();
        tracing::info!("New question ({})", language.tag());

        let persona = self.prompts.persona(&language.name)?;
        let context = self
            .assembler
            .assemble_detailed(question, Some(&language), self.settings.first_turn_chunks)
            .await?;
        tracing::debug!(
            "First turn context: {} passages (widened: {})",
            context.chunk_count,
            context.widened
        );

        let mut staged = vec![
            Message::system(persona),
            Message::system(self.prompts.context_injection(&context.block)?),
            Message::user(question),
        ];

        let answer = compose(self.llm.as_ref(), &self.settings, &staged).await?;
        staged.push(Message::assistant(answer.clone()));

        state.open(question, staged);
        Ok(answer)
    }

    /// Answer a follow-up question.
    ///
    /// The question is rewritten into a standalone query against the full
    /// transcript, fresh context is retrieved for it, and the answer is
    /// generated over the whole model log.
    pub async fn ask_follow_up(
        &self,
        state: &mut SessionState,
        question: &str,
    ) -> AppResult<String> {
        if state.latest_user_message().is_none() {
            return Err(AppError::NoUserTurnFound);
        }

        let language = state.language().clone();
        let mut log = state.model_log().to_vec();
        log.push(Message::user(question));
        let staged_from = log.len() - 1;

        let latest = latest_user_message(&log)
            .ok_or(AppError::NoUserTurnFound)?
            .to_string();

        tracing::info!("Follow-up {} ({})", state.turn_count() + 1, language.tag());

        let query = rewrite(
            self.llm.as_ref(),
            &self.prompts,
            &self.settings,
            &log,
            &latest,
        )
        .await?;

        let context = self
            .assembler
            .assemble_detailed(&query, Some(&language), self.settings.follow_up_chunks)
            .await?;
        tracing::debug!(
            "Follow-up context: {} passages (widened: {})",
            context.chunk_count,
            context.widened
        );

        log.push(Message::system(
            self.prompts.context_injection(&context.block)?,
        ));

        let answer = compose(self.llm.as_ref(), &self.settings, &log).await?;
        log.push(Message::assistant(answer.clone()));

        state.record_follow_up(log.split_off(staged_from));
        Ok(answer)
    }

    /// Clear the transcript, keeping the session language.
    pub fn reset_session(&self, state: &mut SessionState) {
        let language = state.language().clone();
        state.reset(language);
    }

    /// Switch language; the transcript starts over.
    pub fn change_language(&self, state: &mut SessionState, language: Language) {
        tracing::info!("Language changed to {}", language.tag());
        state.reset(language);
    }
}

impl std::fmt::Debug for ConversationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationEngine")
            .field("assembler", &self.assembler)
            .field("llm", &self.llm.provider_name())
            .field("settings", &self.settings)
            .finish()
    }
}
