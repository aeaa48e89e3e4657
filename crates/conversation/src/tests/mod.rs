//! Conversation flow tests against recording stubs.

use crate::{ConversationEngine, ConversationSettings, Phase, SessionState};
use scarbot_core::{AppError, AppResult, Language};
use scarbot_knowledge::{Retriever, RetrievedChunk};
use scarbot_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage, Message, Role};
use scarbot_prompt::PromptRegistry;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

const CITATION: &str = "You can read more about keloids on: https://www.myscarspecialist.com/en/keloid";

/// Retriever returning fixed passages for filtered and unfiltered searches.
struct RecordingRetriever {
    filtered: Vec<RetrievedChunk>,
    unfiltered: Vec<RetrievedChunk>,
    calls: Mutex<Vec<(String, usize, Option<String>)>>,
    unreachable: AtomicBool,
}

impl RecordingRetriever {
    fn new(filtered: Vec<RetrievedChunk>, unfiltered: Vec<RetrievedChunk>) -> Arc<Self> {
        Arc::new(Self {
            filtered,
            unfiltered,
            calls: Mutex::new(Vec::new()),
            unreachable: AtomicBool::new(false),
        })
    }

    fn with_passages() -> Arc<Self> {
        Self::new(
            vec![
                passage("Keloids grow beyond the original wound.", "keloid"),
                passage("Silicone gel reduces keloid height.", "silicone"),
                passage("Steroid injections flatten keloids.", "steroids"),
            ],
            Vec::new(),
        )
    }

    /// Make every following search fail as if the vector store were down.
    fn go_offline(&self) {
        self.unreachable.store(true, Ordering::SeqCst);
    }

    fn limits(&self) -> Vec<usize> {
        self.calls.lock().unwrap().iter().map(|c| c.1).collect()
    }

    fn queries(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|c| c.0.clone()).collect()
    }

    fn filters(&self) -> Vec<Option<String>> {
        self.calls.lock().unwrap().iter().map(|c| c.2.clone()).collect()
    }
}

#[async_trait::async_trait]
impl Retriever for RecordingRetriever {
    fn backend_name(&self) -> &str {
        "recording"
    }

    async fn search(
        &self,
        query: &str,
        limit: usize,
        language: Option<&Language>,
    ) -> AppResult<Vec<RetrievedChunk>> {
        self.calls
            .lock()
            .unwrap()
            .push((query.to_string(), limit, language.map(|l| l.code.clone())));
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(AppError::Retrieval(
                "Qdrant search failed: connection refused".to_string(),
            ));
        }
        let source = if language.is_some() {
            &self.filtered
        } else {
            &self.unfiltered
        };
        Ok(source.iter().take(limit).cloned().collect())
    }
}

/// Language model that answers rewrite requests with a standalone query and
/// everything else with scripted answers.
struct ScriptedLlm {
    answers: Mutex<VecDeque<AppResult<String>>>,
    rewrite_failure: Mutex<Option<AppError>>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl ScriptedLlm {
    fn new(answers: Vec<AppResult<String>>) -> Arc<Self> {
        Arc::new(Self {
            answers: Mutex::new(answers.into()),
            rewrite_failure: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn answering(answers: &[&str]) -> Arc<Self> {
        Self::new(answers.iter().map(|a| Ok(a.to_string())).collect())
    }

    /// Fail the next rewrite request with `error`.
    fn fail_next_rewrite(&self, error: AppError) {
        *self.rewrite_failure.lock().unwrap() = Some(error);
    }

    fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

fn is_rewrite(request: &LlmRequest) -> bool {
    request.messages.len() == 2
        && request.messages[0].is_system()
        && request.messages[0].content.contains("standalone question")
}

#[async_trait::async_trait]
impl LlmClient for ScriptedLlm {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.requests.lock().unwrap().push(request.clone());

        let content = if is_rewrite(request) {
            if let Some(error) = self.rewrite_failure.lock().unwrap().take() {
                return Err(error);
            }
            let body = &request.messages[1].content;
            let question = body
                .rsplit("Latest user question:\n")
                .next()
                .unwrap_or_default()
                .trim();
            format!("standalone: {}", question)
        } else {
            self.answers
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok("no more answers".to_string()))?
        };

        Ok(LlmResponse {
            content,
            model: request.model.clone(),
            usage: LlmUsage::default(),
        })
    }
}

fn passage(text: &str, slug: &str) -> RetrievedChunk {
    RetrievedChunk::new(
        text,
        format!("https://www.myscarspecialist.com/en/{}", slug),
        "en",
    )
}

fn engine(retriever: Arc<RecordingRetriever>, llm: Arc<ScriptedLlm>) -> ConversationEngine {
    ConversationEngine::new(
        retriever,
        llm,
        PromptRegistry::builtin(),
        ConversationSettings::default(),
    )
}

fn roles(log: &[Message]) -> Vec<Role> {
    log.iter().map(|m| m.role).collect()
}

#[tokio::test]
async fn test_first_question_end_to_end_english() {
    let retriever = RecordingRetriever::with_passages();
    let answer = format!("A keloid is a raised scar that grows beyond the wound.\n{}", CITATION);
    let llm = ScriptedLlm::answering(&[&answer]);
    let engine = engine(retriever.clone(), llm.clone());

    let mut state = engine.start_session(Language::english());
    let reply = engine
        .ask_first_question(&mut state, "What is a keloid?")
        .await
        .unwrap();

    assert_eq!(reply, answer);
    assert!(reply.ends_with(CITATION));

    let log = state.model_log();
    assert_eq!(
        roles(log),
        vec![Role::System, Role::System, Role::User, Role::Assistant]
    );
    assert!(log[0]
        .content
        .contains("Please make sure your answer is provided in english."));
    assert!(log[1]
        .content
        .starts_with("The following context has been added to the conversation: ###\n"));
    assert!(log[1]
        .content
        .contains(" This info was retrieved from: https://www.myscarspecialist.com/en/keloid"));
    assert_eq!(log[2].content, "What is a keloid?");
    assert_eq!(log[3].content, answer);

    assert_eq!(state.phase(), Phase::AwaitingFollowUp);
    assert_eq!(state.question(), Some("What is a keloid?"));
    assert_eq!(state.turn_count(), 0);

    // one generation over persona, context and question
    let requests = llm.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].messages, log[..3].to_vec());
    assert_eq!(requests[0].model, "gpt-4o");

    assert_eq!(retriever.queries(), vec!["What is a keloid?".to_string()]);
    assert_eq!(retriever.filters(), vec![Some("en".to_string())]);
}

#[tokio::test]
async fn test_budgets_across_three_turns() {
    let retriever = RecordingRetriever::with_passages();
    let llm = ScriptedLlm::answering(&["one", "two", "three"]);
    let engine = engine(retriever.clone(), llm.clone());

    let mut state = engine.start_session(Language::english());
    engine.ask(&mut state, "What is a keloid?").await.unwrap();
    engine.ask(&mut state, "How is it treated?").await.unwrap();
    engine.ask(&mut state, "Does that hurt?").await.unwrap();

    assert_eq!(retriever.limits(), vec![3, 2, 2]);
    assert_eq!(state.turn_count(), 2);
}

#[tokio::test]
async fn test_follow_up_uses_rewritten_query() {
    let retriever = RecordingRetriever::with_passages();
    let llm = ScriptedLlm::answering(&["A raised scar.", "With silicone."]);
    let engine = engine(retriever.clone(), llm.clone());

    let mut state = engine.start_session(Language::english());
    engine.ask(&mut state, "What is a keloid?").await.unwrap();
    let reply = engine
        .ask_follow_up(&mut state, "How is it treated?")
        .await
        .unwrap();

    assert_eq!(reply, "With silicone.");
    assert_eq!(
        retriever.queries()[1],
        "standalone: How is it treated?".to_string()
    );

    let requests = llm.requests();
    assert_eq!(requests.len(), 3);
    assert!(is_rewrite(&requests[1]));
    let rewrite_body = &requests[1].messages[1].content;
    assert!(rewrite_body.contains("user: What is a keloid?\n\nassistant: A raised scar.\n\n"));
    assert!(rewrite_body.contains("Latest user question:\nHow is it treated?"));

    // user, context, assistant appended after the first four
    let log = state.model_log();
    assert_eq!(log.len(), 7);
    assert_eq!(
        roles(&log[4..]),
        vec![Role::User, Role::System, Role::Assistant]
    );
    assert_eq!(log[4].content, "How is it treated?");

    // the answer is generated over the full log
    assert_eq!(requests[2].messages, log[..6].to_vec());
}

#[tokio::test]
async fn test_logs_are_append_only() {
    let retriever = RecordingRetriever::with_passages();
    let llm = ScriptedLlm::answering(&["a0", "a1", "a2", "a3", "a4"]);
    let engine = engine(retriever, llm);

    let mut state = engine.start_session(Language::dutch());
    engine.ask(&mut state, "Wat is een keloïd?").await.unwrap();

    for (i, question) in ["Hoe behandel je dat?", "Doet dat pijn?", "Hoe lang duurt het?", "Helpt massage?"]
        .iter()
        .enumerate()
    {
        let before_model = state.model_log().to_vec();
        let before_display = state.display_log().to_vec();

        engine.ask(&mut state, question).await.unwrap();

        assert!(state.model_log().starts_with(&before_model));
        assert!(state.display_log().starts_with(&before_display));
        assert_eq!(state.model_log().len(), before_model.len() + 3);
        assert_eq!(state.turn_count(), i + 1);
    }
}

#[tokio::test]
async fn test_display_log_matches_model_log_without_system() {
    let retriever = RecordingRetriever::with_passages();
    let llm = ScriptedLlm::answering(&["first", "second"]);
    let engine = engine(retriever, llm);

    let mut state = engine.start_session(Language::english());
    engine.ask(&mut state, "What is a keloid?").await.unwrap();
    engine.ask(&mut state, "And a hypertrophic scar?").await.unwrap();

    let visible: Vec<&Message> = state.visible_messages().collect();
    let model_non_system: Vec<&Message> =
        state.model_log().iter().filter(|m| !m.is_system()).collect();

    assert_eq!(visible, model_non_system);
    assert_eq!(
        visible.iter().map(|m| m.role).collect::<Vec<_>>(),
        vec![Role::User, Role::Assistant, Role::User, Role::Assistant]
    );
}

#[tokio::test]
async fn test_no_match_passes_empty_context() {
    let retriever = RecordingRetriever::new(Vec::new(), Vec::new());
    let llm = ScriptedLlm::answering(&["I do not know."]);
    let engine = engine(retriever.clone(), llm.clone());

    let mut state = engine.start_session(Language::english());
    engine.ask(&mut state, "What is the weather?").await.unwrap();

    let context = "The following context has been added to the conversation: ";
    assert_eq!(state.model_log()[1].content, context);
    assert_eq!(llm.requests()[0].messages[1].content, context);

    // filtered attempt, then the widened one
    assert_eq!(
        retriever.filters(),
        vec![Some("en".to_string()), None]
    );
}

#[tokio::test]
async fn test_widened_context_is_injected() {
    let retriever = RecordingRetriever::new(
        Vec::new(),
        vec![passage("Keloids are more common on darker skin.", "keloid")],
    );
    let llm = ScriptedLlm::answering(&["Een keloïd is..."]);
    let engine = engine(retriever, llm);

    let mut state = engine.start_session(Language::dutch());
    engine.ask(&mut state, "Wat is een keloïd?").await.unwrap();

    assert!(state.model_log()[1]
        .content
        .contains("Keloids are more common on darker skin."));
}

#[tokio::test]
async fn test_failed_generation_leaves_session_unchanged() {
    let retriever = RecordingRetriever::with_passages();
    let llm = ScriptedLlm::new(vec![
        Ok("A raised scar.".to_string()),
        Err(AppError::Generation("503 Service Unavailable".to_string())),
        Ok("With silicone.".to_string()),
    ]);
    let engine = engine(retriever, llm);

    let mut state = engine.start_session(Language::english());
    engine.ask(&mut state, "What is a keloid?").await.unwrap();
    let before = state.clone();

    let result = engine.ask(&mut state, "How is it treated?").await;
    assert!(matches!(result, Err(AppError::Generation(_))));
    assert_eq!(state, before);

    // the user can retry
    let reply = engine.ask(&mut state, "How is it treated?").await.unwrap();
    assert_eq!(reply, "With silicone.");
    assert_eq!(state.turn_count(), 1);
}

#[tokio::test]
async fn test_failed_rewrite_leaves_session_unchanged() {
    let retriever = RecordingRetriever::with_passages();
    let llm = ScriptedLlm::answering(&["A raised scar.", "With silicone."]);
    let engine = engine(retriever.clone(), llm.clone());

    let mut state = engine.start_session(Language::english());
    engine.ask(&mut state, "What is a keloid?").await.unwrap();
    let before = state.clone();

    llm.fail_next_rewrite(AppError::Generation("429 Too Many Requests".to_string()));
    let result = engine.ask_follow_up(&mut state, "How is it treated?").await;

    assert!(matches!(result, Err(AppError::Generation(_))));
    assert_eq!(state, before);
    // retrieval never ran for the failed turn
    assert_eq!(retriever.limits(), vec![3]);

    let reply = engine
        .ask_follow_up(&mut state, "How is it treated?")
        .await
        .unwrap();
    assert_eq!(reply, "With silicone.");
    assert_eq!(state.turn_count(), 1);
}

#[tokio::test]
async fn test_retrieval_failure_on_first_question_leaves_session_unchanged() {
    let retriever = RecordingRetriever::with_passages();
    let llm = ScriptedLlm::answering(&["A raised scar."]);
    let engine = engine(retriever.clone(), llm.clone());

    let mut state = engine.start_session(Language::english());
    let before = state.clone();

    retriever.go_offline();
    let result = engine
        .ask_first_question(&mut state, "What is a keloid?")
        .await;

    assert!(matches!(result, Err(AppError::Retrieval(_))));
    assert_eq!(state, before);
    assert!(state.is_new());
    // no generation without context
    assert!(llm.requests().is_empty());
}

#[tokio::test]
async fn test_retrieval_failure_on_follow_up_leaves_session_unchanged() {
    let retriever = RecordingRetriever::with_passages();
    let llm = ScriptedLlm::answering(&["A raised scar.", "With silicone."]);
    let engine = engine(retriever.clone(), llm.clone());

    let mut state = engine.start_session(Language::english());
    engine
        .ask_first_question(&mut state, "What is a keloid?")
        .await
        .unwrap();
    let before = state.clone();

    retriever.go_offline();
    let result = engine.ask_follow_up(&mut state, "How is it treated?").await;

    assert!(matches!(result, Err(AppError::Retrieval(_))));
    assert_eq!(state, before);
    assert_eq!(state.turn_count(), 0);
    // rewrite ran, compose did not
    let requests = llm.requests();
    assert_eq!(requests.len(), 2);
    assert!(is_rewrite(&requests[1]));
}

#[tokio::test]
async fn test_failed_first_question_keeps_new_phase() {
    let retriever = RecordingRetriever::with_passages();
    let llm = ScriptedLlm::new(vec![Err(AppError::Generation("timeout".to_string()))]);
    let engine = engine(retriever, llm);

    let mut state = engine.start_session(Language::english());
    let result = engine.ask(&mut state, "What is a keloid?").await;

    assert!(result.is_err());
    assert!(state.is_new());
    assert!(state.model_log().is_empty());
}

#[tokio::test]
async fn test_follow_up_on_fresh_session() {
    let engine = engine(
        RecordingRetriever::with_passages(),
        ScriptedLlm::answering(&[]),
    );

    let mut state = engine.start_session(Language::english());
    let result = engine.ask_follow_up(&mut state, "And then?").await;

    assert!(matches!(result, Err(AppError::NoUserTurnFound)));
    assert_eq!(state, SessionState::new(Language::english()));
}

#[tokio::test]
async fn test_first_question_twice_is_rejected() {
    let engine = engine(
        RecordingRetriever::with_passages(),
        ScriptedLlm::answering(&["A raised scar."]),
    );

    let mut state = engine.start_session(Language::english());
    engine
        .ask_first_question(&mut state, "What is a keloid?")
        .await
        .unwrap();

    let result = engine.ask_first_question(&mut state, "What is acne?").await;
    assert!(matches!(result, Err(AppError::Session(_))));
    assert_eq!(state.model_log().len(), 4);
}

#[tokio::test]
async fn test_change_language_resets() {
    let retriever = RecordingRetriever::with_passages();
    let llm = ScriptedLlm::answering(&["Een verhoogd litteken.", "A raised scar."]);
    let engine = engine(retriever.clone(), llm);

    let mut state = engine.start_session(Language::dutch());
    engine.ask(&mut state, "Wat is een keloïd?").await.unwrap();

    engine.change_language(&mut state, Language::english());
    assert!(state.is_new());
    assert!(state.model_log().is_empty());
    assert!(state.display_log().is_empty());
    assert_eq!(state.turn_count(), 0);

    engine.ask(&mut state, "What is a keloid?").await.unwrap();
    assert!(state.model_log()[0].content.contains("english"));
    assert_eq!(
        retriever.filters(),
        vec![Some("nl".to_string()), Some("en".to_string())]
    );
    assert_eq!(retriever.limits(), vec![3, 3]);
}

#[tokio::test]
async fn test_reset_session_keeps_language() {
    let engine = engine(
        RecordingRetriever::with_passages(),
        ScriptedLlm::answering(&["A raised scar."]),
    );

    let mut state = engine.start_session(Language::english());
    engine.ask(&mut state, "What is a keloid?").await.unwrap();
    engine.reset_session(&mut state);

    assert_eq!(state, SessionState::new(Language::english()));
}
