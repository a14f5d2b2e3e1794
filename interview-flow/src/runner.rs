//! FlowRunner – loads a session, applies exactly **one** interaction to it, carries out the
//! resulting side effects, and persists the updated session back to storage.
//!
//! The runner is the only place where the interview meets the outside world:
//! * free-text answers are judged here (local example-phrase match first, then the
//!   [`AnswerValidator`]); a validator failure is shown to the stakeholder and counts as
//!   an unclear answer,
//! * [`Effect::Persist`] is executed here against the [`InterviewArchive`]; a failed write is
//!   reported in the transcript and the answers stay in the session.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::{
    answers::IntegrationRecord,
    archive::InterviewArchive,
    error::{FlowError, Result},
    machine::{Effect, Event, transition},
    question::Question,
    role::Role,
    state::{ChatMessage, InterviewState, Stage},
    storage::{Session, SessionStorage},
    verdict::{AnswerValidator, Verdict, is_example_request},
};

/// One interaction coming from the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    SubmitName { name: String },
    ChooseRole { role: Role },
    Answer { content: String },
    AddIntegration { record: IntegrationRecord },
    FinishIntegrations,
    Restart,
}

/// What the client gets back after one interaction
#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub session_id: String,
    pub stage: Stage,
    pub role: Option<Role>,
    pub question_index: Option<usize>,
    pub total_questions: usize,
    /// Transcript lines added by this interaction
    pub messages: Vec<ChatMessage>,
    pub complete: bool,
    pub saved_to: Option<PathBuf>,
}

impl StepOutcome {
    fn new(session: &Session, messages: Vec<ChatMessage>) -> Self {
        let state = &session.state;
        Self {
            session_id: session.id.clone(),
            stage: state.stage.clone(),
            role: state.role,
            question_index: state.question_index(),
            total_questions: state.questions().len(),
            messages,
            complete: state.is_complete(),
            saved_to: state.saved_to.clone(),
        }
    }
}

/// High-level helper that orchestrates the _load → judge → transition → effects → save_ pattern.
#[derive(Clone)]
pub struct FlowRunner {
    storage: Arc<dyn SessionStorage>,
    validator: Arc<dyn AnswerValidator>,
    archive: Arc<InterviewArchive>,
    /// One lock per session so concurrent actions on it run one after another
    in_flight: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl FlowRunner {
    pub fn new(
        storage: Arc<dyn SessionStorage>,
        validator: Arc<dyn AnswerValidator>,
        archive: Arc<InterviewArchive>,
    ) -> Self {
        Self {
            storage,
            validator,
            archive,
            in_flight: Arc::new(DashMap::new()),
        }
    }

    pub fn storage(&self) -> &Arc<dyn SessionStorage> {
        &self.storage
    }

    /// Opens a new session waiting for the stakeholder's name.
    pub async fn start(&self) -> Result<StepOutcome> {
        let session = Session::new();
        let greeting = session.state.transcript.clone();
        self.storage.save(session.clone()).await?;
        info!(session_id = %session.id, "interview session started");
        Ok(StepOutcome::new(&session, greeting))
    }

    /// Applies **exactly one** action to `session_id` and persists the result.
    ///
    /// A rejected action leaves the stored session untouched.
    pub async fn run(&self, session_id: &str, action: Action) -> Result<StepOutcome> {
        let lock = self
            .in_flight
            .entry(session_id.to_string())
            .or_default()
            .clone();
        let _guard = lock.lock().await;

        let mut session = self
            .storage
            .get(session_id)
            .await?
            .ok_or_else(|| FlowError::SessionNotFound(session_id.to_string()))?;

        let event = self.resolve(&session.state, action).await;
        let step = transition(&session.state, event)?;

        let mut state = step.state;
        let mut messages = step.messages;
        for effect in step.effects {
            let before = state.transcript.len();
            self.apply(session_id, &mut state, effect).await;
            messages.extend_from_slice(&state.transcript[before..]);
        }

        session.state = state;
        self.storage.save(session.clone()).await?;

        info!(
            session_id = %session_id,
            stage = %session.state.stage,
            "interaction handled"
        );
        Ok(StepOutcome::new(&session, messages))
    }

    async fn resolve(&self, state: &InterviewState, action: Action) -> Event {
        match action {
            Action::SubmitName { name } => Event::SubmitName { name },
            Action::ChooseRole { role } => Event::ChooseRole { role },
            Action::Answer { content } => {
                let (verdict, warning) = match state.current_question() {
                    Some(question) if !question.is_integrations() => {
                        self.judge(question, &content).await
                    }
                    _ => (Verdict::Unclear, None),
                };
                Event::Answer {
                    text: content,
                    verdict,
                    warning,
                }
            }
            Action::AddIntegration { record } => Event::AddIntegration(record),
            Action::FinishIntegrations => Event::FinishIntegrations,
            Action::Restart => Event::Restart,
        }
    }

    async fn judge(&self, question: &Question, input: &str) -> (Verdict, Option<String>) {
        if is_example_request(input) {
            return (Verdict::WantsExamples, None);
        }
        match self.validator.validate(question, input).await {
            Ok(verdict) => {
                info!(field = %question.field, verdict = ?verdict, "answer judged");
                (verdict, None)
            }
            Err(e) => {
                warn!(field = %question.field, error = %e, "answer validation failed");
                (
                    Verdict::Unclear,
                    Some(format!("Validation service error: {}", e)),
                )
            }
        }
    }

    async fn apply(&self, session_id: &str, state: &mut InterviewState, effect: Effect) {
        match effect {
            Effect::Persist(interview) => match self.archive.save(&interview).await {
                Ok(path) => state.record_saved(path),
                Err(e) => {
                    error!(session_id = %session_id, error = %e, "failed to archive interview");
                    state.record_save_failed(&e.to_string());
                }
            },
        }
    }
}
