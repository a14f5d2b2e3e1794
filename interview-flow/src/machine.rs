//! The interview as a pure state machine.
//!
//! [`transition`] takes the current [`InterviewState`] and one [`Event`] and
//! returns the next state together with the messages to show and the side
//! effects to carry out. Nothing here touches the network or the disk; the
//! [`FlowRunner`](crate::runner::FlowRunner) resolves verdicts before calling
//! in and executes the returned effects afterwards.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    answers::{IntegrationRecord, PersistedInterview},
    error::{FlowError, Result},
    question::Question,
    role::{Role, display_name, resolve_known_role},
    state::{ChatMessage, InterviewState, Stage},
    verdict::Verdict,
};

const FORM_HINT: &str = "Please fill out integration details below. You can add multiple rows:";
const USE_FORM_HINT: &str =
    "Please use the integration form to add rows, then mark the integrations step as done.";
const RETRY_HINT: &str = "Please provide your answer again or type 'skip' to move on.";
const UNCLEAR_HINT: &str = "⚠️ That answer wasn't clear. Please rephrase or type 'skip'.";

/// Input to the state machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    SubmitName {
        name: String,
    },
    ChooseRole {
        role: Role,
    },
    /// A free-text answer with the verdict already resolved
    Answer {
        text: String,
        verdict: Verdict,
        /// Shown before the re-prompt, e.g. when the validator was unreachable
        warning: Option<String>,
    },
    AddIntegration(IntegrationRecord),
    FinishIntegrations,
    Restart,
}

impl Event {
    fn name(&self) -> &'static str {
        match self {
            Event::SubmitName { .. } => "submit_name",
            Event::ChooseRole { .. } => "choose_role",
            Event::Answer { .. } => "answer",
            Event::AddIntegration(_) => "add_integration",
            Event::FinishIntegrations => "finish_integrations",
            Event::Restart => "restart",
        }
    }
}

/// Side effect requested by a transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Write the completed interview to the archive
    Persist(PersistedInterview),
}

/// Result of one transition
#[derive(Debug, Clone)]
pub struct Step {
    pub state: InterviewState,
    /// Transcript lines added by this step
    pub messages: Vec<ChatMessage>,
    pub effects: Vec<Effect>,
}

/// Applies `event` to `state`.
///
/// Events that make no sense for the current stage are rejected with
/// [`FlowError::InvalidTransition`]; the caller keeps its old state.
pub fn transition(state: &InterviewState, event: Event) -> Result<Step> {
    let mut next = state.clone();
    let mut effects = Vec::new();

    match (&state.stage, event) {
        (_, Event::Restart) => {
            next = InterviewState::new();
            let messages = next.transcript.clone();
            return Ok(Step {
                state: next,
                messages,
                effects,
            });
        }

        (Stage::AwaitingName | Stage::AwaitingRole { .. }, Event::SubmitName { name }) => {
            submit_name(&mut next, &name);
        }

        (Stage::AwaitingRole { .. }, Event::ChooseRole { role }) => {
            begin_interview(&mut next, role);
        }

        (Stage::AwaitingAnswer { index }, Event::Answer { text, verdict, warning }) => {
            let index = *index;
            let question = question_at(state, index)?;
            next.hear(text.clone());

            if question.is_integrations() {
                next.say(USE_FORM_HINT);
            } else {
                if let Some(warning) = warning {
                    next.say(format!("⚠️ {}", warning));
                }
                match verdict {
                    Verdict::Valid => {
                        next.answers.set_text(question.field, text);
                        advance(&mut next, index, &mut effects)?;
                    }
                    Verdict::WantsExamples => {
                        next.say(examples_message(question));
                        next.say(RETRY_HINT);
                        next.just_advanced = false;
                    }
                    Verdict::Unclear => {
                        next.say(UNCLEAR_HINT);
                        next.just_advanced = false;
                    }
                }
            }
        }

        (Stage::AwaitingAnswer { index }, Event::AddIntegration(record))
            if question_at(state, *index)?.is_integrations() =>
        {
            let field = question_at(state, *index)?.field;
            let summary = format!(
                "Added integration {} → {} ({}, {}, {}).",
                record.source_app,
                record.target_app,
                record.interface_type,
                record.protocol,
                record.frequency
            );
            let total = next.answers.push_integration(field, record);
            next.say(format!("{} {} integration(s) recorded so far.", summary, total));
            next.just_advanced = false;
        }

        (Stage::AwaitingAnswer { index }, Event::FinishIntegrations)
            if question_at(state, *index)?.is_integrations() =>
        {
            let index = *index;
            next.hear("✅ Done with Integrations");
            advance(&mut next, index, &mut effects)?;
        }

        (stage, event) => {
            return Err(FlowError::InvalidTransition {
                stage: stage.to_string(),
                event: event.name().to_string(),
            });
        }
    }

    let messages = next.transcript[state.transcript.len()..].to_vec();
    debug!(
        from = %state.stage,
        to = %next.stage,
        effects = effects.len(),
        "interview transition"
    );
    Ok(Step {
        state: next,
        messages,
        effects,
    })
}

fn question_at(state: &InterviewState, index: usize) -> Result<&'static Question> {
    state
        .questions()
        .get(index)
        .ok_or_else(|| FlowError::InvalidTransition {
            stage: state.stage.to_string(),
            event: format!("question {} is outside the script", index),
        })
}

fn submit_name(state: &mut InterviewState, raw: &str) {
    state.hear(raw);
    let name = display_name(raw);
    if name.is_empty() {
        state.say("Please enter your first name.");
        return;
    }
    state.user_name = Some(name.clone());

    match resolve_known_role(raw) {
        Some(role) => begin_interview(state, role),
        None => {
            state.say(format!(
                "Hi {}, we couldn't find you in our records. Please select your role:",
                name
            ));
            state.stage = Stage::AwaitingRole { name };
        }
    }
}

fn begin_interview(state: &mut InterviewState, role: Role) {
    state.role = Some(role);
    let name = state.user_name.clone().unwrap_or_default();
    state.say(format!("👋 Welcome back {}! You're an **{}**.", name, role));
    enter_question(state, 0);
}

fn enter_question(state: &mut InterviewState, index: usize) {
    state.stage = Stage::AwaitingAnswer { index };
    if let Some(question) = state.questions().get(index) {
        state.say(question.prompt);
        if question.is_integrations() {
            state.answers.ensure_integrations(question.field);
            state.say(FORM_HINT);
        }
    }
}

fn advance(state: &mut InterviewState, index: usize, effects: &mut Vec<Effect>) -> Result<()> {
    let next_index = index + 1;
    state.just_advanced = true;

    if next_index < state.questions().len() {
        enter_question(state, next_index);
        return Ok(());
    }

    let role = state.role.ok_or_else(|| FlowError::InvalidTransition {
        stage: state.stage.to_string(),
        event: "complete without a role".to_string(),
    })?;
    state.stage = Stage::Complete;
    state.say("🎉 Interview complete! Here's a summary of your input:");
    state.say(format!(
        "```json\n{}\n```",
        serde_json::to_string_pretty(&state.answers)?
    ));
    effects.push(Effect::Persist(PersistedInterview::new(
        state.answers.clone(),
        role,
    )));
    Ok(())
}

fn examples_message(question: &Question) -> String {
    if question.examples.is_empty() {
        "Examples: No predefined examples.".to_string()
    } else {
        format!("Examples: {}", question.examples.join(", "))
    }
}
