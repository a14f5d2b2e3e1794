use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::{answers::AnswerSet, question::Question, role::Role};

pub(crate) const GREETING: &str = "👋 Hello! Let's start with your name:";

/// Where the interview currently stands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum Stage {
    AwaitingName,
    /// Name not in the known-users table; waiting for a manual role choice
    AwaitingRole { name: String },
    AwaitingAnswer { index: usize },
    Complete,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::AwaitingName => f.write_str("awaiting name"),
            Stage::AwaitingRole { .. } => f.write_str("awaiting role selection"),
            Stage::AwaitingAnswer { index } => write!(f, "awaiting answer {}", index),
            Stage::Complete => f.write_str("complete"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// A single transcript line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Everything one interview session knows. Replaced wholesale on every step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewState {
    pub stage: Stage,
    pub user_name: Option<String>,
    pub role: Option<Role>,
    pub answers: AnswerSet,
    pub transcript: Vec<ChatMessage>,
    /// Set by the step that moved to the next question, cleared by a re-prompt
    pub just_advanced: bool,
    /// Archive file written when the interview completed
    pub saved_to: Option<PathBuf>,
}

impl InterviewState {
    pub fn new() -> Self {
        Self {
            stage: Stage::AwaitingName,
            user_name: None,
            role: None,
            answers: AnswerSet::new(),
            transcript: vec![ChatMessage::assistant(GREETING)],
            just_advanced: false,
            saved_to: None,
        }
    }

    pub fn questions(&self) -> &'static [Question] {
        self.role.map(|role| role.questions()).unwrap_or(&[])
    }

    pub fn question_index(&self) -> Option<usize> {
        match self.stage {
            Stage::AwaitingAnswer { index } => Some(index),
            Stage::Complete => Some(self.questions().len()),
            _ => None,
        }
    }

    pub fn current_question(&self) -> Option<&'static Question> {
        match self.stage {
            Stage::AwaitingAnswer { index } => self.questions().get(index),
            _ => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.stage == Stage::Complete
    }

    pub(crate) fn say(&mut self, content: impl Into<String>) {
        self.transcript.push(ChatMessage::assistant(content));
    }

    pub(crate) fn hear(&mut self, content: impl Into<String>) {
        self.transcript.push(ChatMessage::user(content));
    }

    /// Records a successful archive write.
    pub fn record_saved(&mut self, path: PathBuf) {
        self.say(format!(
            "✅ Interview responses saved to: `{}`",
            path.display()
        ));
        self.saved_to = Some(path);
    }

    /// Records a failed archive write; the answers stay in the session.
    pub fn record_save_failed(&mut self, error: &str) {
        self.say(format!("❌ Error saving file: `{}`", error));
    }
}

impl Default for InterviewState {
    fn default() -> Self {
        Self::new()
    }
}
