use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("event '{event}' is not accepted while {stage}")]
    InvalidTransition { stage: String, event: String },

    #[error("answer validation failed: {0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FlowError>;
