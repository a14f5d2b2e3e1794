pub mod answers;
pub mod archive;
pub mod error;
pub mod machine;
pub mod question;
pub mod role;
pub mod runner;
pub mod state;
pub mod storage;
pub mod verdict;

// Re-export commonly used types
pub use answers::{
    AnswerSet, AnswerValue, Frequency, IntegrationRecord, IntegrationRow, IntegrationRows,
    InterfaceType, PersistedInterview, Protocol,
};
pub use archive::{ArchivedInterview, InterviewArchive, LoadWarning, LoadedInterviews};
pub use error::{FlowError, Result};
pub use machine::{Effect, Event, Step, transition};
pub use question::{Question, QuestionKind, fields};
pub use role::{Role, resolve_known_role};
pub use runner::{Action, FlowRunner, StepOutcome};
pub use state::{ChatMessage, InterviewState, MessageRole, Stage};
pub use storage::{InMemorySessionStorage, Session, SessionStorage};
pub use verdict::{AnswerValidator, Verdict, is_example_request, parse_verdict};
