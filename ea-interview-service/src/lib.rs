pub mod config;
pub mod deliverables;
pub mod governance;
pub mod llm;
pub mod service;
pub mod spreadsheet;
pub mod telemetry;
pub mod validation;

pub use config::{Config, LogFormat};
pub use deliverables::{Deliverable, DeliverableBuilder, DeliverableKind};
pub use governance::{GovernanceAssessment, GovernanceValidator};
pub use llm::{CompletionService, LlmError, LlmProvider, RigCompletionService};
pub use service::{AppState, build_router, create_app};
pub use telemetry::init_tracing;
