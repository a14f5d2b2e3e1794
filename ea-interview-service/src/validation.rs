use async_trait::async_trait;
use interview_flow::{AnswerValidator, FlowError, Question, Verdict, parse_verdict};
use std::sync::Arc;
use tracing::info;

use crate::llm::{CompletionRequest, CompletionService};

const VALIDATOR_PROMPT: &str = r#"You are a helpful EA assistant conducting an interview.

Rules:
- If the answer is asking for help (e.g., "give me examples", "what are the options", "can you clarify"), return: ❌EXAMPLE
- If the user asks for help, give example values.
- If unclear, say "I didn't understand" and give examples.
- If valid, reply ONLY with: ✅
"#;

/// Judges interview answers with the completion service
pub struct LlmAnswerValidator {
    service: Arc<dyn CompletionService>,
    model: String,
}

impl LlmAnswerValidator {
    pub fn new(service: Arc<dyn CompletionService>, model: impl Into<String>) -> Self {
        Self {
            service,
            model: model.into(),
        }
    }
}

fn answer_prompt(question: &Question, input: &str) -> String {
    let examples = if question.examples.is_empty() {
        "N/A".to_string()
    } else {
        question.examples.join(", ")
    };
    format!(
        "Question: '{}'\nUser's answer: '{}'\nExamples (if needed): {}",
        question.prompt, input, examples
    )
}

#[async_trait]
impl AnswerValidator for LlmAnswerValidator {
    async fn validate(&self, question: &Question, input: &str) -> interview_flow::Result<Verdict> {
        let request = CompletionRequest::new(
            &self.model,
            VALIDATOR_PROMPT,
            answer_prompt(question, input),
        )
        .with_temperature(0.0);

        let reply = self
            .service
            .complete(request)
            .await
            .map_err(|e| FlowError::Validation(e.to_string()))?;

        let verdict = parse_verdict(&reply);
        info!(field = %question.field, verdict = ?verdict, "validator replied");
        Ok(verdict)
    }
}
