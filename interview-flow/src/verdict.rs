use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{error::Result, question::Question};

/// Marker the validator emits when the stakeholder is asking for examples
pub const EXAMPLE_MARKER: &str = "❌EXAMPLE";
/// Marker the validator emits for an acceptable answer
pub const VALID_MARKER: &str = "✅";

/// Phrases that are answered with examples without asking the validator
pub const EXAMPLE_PHRASES: &[&str] = &[
    "give me example",
    "give me examples",
    "can you give me example",
    "can you give me examples",
    "what are the options",
    "what are examples",
    "examples please",
    "show me example",
    "i need example",
];

/// Outcome of judging one free-text answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Valid,
    WantsExamples,
    Unclear,
}

/// Judges free-text answers against the current question
#[async_trait]
pub trait AnswerValidator: Send + Sync {
    async fn validate(&self, question: &Question, input: &str) -> Result<Verdict>;
}

/// True when the answer is really a request for example values.
pub fn is_example_request(input: &str) -> bool {
    let input = input.trim().to_lowercase();
    EXAMPLE_PHRASES.iter().any(|phrase| input.contains(phrase))
}

/// Maps a validator reply onto exactly one [`Verdict`].
///
/// The example marker wins over everything else so a confused reply never
/// advances the interview; a reply counts as valid only when it opens with the
/// checkmark.
pub fn parse_verdict(raw: &str) -> Verdict {
    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();
    if compact.contains(EXAMPLE_MARKER) {
        return Verdict::WantsExamples;
    }

    let trimmed = raw.trim_matches(|c: char| c.is_whitespace() || matches!(c, '"' | '\'' | '`'));
    if trimmed.starts_with(VALID_MARKER) && !trimmed.contains('❌') {
        Verdict::Valid
    } else {
        Verdict::Unclear
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkmark_alone_is_valid() {
        assert_eq!(parse_verdict("✅"), Verdict::Valid);
        assert_eq!(parse_verdict("  ✅\n"), Verdict::Valid);
        assert_eq!(parse_verdict("\"✅\""), Verdict::Valid);
        assert_eq!(parse_verdict("`✅`"), Verdict::Valid);
    }

    #[test]
    fn checkmark_with_trailing_chatter_is_still_valid() {
        assert_eq!(parse_verdict("✅ Looks good."), Verdict::Valid);
    }

    #[test]
    fn example_marker_is_detected_anywhere() {
        assert_eq!(parse_verdict("❌EXAMPLE"), Verdict::WantsExamples);
        assert_eq!(parse_verdict("❌ example"), Verdict::WantsExamples);
        assert_eq!(
            parse_verdict("The user wants help.\n❌EXAMPLE\nCore System, Mobile App"),
            Verdict::WantsExamples
        );
    }

    #[test]
    fn mixed_signals_never_advance() {
        assert_eq!(parse_verdict("✅ ❌EXAMPLE"), Verdict::WantsExamples);
        assert_eq!(parse_verdict("✅ or ❌, hard to say"), Verdict::Unclear);
    }

    #[test]
    fn anything_else_is_unclear() {
        assert_eq!(parse_verdict(""), Verdict::Unclear);
        assert_eq!(parse_verdict("   "), Verdict::Unclear);
        assert_eq!(
            parse_verdict("I didn't understand. Examples: Active, Retired"),
            Verdict::Unclear
        );
        assert_eq!(parse_verdict("Valid ✅"), Verdict::Unclear);
        assert_eq!(parse_verdict("EXAMPLE"), Verdict::Unclear);
        assert_eq!(parse_verdict("⚠️ service error: timeout"), Verdict::Unclear);
    }

    #[test]
    fn example_phrases_match_inside_longer_input() {
        assert!(is_example_request("Can you give me examples?"));
        assert!(is_example_request("  hmm, WHAT ARE THE OPTIONS  "));
        assert!(is_example_request("examples please"));
        assert!(!is_example_request("Core System"));
        assert!(!is_example_request("example corp"));
    }
}
