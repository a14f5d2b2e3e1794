//! Portfolio-wide governance scoring by the completion service.

use chrono::{DateTime, Utc};
use interview_flow::LoadedInterviews;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::deliverables::heatmap::Heatmap;
use crate::llm::{CompletionRequest, CompletionService};

pub const DIMENSIONS: [&str; 6] = [
    "TOGAF Compliance",
    "NORA Alignment",
    "Business-IT Alignment",
    "Digital Maturity",
    "Technical Debt",
    "Completeness",
];
pub const JUSTIFICATION_KEY: &str = "Justification";
pub const SUMMARY_FILE_NAME: &str = "EA_governance_summary.json";

const CONSULTANT_SYSTEM_PROMPT: &str = "You are an experienced enterprise architecture consultant.";

const RUBRIC: &str = r#"Your task:
1. Score the overall governance maturity of this portfolio across the following areas (0-100):
- TOGAF Compliance
- NORA Alignment
- Business-IT Alignment
- Digital Maturity
- Technical Debt (lower = better)
- Completeness

2. Provide a concise analysis using bullet points (not a paragraph) that:
- Highlights strengths with justifications
- Lists clear weaknesses or gaps and their likely impact
- Recommends specific improvements or actions
- Uses clear and formal bullet points with no introduction or conclusion

Return only a JSON object in this format:
{
  "TOGAF Compliance": 78,
  "NORA Alignment": 65,
  ...
  "Justification": "- Bullet 1\n- Bullet 2\n- Bullet 3"
}"#;

/// Traffic-light band of a 0–100 score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Band {
    Red,
    Yellow,
    Green,
}

impl Band {
    pub fn from_score(score: f64) -> Self {
        if score >= 75.0 {
            Band::Green
        } else if score >= 50.0 {
            Band::Yellow
        } else {
            Band::Red
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBar {
    pub dimension: String,
    pub score: f64,
    pub band: Band,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GovernanceAssessment {
    pub interviews: usize,
    pub scores: Vec<ScoreBar>,
    pub heatmap: Option<Heatmap>,
    pub bullets: Vec<String>,
    /// The parsed model reply, offered for download as is
    pub raw: Option<Value>,
    pub error: Option<String>,
    pub warnings: Vec<String>,
    pub assessed_at: DateTime<Utc>,
}

impl GovernanceAssessment {
    fn new(loaded: &LoadedInterviews) -> Self {
        Self {
            interviews: loaded.len(),
            scores: Vec::new(),
            heatmap: None,
            bullets: Vec::new(),
            raw: None,
            error: None,
            warnings: loaded
                .warnings
                .iter()
                .map(|w| format!("Skipped {}: {}", w.file, w.reason))
                .collect(),
            assessed_at: Utc::now(),
        }
    }

    pub fn to_markdown(&self) -> String {
        let mut out = format!(
            "## Governance Assessment\n\nLoaded {} interview file(s).\n\n",
            self.interviews
        );
        for warning in &self.warnings {
            out.push_str(&format!("> ⚠️ {}\n", warning));
        }
        if let Some(error) = &self.error {
            out.push_str(&format!("> ❌ {}\n", error));
            return out;
        }
        for bar in &self.scores {
            out.push_str(&format!(
                "- **{}**: {}% ({:?})\n",
                bar.dimension, bar.score, bar.band
            ));
        }
        if let Some(heatmap) = &self.heatmap {
            out.push('\n');
            out.push_str(&heatmap.to_markdown());
        }
        if !self.bullets.is_empty() {
            out.push_str("\n### Analysis Summary\n\n");
            for bullet in &self.bullets {
                out.push_str(bullet);
                out.push('\n');
            }
        }
        out
    }
}

/// Removes a surrounding markdown code fence, with or without a language tag.
fn strip_code_fences(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Parses the model reply into a JSON object.
///
/// Falls back to the outermost `{...}` span of the whole reply when the
/// fenced body is not JSON on its own.
pub fn parse_assessment(reply: &str) -> Result<Map<String, Value>, String> {
    let text = strip_code_fences(reply);
    let value = serde_json::from_str::<Value>(text).or_else(|e| {
        match (reply.find('{'), reply.rfind('}')) {
            (Some(start), Some(end)) if start < end => {
                serde_json::from_str::<Value>(&reply[start..=end]).map_err(|e| e.to_string())
            }
            _ => Err(e.to_string()),
        }
    });

    match value {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err("reply is not a JSON object".to_string()),
        Err(e) => Err(format!("reply is not valid JSON: {}", e)),
    }
}

/// Numeric fields as score bars: rubric dimensions first, any others after.
pub fn score_bars(map: &Map<String, Value>) -> Vec<ScoreBar> {
    let known = DIMENSIONS
        .iter()
        .filter_map(|dimension| map.get(*dimension).map(|v| (dimension.to_string(), v)));
    let others = map
        .iter()
        .filter(|(key, _)| !DIMENSIONS.contains(&key.as_str()))
        .map(|(key, v)| (key.clone(), v));

    known
        .chain(others)
        .filter_map(|(dimension, value)| {
            let score = value.as_f64()?;
            Some(ScoreBar {
                dimension,
                score,
                band: Band::from_score(score),
            })
        })
        .collect()
}

/// Bullet lines of the justification; a list of strings is accepted too.
pub fn justification_bullets(map: &Map<String, Value>) -> Vec<String> {
    let lines: Vec<&str> = match map.get(JUSTIFICATION_KEY) {
        Some(Value::String(text)) => text.lines().collect(),
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    };
    lines
        .into_iter()
        .map(str::trim)
        .filter(|line| line.starts_with(['-', '*', '•']))
        .map(str::to_string)
        .collect()
}

pub struct GovernanceValidator {
    service: Arc<dyn CompletionService>,
    model: String,
}

impl GovernanceValidator {
    pub fn new(service: Arc<dyn CompletionService>, model: impl Into<String>) -> Self {
        Self {
            service,
            model: model.into(),
        }
    }

    pub async fn assess(&self, loaded: &LoadedInterviews) -> GovernanceAssessment {
        let mut assessment = GovernanceAssessment::new(loaded);
        if loaded.is_empty() {
            assessment.warnings.push("No valid files found.".to_string());
            return assessment;
        }

        let data = match serde_json::to_string_pretty(&loaded.all()) {
            Ok(data) => data,
            Err(e) => {
                assessment.error = Some(format!("Could not serialise interviews: {}", e));
                return assessment;
            }
        };
        let prompt = format!(
            "You are analyzing a portfolio of stakeholder interviews from various systems. \
             Each interview is represented as a JSON object containing assessment and metadata fields.\n\n\
             Below is the full set of interviews:\n{}\n\n{}",
            data, RUBRIC
        );
        let request = CompletionRequest::new(&self.model, CONSULTANT_SYSTEM_PROMPT, prompt)
            .with_temperature(0.3);

        info!(interviews = loaded.len(), model = %self.model, "assessing portfolio governance");
        let reply = match self.service.complete(request).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(error = %e, "governance assessment failed");
                assessment.error = Some(format!("Governance assessment failed: {}", e));
                return assessment;
            }
        };

        let map = match parse_assessment(&reply) {
            Ok(map) => map,
            Err(e) => {
                warn!(error = %e, reply_length = reply.len(), "unusable governance reply");
                assessment.error = Some(format!("Could not read the assessment: {}", e));
                return assessment;
            }
        };

        assessment.scores = score_bars(&map);
        if !assessment.scores.is_empty() {
            assessment.heatmap = Some(Heatmap::single_row(
                "Governance Heatmap",
                "Portfolio",
                assessment
                    .scores
                    .iter()
                    .map(|bar| (bar.dimension.clone(), bar.score)),
            ));
        }
        assessment.bullets = justification_bullets(&map);
        assessment.raw = Some(Value::Object(map));
        info!(
            scores = assessment.scores.len(),
            bullets = assessment.bullets.len(),
            "governance assessment complete"
        );
        assessment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmError, testing::ScriptedCompletions};
    use interview_flow::{AnswerSet, ArchivedInterview, PersistedInterview, Role, fields};
    use serde_json::json;

    fn loaded() -> LoadedInterviews {
        let mut answers = AnswerSet::new();
        answers.set_text(fields::APPLICATION_NAME, "Billing Hub");
        LoadedInterviews {
            interviews: vec![ArchivedInterview {
                file: "ApplicationOwner_Billing_Hub.json".to_string(),
                interview: PersistedInterview::new(answers, Role::ApplicationOwner),
            }],
            warnings: vec![],
        }
    }

    fn validator(reply: Result<String, LlmError>) -> (Arc<ScriptedCompletions>, GovernanceValidator) {
        let service = Arc::new(ScriptedCompletions::replying(vec![reply]));
        (service.clone(), GovernanceValidator::new(service, "gpt-3.5-turbo"))
    }

    #[test]
    fn bands_follow_the_thresholds() {
        assert_eq!(Band::from_score(0.0), Band::Red);
        assert_eq!(Band::from_score(49.9), Band::Red);
        assert_eq!(Band::from_score(50.0), Band::Yellow);
        assert_eq!(Band::from_score(74.0), Band::Yellow);
        assert_eq!(Band::from_score(75.0), Band::Green);
        assert_eq!(Band::from_score(100.0), Band::Green);
    }

    #[test]
    fn fenced_and_wrapped_replies_parse() {
        let fenced = "```json\n{\"Completeness\": 40}\n```";
        assert_eq!(parse_assessment(fenced).unwrap()["Completeness"], json!(40));

        let wrapped = "Sure! Here it is: {\"Completeness\": 41} Hope that helps.";
        assert_eq!(parse_assessment(wrapped).unwrap()["Completeness"], json!(41));

        let inline = "```{\"Completeness\": 42}```";
        assert_eq!(parse_assessment(inline).unwrap()["Completeness"], json!(42));

        let tagged_inline = "```json {\"Completeness\": 43}```";
        assert_eq!(parse_assessment(tagged_inline).unwrap()["Completeness"], json!(43));

        assert!(parse_assessment("[1, 2]").is_err());
        assert!(parse_assessment("I cannot score this portfolio.").is_err());
    }

    #[test]
    fn known_dimensions_come_first() {
        let map = json!({
            "Completeness": 20,
            "Cloud Readiness": 55,
            "TOGAF Compliance": 80,
            "Justification": "- ok",
            "Notes": "not a score"
        });
        let bars = score_bars(map.as_object().unwrap());
        let names: Vec<&str> = bars.iter().map(|b| b.dimension.as_str()).collect();
        assert_eq!(names, vec!["TOGAF Compliance", "Completeness", "Cloud Readiness"]);
        assert_eq!(bars[1].band, Band::Red);
    }

    #[test]
    fn only_bullet_lines_are_kept() {
        let map = json!({
            "Justification": "Intro line\n- Strong ownership\n  * Weak CMDB\n• Adopt TOGAF ADM\n\nClosing"
        });
        assert_eq!(
            justification_bullets(map.as_object().unwrap()),
            vec!["- Strong ownership", "* Weak CMDB", "• Adopt TOGAF ADM"]
        );
        assert!(justification_bullets(&Map::new()).is_empty());
    }

    #[tokio::test]
    async fn full_assessment() {
        let reply = r#"{
            "TOGAF Compliance": 78,
            "NORA Alignment": 65,
            "Business-IT Alignment": 70,
            "Digital Maturity": 45,
            "Technical Debt": 30,
            "Completeness": 90,
            "Justification": "- Clear ownership\n- Missing integration standards"
        }"#;
        let (service, validator) = validator(Ok(reply.to_string()));
        let assessment = validator.assess(&loaded()).await;

        let request = service.last_request().unwrap();
        assert_eq!(request.temperature, Some(0.3));
        assert!(request.user.contains("\"application_name\": \"Billing Hub\""));
        assert!(request.user.contains("Technical Debt (lower = better)"));

        assert!(assessment.error.is_none());
        assert_eq!(assessment.scores.len(), 6);
        assert_eq!(assessment.scores[0].band, Band::Green);
        assert_eq!(assessment.scores[3].band, Band::Red);
        let heatmap = assessment.heatmap.as_ref().unwrap();
        assert_eq!(heatmap.value("Portfolio", "NORA Alignment"), Some(65.0));
        assert_eq!(assessment.bullets.len(), 2);
        assert_eq!(assessment.raw.as_ref().unwrap()["Completeness"], json!(90));
        assert!(assessment.to_markdown().contains("- **Completeness**: 90% (Green)"));
    }

    #[tokio::test]
    async fn missing_justification_still_scores() {
        let (_, validator) = validator(Ok("{\"TOGAF Compliance\": 60}".to_string()));
        let assessment = validator.assess(&loaded()).await;
        assert_eq!(assessment.scores.len(), 1);
        assert!(assessment.bullets.is_empty());
        assert!(assessment.error.is_none());
    }

    #[tokio::test]
    async fn non_json_reply_is_an_error() {
        let (_, validator) = validator(Ok("The portfolio looks fine.".to_string()));
        let assessment = validator.assess(&loaded()).await;
        assert!(assessment.error.is_some());
        assert!(assessment.scores.is_empty());
        assert!(assessment.raw.is_none());
    }

    #[tokio::test]
    async fn transport_failure_is_an_error() {
        let (_, validator) = validator(Err(LlmError::Request("rate limited".to_string())));
        let assessment = validator.assess(&loaded()).await;
        assert!(assessment.error.unwrap().contains("rate limited"));
    }

    #[tokio::test]
    async fn empty_archive_makes_no_call() {
        let (service, validator) = validator(Ok("{}".to_string()));
        let assessment = validator.assess(&LoadedInterviews::default()).await;
        assert_eq!(assessment.warnings, vec!["No valid files found."]);
        assert_eq!(service.calls(), 0);
    }
}
