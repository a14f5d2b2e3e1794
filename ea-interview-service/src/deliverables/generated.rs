use interview_flow::PersistedInterview;

use super::DeliverableKind;

pub const ARCHITECT_SYSTEM_PROMPT: &str = "You are a senior Enterprise Architect.";

const APPLICATION_CATALOGUE_PROMPT: &str = "You are an expert Application Architect. Build a TOGAF-aligned Application Catalogue from the following interviews. Output ONLY a clean markdown table with: App Name, Business Line, Category, Status, Tech Stack, Stakeholder.";

const BUSINESS_CATALOGUE_PROMPT: &str = "You are an expert Business Architect. Build a TOGAF-aligned Business Capability Catalogue. Output ONLY a clean markdown table with: Capability Name, Description, Related Department, Pain Point, TOGAF Layer.";

const GAP_ANALYSIS_PROMPT: &str = "You're a TOGAF compliance consultant. Analyze the following interviews and generate a structured Gap Analysis. Use markdown bullets or tables showing Gap, Impact, and Recommendation.";

/// Formatting instruction for the model-generated deliverables
pub fn instruction(kind: DeliverableKind) -> Option<&'static str> {
    match kind {
        DeliverableKind::ApplicationCatalogue => Some(APPLICATION_CATALOGUE_PROMPT),
        DeliverableKind::BusinessCatalogue => Some(BUSINESS_CATALOGUE_PROMPT),
        DeliverableKind::GapAnalysis => Some(GAP_ANALYSIS_PROMPT),
        _ => None,
    }
}

/// Instruction followed by the interview bucket as pretty JSON.
pub fn data_prompt(
    instruction: &str,
    interviews: &[&PersistedInterview],
) -> Result<String, serde_json::Error> {
    Ok(format!(
        "{}\n\nData:\n{}",
        instruction,
        serde_json::to_string_pretty(interviews)?
    ))
}
