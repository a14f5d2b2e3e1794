use serde::Serialize;

/// How a question is answered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    /// Free text, judged by the answer validator
    Text,
    /// Repeatable integration rows collected through a form
    Integrations,
}

/// One entry of a role's interview script
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    /// Field identifier the answer is stored under
    pub field: &'static str,
    pub prompt: &'static str,
    /// Example values offered when the stakeholder asks for help
    pub examples: &'static [&'static str],
    pub kind: QuestionKind,
}

impl Question {
    const fn text(field: &'static str, prompt: &'static str) -> Self {
        Self {
            field,
            prompt,
            examples: &[],
            kind: QuestionKind::Text,
        }
    }

    const fn with_examples(
        field: &'static str,
        prompt: &'static str,
        examples: &'static [&'static str],
    ) -> Self {
        Self {
            field,
            prompt,
            examples,
            kind: QuestionKind::Text,
        }
    }

    pub fn is_integrations(&self) -> bool {
        self.kind == QuestionKind::Integrations
    }
}

pub mod fields {
    pub const APPLICATION_NAME: &str = "application_name";
    pub const CATEGORY_TYPE: &str = "category_type";
    pub const LINE_OF_BUSINESS: &str = "line_of_business";
    pub const STATUS: &str = "status";
    pub const TECHNOLOGY: &str = "technology";
    pub const INTEGRATIONS: &str = "integrations";

    pub const BUSINESS_DOMAIN: &str = "business_domain";
    pub const CAPABILITIES: &str = "capabilities";
    pub const PAIN_POINTS: &str = "pain_points";
    pub const KPIS: &str = "kpis";
    pub const CRITICAL_SYSTEMS: &str = "critical_systems";
}

pub(crate) static APPLICATION_OWNER_QUESTIONS: [Question; 6] = [
    Question::text(fields::APPLICATION_NAME, "What is the Application Name?"),
    Question::with_examples(
        fields::CATEGORY_TYPE,
        "What is the Application Category Type?",
        &[
            "Core System",
            "Supporting System",
            "Integration Layer",
            "BI/Reporting Tool",
            "Mobile App",
            "External Portal",
        ],
    ),
    Question::text(
        fields::LINE_OF_BUSINESS,
        "Which Line of Business does it support?",
    ),
    Question::with_examples(
        fields::STATUS,
        "What is the current Application Status?",
        &["Active", "Under Development", "Retired", "On Hold"],
    ),
    Question::text(
        fields::TECHNOLOGY,
        "What is the Technology Stack (e.g., Java, .NET, Node.js, Python)?",
    ),
    Question {
        field: fields::INTEGRATIONS,
        prompt: "Let's collect integration details for this application. Please use the form below to add integrations.",
        examples: &[],
        kind: QuestionKind::Integrations,
    },
];

pub(crate) static BUSINESS_OWNER_QUESTIONS: [Question; 5] = [
    Question::text(
        fields::BUSINESS_DOMAIN,
        "What is your business domain or department?",
    ),
    Question::text(
        fields::CAPABILITIES,
        "List the key business capabilities in your domain.",
    ),
    Question::text(
        fields::PAIN_POINTS,
        "What are the main pain points in current operations?",
    ),
    Question::text(
        fields::KPIS,
        "What KPIs or performance metrics do you use to evaluate success?",
    ),
    Question::text(
        fields::CRITICAL_SYSTEMS,
        "Which systems or applications are critical to your operations?",
    ),
];
