//! Architecture deliverables built from the archived interviews.
//!
//! Heatmaps and the integration matrix are computed locally from the structured
//! answers; catalogues and the gap analysis are written by the completion service
//! and the first markdown table in its reply is lifted out for spreadsheet export.

pub mod generated;
pub mod heatmap;
pub mod matrix;
pub mod table;

use chrono::{DateTime, Utc};
use interview_flow::{LoadedInterviews, PersistedInterview, Role};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

use crate::llm::{CompletionRequest, CompletionService};
use heatmap::Heatmap;
use table::{Table, extract_markdown_table};

pub const NO_TABLE_WARNING: &str = "Could not extract table for spreadsheet download";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliverableKind {
    BusinessCatalogue,
    ApplicationCatalogue,
    IntegrationMatrix,
    GapAnalysis,
    ApplicationHeatmap,
    BusinessHeatmap,
}

impl DeliverableKind {
    pub const ALL: [DeliverableKind; 6] = [
        DeliverableKind::BusinessCatalogue,
        DeliverableKind::ApplicationCatalogue,
        DeliverableKind::IntegrationMatrix,
        DeliverableKind::GapAnalysis,
        DeliverableKind::ApplicationHeatmap,
        DeliverableKind::BusinessHeatmap,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeliverableKind::BusinessCatalogue => "business_catalogue",
            DeliverableKind::ApplicationCatalogue => "application_catalogue",
            DeliverableKind::IntegrationMatrix => "integration_matrix",
            DeliverableKind::GapAnalysis => "gap_analysis",
            DeliverableKind::ApplicationHeatmap => "application_heatmap",
            DeliverableKind::BusinessHeatmap => "business_heatmap",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == slug)
    }

    pub fn title(&self) -> &'static str {
        match self {
            DeliverableKind::BusinessCatalogue => "Business Catalogue",
            DeliverableKind::ApplicationCatalogue => "Application Catalogue",
            DeliverableKind::IntegrationMatrix => "Integration Matrix",
            DeliverableKind::GapAnalysis => "Gap Analysis",
            DeliverableKind::ApplicationHeatmap => "Application Heatmap",
            DeliverableKind::BusinessHeatmap => "Business Heatmap",
        }
    }

    /// Which interview bucket the deliverable is built from
    pub fn source_role(&self) -> Role {
        match self {
            DeliverableKind::BusinessCatalogue | DeliverableKind::BusinessHeatmap => {
                Role::BusinessOwner
            }
            _ => Role::ApplicationOwner,
        }
    }

    pub fn is_catalogue(&self) -> bool {
        matches!(
            self,
            DeliverableKind::BusinessCatalogue | DeliverableKind::ApplicationCatalogue
        )
    }

    pub fn spreadsheet_file_name(&self) -> &'static str {
        match self {
            DeliverableKind::IntegrationMatrix => "Integration_Matrix.xlsx",
            DeliverableKind::ApplicationHeatmap => "Application_Heatmap.xlsx",
            DeliverableKind::BusinessHeatmap => "Business_Heatmap.xlsx",
            _ => "EA_Deliverable.xlsx",
        }
    }

    pub fn sheet_name(&self) -> &'static str {
        match self {
            DeliverableKind::IntegrationMatrix => "Integration Matrix",
            DeliverableKind::ApplicationHeatmap | DeliverableKind::BusinessHeatmap => "Heatmap",
            _ => "Deliverable",
        }
    }
}

impl fmt::Display for DeliverableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeliverableBody {
    Heatmap { heatmap: Heatmap, details: Table },
    Table { table: Table },
    Generated { markdown: String, table: Option<Table> },
}

/// A built report. `body` is `None` when only warnings could be produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Deliverable {
    pub kind: DeliverableKind,
    pub title: String,
    pub body: Option<DeliverableBody>,
    pub warnings: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

impl Deliverable {
    fn new(kind: DeliverableKind, warnings: Vec<String>) -> Self {
        Self {
            kind,
            title: kind.title().to_string(),
            body: None,
            warnings,
            generated_at: Utc::now(),
        }
    }

    /// The tabular part of the report, if it has one.
    pub fn table(&self) -> Option<Table> {
        match self.body.as_ref()? {
            DeliverableBody::Heatmap { heatmap, .. } => Some(heatmap.to_table()),
            DeliverableBody::Table { table } => Some(table.clone()),
            DeliverableBody::Generated { table, .. } => table.clone(),
        }
    }

    pub fn to_markdown(&self) -> String {
        let mut out = format!("## {}\n\n", self.title);
        for warning in &self.warnings {
            out.push_str(&format!("> ⚠️ {}\n", warning));
        }
        if !self.warnings.is_empty() {
            out.push('\n');
        }
        match &self.body {
            Some(DeliverableBody::Heatmap { heatmap, details }) => {
                out.push_str(&heatmap.to_markdown());
                out.push('\n');
                out.push_str(&details.to_markdown());
            }
            Some(DeliverableBody::Table { table }) => out.push_str(&table.to_markdown()),
            Some(DeliverableBody::Generated { markdown, .. }) => {
                out.push_str(markdown);
                out.push('\n');
            }
            None => {}
        }
        out
    }
}

/// Builds deliverables; holds the completion service for the generated kinds
pub struct DeliverableBuilder {
    service: Arc<dyn CompletionService>,
    model: String,
}

impl DeliverableBuilder {
    pub fn new(service: Arc<dyn CompletionService>, model: impl Into<String>) -> Self {
        Self {
            service,
            model: model.into(),
        }
    }

    pub async fn build(&self, kind: DeliverableKind, loaded: &LoadedInterviews) -> Deliverable {
        info!(
            kind = %kind,
            interviews = loaded.len(),
            skipped = loaded.warnings.len(),
            "building deliverable"
        );

        let warnings = loaded
            .warnings
            .iter()
            .map(|w| format!("Skipped {}: {}", w.file, w.reason))
            .collect();
        let mut deliverable = Deliverable::new(kind, warnings);

        if loaded.is_empty() {
            deliverable
                .warnings
                .push("No interview files found in the archive.".to_string());
            return deliverable;
        }

        let role = kind.source_role();
        let bucket = loaded.bucket(role);
        if bucket.is_empty() {
            deliverable
                .warnings
                .push(format!("No {} interviews found.", role));
            return deliverable;
        }

        match kind {
            DeliverableKind::ApplicationHeatmap => {
                if let Some((heatmap, details)) = heatmap::application_heatmap(&bucket) {
                    deliverable.body = Some(DeliverableBody::Heatmap { heatmap, details });
                }
            }
            DeliverableKind::BusinessHeatmap => match heatmap::business_heatmap(&bucket) {
                Some((heatmap, details)) => {
                    deliverable.body = Some(DeliverableBody::Heatmap { heatmap, details });
                }
                None => deliverable
                    .warnings
                    .push("No capability data found in Business Owner interviews.".to_string()),
            },
            DeliverableKind::IntegrationMatrix => {
                let (table, unreadable) = matrix::integration_matrix(&bucket);
                deliverable.warnings.extend(unreadable);
                if table.is_empty() {
                    deliverable
                        .warnings
                        .push("No integration data found.".to_string());
                } else {
                    deliverable.body = Some(DeliverableBody::Table { table });
                }
            }
            DeliverableKind::BusinessCatalogue
            | DeliverableKind::ApplicationCatalogue
            | DeliverableKind::GapAnalysis => self.generate(&mut deliverable, &bucket).await,
        }

        for warning in &deliverable.warnings {
            warn!(kind = %kind, warning = %warning, "deliverable warning");
        }
        deliverable
    }

    async fn generate(&self, deliverable: &mut Deliverable, bucket: &[&PersistedInterview]) {
        let kind = deliverable.kind;
        let Some(instruction) = generated::instruction(kind) else {
            return;
        };
        let prompt = match generated::data_prompt(instruction, bucket) {
            Ok(prompt) => prompt,
            Err(e) => {
                deliverable
                    .warnings
                    .push(format!("Could not serialise interviews: {}", e));
                return;
            }
        };

        let request =
            CompletionRequest::new(&self.model, generated::ARCHITECT_SYSTEM_PROMPT, prompt);
        let markdown = match self.service.complete(request).await {
            Ok(markdown) => markdown,
            Err(e) => {
                deliverable
                    .warnings
                    .push(format!("Deliverable generation failed: {}", e));
                return;
            }
        };

        let table = extract_markdown_table(&markdown);
        if table.is_none() && kind.is_catalogue() {
            deliverable.warnings.push(NO_TABLE_WARNING.to_string());
        }
        info!(
            kind = %kind,
            reply_length = markdown.len(),
            table_rows = table.as_ref().map(Table::len).unwrap_or(0),
            "deliverable generated"
        );
        deliverable.body = Some(DeliverableBody::Generated { markdown, table });
    }
}
