use interview_flow::{PersistedInterview, fields, role::display_name};
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use super::table::Table;

static CAPABILITY_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)cab\s*\d+\s*[:\-]?\s*").expect("capability code pattern is valid")
});
static ENUMERATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\(?\d+[.):\-]\s*").expect("enumeration pattern is valid")
});

/// Annotated grid of values keyed by row and column label
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Heatmap {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    /// `values[row][column]`
    pub values: Vec<Vec<f64>>,
}

impl Heatmap {
    /// Count matrix over `(row, column)` pairs; labels are sorted and missing cells are 0.
    pub fn count(
        title: impl Into<String>,
        x_label: impl Into<String>,
        y_label: impl Into<String>,
        pairs: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        let mut counts: BTreeMap<(String, String), u32> = BTreeMap::new();
        let mut rows = BTreeSet::new();
        let mut columns = BTreeSet::new();
        for (row, column) in pairs {
            rows.insert(row.clone());
            columns.insert(column.clone());
            *counts.entry((row, column)).or_default() += 1;
        }

        let rows: Vec<String> = rows.into_iter().collect();
        let columns: Vec<String> = columns.into_iter().collect();
        let values = rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|column| {
                        counts
                            .get(&(row.clone(), column.clone()))
                            .copied()
                            .unwrap_or(0) as f64
                    })
                    .collect()
            })
            .collect();

        Self {
            title: title.into(),
            x_label: x_label.into(),
            y_label: y_label.into(),
            rows,
            columns,
            values,
        }
    }

    /// Single-row heatmap, one column per labelled value.
    pub fn single_row(
        title: impl Into<String>,
        row: impl Into<String>,
        cells: impl IntoIterator<Item = (String, f64)>,
    ) -> Self {
        let (columns, values): (Vec<String>, Vec<f64>) = cells.into_iter().unzip();
        Self {
            title: title.into(),
            x_label: String::new(),
            y_label: String::new(),
            rows: vec![row.into()],
            columns,
            values: vec![values],
        }
    }

    pub fn value(&self, row: &str, column: &str) -> Option<f64> {
        let r = self.rows.iter().position(|label| label == row)?;
        let c = self.columns.iter().position(|label| label == column)?;
        Some(self.values[r][c])
    }

    pub fn total(&self) -> f64 {
        self.values.iter().flatten().sum()
    }

    /// The grid as a table: a label column followed by one column per x label.
    pub fn to_table(&self) -> Table {
        let corner = match (self.y_label.is_empty(), self.x_label.is_empty()) {
            (true, true) => String::new(),
            _ => format!("{} \\ {}", self.y_label, self.x_label),
        };
        let mut table = Table::new(std::iter::once(corner).chain(self.columns.iter().cloned()));
        for (label, values) in self.rows.iter().zip(&self.values) {
            table.push_row(
                std::iter::once(label.clone()).chain(values.iter().map(|v| v.to_string())),
            );
        }
        table
    }

    /// Renders the grid as a markdown table with every cell annotated.
    pub fn to_markdown(&self) -> String {
        format!("### {}\n\n{}", self.title, self.to_table().to_markdown())
    }
}

/// Line of business × category over application interviews.
pub fn application_heatmap(apps: &[&PersistedInterview]) -> Option<(Heatmap, Table)> {
    if apps.is_empty() {
        return None;
    }

    let mut details = Table::new(["Application", "Line of Business", "Category"]);
    let mut pairs = Vec::with_capacity(apps.len());
    for app in apps {
        let name = app
            .answers
            .text(fields::APPLICATION_NAME)
            .unwrap_or("Unnamed");
        let lob = normalised(app.answers.text(fields::LINE_OF_BUSINESS), "n/a");
        let category = normalised(app.answers.text(fields::CATEGORY_TYPE), "unspecified");
        details.push_row([name.to_string(), lob.clone(), category.clone()]);
        pairs.push((lob, category));
    }

    let heatmap = Heatmap::count(
        "Application Heatmap by LOB vs Category",
        "Application Category",
        "Line of Business",
        pairs,
    );
    Some((heatmap, details))
}

/// Line of business × capability over business interviews; `None` when no
/// capability could be extracted.
pub fn business_heatmap(businesses: &[&PersistedInterview]) -> Option<(Heatmap, Table)> {
    let mut details = Table::new(["Line of Business", "Capability"]);
    let mut pairs = Vec::new();
    for business in businesses {
        let lob = business
            .answers
            .text(fields::BUSINESS_DOMAIN)
            .map(display_name)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "Unknown".to_string());
        let raw = business.answers.text(fields::CAPABILITIES).unwrap_or_default();
        for capability in parse_capabilities(raw) {
            details.push_row([lob.clone(), capability.clone()]);
            pairs.push((lob.clone(), capability));
        }
    }

    if pairs.is_empty() {
        return None;
    }
    let heatmap = Heatmap::count(
        "Business Capability Coverage Heatmap",
        "Capability",
        "Line of Business",
        pairs,
    );
    Some((heatmap, details))
}

/// Splits a free-text capability list into cleaned capability names.
///
/// One capability per line; bullets, numbering and `CAB n:` codes are
/// removed and the result is capitalised (`"- cab 2: CREDIT scoring"` becomes
/// `"Credit scoring"`).
pub fn parse_capabilities(raw: &str) -> Vec<String> {
    raw.lines()
        .map(|line| line.trim().trim_matches(|c: char| matches!(c, '-' | '*' | '•' | ' ')))
        .map(|line| ENUMERATION.replace(line, ""))
        .map(|line| CAPABILITY_CODE.replace_all(&line, "").trim().to_string())
        .filter(|line| !line.is_empty())
        .map(|line| capitalise(&line))
        .collect()
}

fn capitalise(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

fn normalised(value: Option<&str>, default: &str) -> String {
    value
        .map(|v| v.trim().to_lowercase())
        .unwrap_or_else(|| default.to_string())
}
