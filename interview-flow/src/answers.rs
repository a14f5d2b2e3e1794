use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::question::fields;
use crate::role::Role;

macro_rules! labelled_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $label)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

labelled_enum!(
    /// How two applications talk to each other
    InterfaceType {
        Api => "API",
        Batch => "Batch",
        Webhook => "Webhook",
        MessageQueue => "Message Queue",
        Other => "Other",
    }
);

labelled_enum!(
    Protocol {
        Https => "HTTPS",
        Http => "HTTP",
        Sftp => "SFTP",
        Amqp => "AMQP",
        Mqtt => "MQTT",
        Other => "Other",
    }
);

labelled_enum!(
    Frequency {
        RealTime => "Real-Time",
        Hourly => "Hourly",
        Daily => "Daily",
        Weekly => "Weekly",
        OnDemand => "On Demand",
    }
);

/// One row of the integrations form. Every key is required; archived rows
/// that do not fit are read through [`IntegrationRow`] instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationRecord {
    #[serde(rename = "Source App")]
    pub source_app: String,
    #[serde(rename = "Target App")]
    pub target_app: String,
    #[serde(rename = "Interface Type")]
    pub interface_type: InterfaceType,
    #[serde(rename = "Protocol")]
    pub protocol: Protocol,
    #[serde(rename = "Frequency")]
    pub frequency: Frequency,
}

/// Text view of an archived integration row, whatever labels it carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrationRow {
    /// `None` when the row has no `Source App` key
    pub source_app: Option<String>,
    pub target_app: String,
    pub interface_type: String,
    pub protocol: String,
    pub frequency: String,
}

impl IntegrationRow {
    /// Reads a JSON object row; missing keys become empty text.
    pub fn from_value(value: &Value) -> Option<Self> {
        let row = value.as_object()?;
        let cell = |key: &str| match row.get(key) {
            None | Some(Value::Null) => None,
            Some(Value::String(text)) => Some(text.clone()),
            Some(other) => Some(other.to_string()),
        };
        Some(Self {
            source_app: cell("Source App"),
            target_app: cell("Target App").unwrap_or_default(),
            interface_type: cell("Interface Type").unwrap_or_default(),
            protocol: cell("Protocol").unwrap_or_default(),
            frequency: cell("Frequency").unwrap_or_default(),
        })
    }
}

impl From<&IntegrationRecord> for IntegrationRow {
    fn from(record: &IntegrationRecord) -> Self {
        Self {
            source_app: Some(record.source_app.clone()),
            target_app: record.target_app.clone(),
            interface_type: record.interface_type.as_str().to_string(),
            protocol: record.protocol.as_str().to_string(),
            frequency: record.frequency.as_str().to_string(),
        }
    }
}

/// Integration rows of one answer plus the entries that were not rows at all
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntegrationRows {
    pub rows: Vec<IntegrationRow>,
    pub unreadable: usize,
}

/// Value stored for a single question.
///
/// Untagged so the archive stays plain JSON: a string for free-text answers,
/// an array of records for integrations. Anything else found in a hand-edited
/// file is carried along as raw JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Text(String),
    Integrations(Vec<IntegrationRecord>),
    Other(Value),
}

/// Field identifier → answer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSet(BTreeMap<String, AnswerValue>);

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&AnswerValue> {
        self.0.get(field)
    }

    pub fn set_text(&mut self, field: impl Into<String>, text: impl Into<String>) {
        self.0.insert(field.into(), AnswerValue::Text(text.into()));
    }

    /// Text answer for `field`, if it was answered with text
    pub fn text(&self, field: &str) -> Option<&str> {
        match self.0.get(field) {
            Some(AnswerValue::Text(text)) => Some(text),
            _ => None,
        }
    }

    /// Integration rows recorded under `field`; empty when absent
    pub fn integrations(&self, field: &str) -> &[IntegrationRecord] {
        match self.0.get(field) {
            Some(AnswerValue::Integrations(records)) => records,
            _ => &[],
        }
    }

    /// Every integration row under `field`, including rows with labels
    /// outside the form's option lists.
    pub fn integration_rows(&self, field: &str) -> IntegrationRows {
        let mut out = IntegrationRows::default();
        match self.0.get(field) {
            Some(AnswerValue::Integrations(records)) => {
                out.rows = records.iter().map(IntegrationRow::from).collect();
            }
            Some(AnswerValue::Other(Value::Array(items))) => {
                for item in items {
                    match IntegrationRow::from_value(item) {
                        Some(row) => out.rows.push(row),
                        None => out.unreadable += 1,
                    }
                }
            }
            Some(AnswerValue::Other(Value::Null)) | Some(AnswerValue::Text(_)) | None => {}
            Some(AnswerValue::Other(other)) => match IntegrationRow::from_value(other) {
                Some(row) => out.rows.push(row),
                None => out.unreadable += 1,
            },
        }
        out
    }

    /// Appends a row, replacing any non-list value stored under `field`.
    pub fn push_integration(&mut self, field: &str, record: IntegrationRecord) -> usize {
        let entry = self
            .0
            .entry(field.to_string())
            .or_insert_with(|| AnswerValue::Integrations(Vec::new()));
        if let AnswerValue::Integrations(records) = entry {
            records.push(record);
            return records.len();
        }
        *entry = AnswerValue::Integrations(vec![record]);
        1
    }

    /// Makes sure `field` holds a (possibly empty) record list.
    pub fn ensure_integrations(&mut self, field: &str) {
        self.0
            .entry(field.to_string())
            .or_insert_with(|| AnswerValue::Integrations(Vec::new()));
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AnswerValue)> {
        self.0.iter()
    }
}

/// The document written to the archive for one completed interview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedInterview {
    #[serde(flatten)]
    pub answers: AnswerSet,
    #[serde(default)]
    pub stakeholder_role: String,
}

impl PersistedInterview {
    pub fn new(answers: AnswerSet, role: Role) -> Self {
        Self {
            answers,
            stakeholder_role: role.as_str().to_string(),
        }
    }

    pub fn role(&self) -> Option<Role> {
        Role::classify(&self.stakeholder_role)
    }

    /// The value the archive file is named after
    pub fn representative_name(&self) -> &str {
        [fields::APPLICATION_NAME, fields::BUSINESS_DOMAIN]
            .iter()
            .filter_map(|field| self.answers.text(field))
            .find(|name| !name.trim().is_empty())
            .unwrap_or("entity")
    }
}
