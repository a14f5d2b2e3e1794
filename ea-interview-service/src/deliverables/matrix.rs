use interview_flow::{PersistedInterview, fields};

use super::table::Table;

pub const MATRIX_COLUMNS: [&str; 5] = [
    "Source App",
    "Target App",
    "Interface Type",
    "Protocol",
    "Frequency",
];

/// One row per recorded integration, cells copied as they were archived.
///
/// A row without a `Source App` key is attributed to its application. Entries
/// that are not rows at all are reported in the returned warnings.
pub fn integration_matrix(apps: &[&PersistedInterview]) -> (Table, Vec<String>) {
    let mut table = Table::new(MATRIX_COLUMNS);
    let mut warnings = Vec::new();
    for app in apps {
        let app_name = app
            .answers
            .text(fields::APPLICATION_NAME)
            .unwrap_or("Unknown");
        let read = app.answers.integration_rows(fields::INTEGRATIONS);
        if read.unreadable > 0 {
            warnings.push(format!(
                "{}: {} integration entr{} could not be read",
                app_name,
                read.unreadable,
                if read.unreadable == 1 { "y" } else { "ies" }
            ));
        }
        for row in read.rows {
            table.push_row([
                row.source_app.unwrap_or_else(|| app_name.to_string()),
                row.target_app,
                row.interface_type,
                row.protocol,
                row.frequency,
            ]);
        }
    }
    (table, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use interview_flow::{AnswerSet, Frequency, IntegrationRecord, InterfaceType, Protocol, Role};
    use serde_json::json;

    fn app(name: &str, targets: &[&str]) -> PersistedInterview {
        let mut answers = AnswerSet::new();
        answers.set_text(fields::APPLICATION_NAME, name);
        answers.ensure_integrations(fields::INTEGRATIONS);
        for target in targets {
            answers.push_integration(
                fields::INTEGRATIONS,
                IntegrationRecord {
                    source_app: name.to_string(),
                    target_app: target.to_string(),
                    interface_type: InterfaceType::MessageQueue,
                    protocol: Protocol::Mqtt,
                    frequency: Frequency::Hourly,
                },
            );
        }
        PersistedInterview::new(answers, Role::ApplicationOwner)
    }

    #[test]
    fn one_row_per_integration_record() {
        let a = app("Hub", &["ERP", "CRM"]);
        let b = app("Portal", &[]);
        let mut c = app("Lake", &["BI"]);
        c.answers.push_integration(
            fields::INTEGRATIONS,
            IntegrationRecord {
                source_app: "Gateway".to_string(),
                target_app: "Lake".to_string(),
                interface_type: InterfaceType::Api,
                protocol: Protocol::Https,
                frequency: Frequency::RealTime,
            },
        );

        let (table, warnings) = integration_matrix(&[&a, &b, &c]);
        assert!(warnings.is_empty());
        assert_eq!(table.columns, MATRIX_COLUMNS);
        assert_eq!(table.len(), 4);
        assert_eq!(table.rows[0], ["Hub", "ERP", "Message Queue", "MQTT", "Hourly"]);
        assert_eq!(table.rows[3], ["Gateway", "Lake", "API", "HTTPS", "Real-Time"]);
    }

    #[test]
    fn hand_edited_rows_are_copied_verbatim() {
        let interview: PersistedInterview = serde_json::from_value(json!({
            "application_name": "Hub",
            "integrations": [
                {
                    "Source App": "Hub",
                    "Target App": "ERP",
                    "Interface Type": "API",
                    "Protocol": "HTTPS",
                    "Frequency": "Daily"
                },
                {
                    "Source App": "",
                    "Target App": "Mainframe",
                    "Interface Type": "SOAP",
                    "Protocol": "https",
                    "Frequency": "Nightly"
                },
                { "Target App": "CRM", "Protocol": "HTTP" },
                42
            ],
            "stakeholder_role": "Application Owner"
        }))
        .unwrap();

        let (table, warnings) = integration_matrix(&[&interview]);
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows[0], ["Hub", "ERP", "API", "HTTPS", "Daily"]);
        assert_eq!(table.rows[1], ["", "Mainframe", "SOAP", "https", "Nightly"]);
        assert_eq!(table.rows[2], ["Hub", "CRM", "", "HTTP", ""]);
        assert_eq!(warnings, vec!["Hub: 1 integration entry could not be read"]);
    }

    #[test]
    fn no_records_gives_an_empty_matrix() {
        assert!(integration_matrix(&[&app("Hub", &[])]).0.is_empty());
        assert!(integration_matrix(&[]).0.is_empty());
    }
}
