use serde::{Deserialize, Serialize};
use std::fmt;

use crate::question::{APPLICATION_OWNER_QUESTIONS, BUSINESS_OWNER_QUESTIONS, Question};

/// Stakeholder category governing which question script is used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "Application Owner")]
    ApplicationOwner,
    #[serde(rename = "Business Owner")]
    BusinessOwner,
}

/// Stakeholders recognised by first name
const KNOWN_USERS: &[(&str, Role)] = &[
    ("ahmad", Role::ApplicationOwner),
    ("ibrahim", Role::ApplicationOwner),
    ("wajdi", Role::ApplicationOwner),
    ("omar", Role::BusinessOwner),
    ("shadi", Role::BusinessOwner),
    ("khalaf", Role::BusinessOwner),
];

impl Role {
    pub const ALL: [Role; 2] = [Role::ApplicationOwner, Role::BusinessOwner];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::ApplicationOwner => "Application Owner",
            Role::BusinessOwner => "Business Owner",
        }
    }

    /// The role's ordered interview script
    pub fn questions(&self) -> &'static [Question] {
        match self {
            Role::ApplicationOwner => &APPLICATION_OWNER_QUESTIONS,
            Role::BusinessOwner => &BUSINESS_OWNER_QUESTIONS,
        }
    }

    /// Prefix used for archive file names, e.g. `ApplicationOwner`
    pub fn file_prefix(&self) -> String {
        self.as_str().replace(' ', "")
    }

    /// Classifies a persisted `stakeholder_role` tag.
    ///
    /// Matching is by substring so that hand-edited files (`"application owner"`,
    /// `"Business owner (Finance)"`) still land in the right bucket.
    pub fn classify(tag: &str) -> Option<Role> {
        let tag = tag.to_lowercase();
        if tag.contains("application") {
            Some(Role::ApplicationOwner)
        } else if tag.contains("business") {
            Some(Role::BusinessOwner)
        } else {
            None
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Looks the stakeholder up by first name, ignoring case and surrounding whitespace.
pub fn resolve_known_role(name: &str) -> Option<Role> {
    let first = name.split_whitespace().next()?.to_lowercase();
    KNOWN_USERS
        .iter()
        .find(|(known, _)| *known == first)
        .map(|(_, role)| *role)
}

/// Title-cases a raw name for greetings: `"jOHN smith"` becomes `"John Smith"`.
pub fn display_name(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_names_resolve_regardless_of_case_and_whitespace() {
        assert_eq!(resolve_known_role("Omar"), Some(Role::BusinessOwner));
        assert_eq!(resolve_known_role("  OMAR \n"), Some(Role::BusinessOwner));
        assert_eq!(resolve_known_role("wAjDi"), Some(Role::ApplicationOwner));
        assert_eq!(resolve_known_role("ahmad"), Some(Role::ApplicationOwner));
    }

    #[test]
    fn only_the_first_name_is_looked_up() {
        assert_eq!(
            resolve_known_role("Ibrahim Haddad"),
            Some(Role::ApplicationOwner)
        );
        assert_eq!(resolve_known_role("Haddad Ibrahim"), None);
    }

    #[test]
    fn unknown_or_empty_names_do_not_resolve() {
        assert_eq!(resolve_known_role("zara"), None);
        assert_eq!(resolve_known_role("   "), None);
        assert_eq!(resolve_known_role(""), None);
    }

    #[test]
    fn classify_is_loose_on_persisted_tags() {
        assert_eq!(
            Role::classify("Application Owner"),
            Some(Role::ApplicationOwner)
        );
        assert_eq!(
            Role::classify("business owner (finance)"),
            Some(Role::BusinessOwner)
        );
        assert_eq!(Role::classify("Auditor"), None);
        assert_eq!(Role::classify(""), None);
    }

    #[test]
    fn roles_carry_their_scripts() {
        assert_eq!(Role::ApplicationOwner.questions().len(), 6);
        assert_eq!(Role::BusinessOwner.questions().len(), 5);
        assert!(Role::ApplicationOwner.questions()[5].is_integrations());
        assert!(
            Role::BusinessOwner
                .questions()
                .iter()
                .all(|q| !q.is_integrations())
        );
    }

    #[test]
    fn prefixes_and_serialisation() {
        assert_eq!(Role::ApplicationOwner.file_prefix(), "ApplicationOwner");
        assert_eq!(
            serde_json::to_string(&Role::BusinessOwner).unwrap(),
            "\"Business Owner\""
        );
        let role: Role = serde_json::from_str("\"Application Owner\"").unwrap();
        assert_eq!(role, Role::ApplicationOwner);
    }

    #[test]
    fn display_name_title_cases_words() {
        assert_eq!(display_name("zara"), "Zara");
        assert_eq!(display_name("  jOHN   smith "), "John Smith");
    }
}
