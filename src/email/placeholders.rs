//! `{{placeholder}}` substitution for email templates.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::Serialize;

use crate::model::Contact;

/// A placeholder the UI can offer when editing templates.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Placeholder {
    pub name: &'static str,
    pub label: &'static str,
}

pub const AVAILABLE_PLACEHOLDERS: &[Placeholder] = &[
    Placeholder { name: "contact_name", label: "Contact name" },
    Placeholder { name: "company_name", label: "Company name" },
    Placeholder { name: "contact_email", label: "Contact email" },
    Placeholder { name: "contact_phone", label: "Contact phone" },
    Placeholder { name: "meeting_date", label: "Meeting date" },
    Placeholder { name: "meeting_time", label: "Meeting time" },
    Placeholder { name: "sender_name", label: "Sender name" },
];

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([a-z_]+)\s*\}\}").unwrap());

/// Replace every placeholder that has a value. Others are left verbatim.
pub fn render(text: &str, values: &HashMap<String, String>) -> String {
    PLACEHOLDER
        .replace_all(text, |caps: &Captures| match values.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Distinct placeholder names in `text`, in order of first appearance.
pub fn placeholders_in(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in PLACEHOLDER.captures_iter(text) {
        let name = &caps[1];
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Placeholder values derived from a contact. Absent fields are omitted.
pub fn values_for_contact(contact: &Contact) -> HashMap<String, String> {
    let mut values = HashMap::new();
    values.insert("contact_name".to_string(), contact.name.clone());
    let optional = [
        ("company_name", &contact.company),
        ("contact_email", &contact.email),
        ("contact_phone", &contact.phone),
    ];
    for (key, value) in optional {
        if let Some(v) = value.as_ref().filter(|v| !v.is_empty()) {
            values.insert(key.to_string(), v.clone());
        }
    }
    values
}
