//! Free-form address splitting around a 5-digit postal code

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

fn postal_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(\d{5})\b").expect("static postal regex"))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressParts {
    pub street: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
}

fn tidy(value: &str) -> Option<String> {
    let value = value.trim().trim_matches(',').trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Split `"street 51100 CITY"`; without a postal code the whole text is the street
pub fn split_address(full: &str) -> AddressParts {
    match postal_regex().find(full) {
        Some(m) => AddressParts {
            street: tidy(&full[..m.start()]),
            postal_code: Some(m.as_str().to_string()),
            city: tidy(&full[m.end()..]),
        },
        None => AddressParts {
            street: tidy(full),
            ..Default::default()
        },
    }
}
