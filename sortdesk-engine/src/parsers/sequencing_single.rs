//! Single-route sequencing list
//!
//! One entry per line of the form `<order><separator><code>`, where the
//! separator is any run of dots, dashes or whitespace and the code is an
//! alphanumeric token of at least 8 characters.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::normalize_tracking;

fn entry_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(\d+)[.\-\s]+([A-Z0-9]{8,})").expect("static entry regex"))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceEntry {
    pub order: u32,
    pub tracking_code: String,
}

pub fn parse(text: &str) -> Vec<SequenceEntry> {
    text.lines()
        .filter_map(|line| {
            let caps = entry_regex().captures(line.trim())?;
            Some(SequenceEntry {
                order: caps[1].parse().ok()?,
                tracking_code: normalize_tracking(&caps[2]),
            })
        })
        .collect()
}
