//! Driver name matching
//!
//! Carrier uploads name the driver in the file name (`Prenom_Nom.xlsx`) and
//! sequencing manifests name drivers in header ranges. Both go through
//! [`match_driver`], which has no storage dependency.

use sortdesk_common::db::Driver;

/// Lowercase, underscores as spaces, whitespace collapsed
fn normalize_name(raw: &str) -> String {
    raw.replace('_', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn first_name(driver: &Driver) -> String {
    driver.first_name.as_deref().map(normalize_name).unwrap_or_default()
}

/// Find the driver a raw name refers to
///
/// **Priority:**
/// 1. Full name, `first last`
/// 2. Reversed full name, `last first`
/// 3. Bare last name, or bare first name
///
/// Each pass scans every candidate before the next pass starts, so a full-name
/// match always beats a bare-name match found earlier in the list.
pub fn match_driver<'a>(candidates: &'a [Driver], raw_name: &str) -> Option<&'a Driver> {
    let wanted = normalize_name(raw_name);
    if wanted.is_empty() {
        return None;
    }

    let full = |d: &Driver| normalize_name(&format!("{} {}", first_name(d), d.last_name));
    let reversed = |d: &Driver| normalize_name(&format!("{} {}", d.last_name, first_name(d)));

    candidates
        .iter()
        .find(|d| full(d) == wanted)
        .or_else(|| candidates.iter().find(|d| reversed(d) == wanted))
        .or_else(|| {
            candidates
                .iter()
                .find(|d| normalize_name(&d.last_name) == wanted || first_name(d) == wanted)
        })
}
