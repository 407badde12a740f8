//! Multi-driver sequencing manifest
//!
//! The header carries one `(NAME start-end)` group per driver; each manifest
//! line reads `<order> <address ...> [HH:MM] <tracking>`. A parcel belongs to
//! the first range containing its global order, and its position within the
//! driver's route is `order - start + 1`.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{normalize_tracking, ParseError};

/// Tracking pattern recognized inside manifest lines; the code must end at a word boundary
pub const TRACKING_PATTERN: &str = r"[A-Z]{2}FR\d{10,20}(?:[A-Z]{2})?\b";

fn range_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\(\s*([\p{L}_'-]+)\s+(\d+)\s*-\s*(\d+)\s*\)").expect("static range regex")
    })
}

fn line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(\d+)\s+(.+)$").expect("static line regex"))
}

fn tracking_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!("(?i){TRACKING_PATTERN}")).expect("static tracking regex"))
}

fn trailing_time_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*\d{1,2}:\d{2}\s*$").expect("static time regex"))
}

/// `(NAME start-end)` header group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverRange {
    pub driver_name: String,
    pub start: u32,
    pub end: u32,
}

impl DriverRange {
    pub fn contains(&self, order: u32) -> bool {
        order >= self.start && order <= self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequencedParcel {
    pub tracking_code: String,
    pub address: String,
    /// Global order number in the manifest
    pub order: u32,
    /// 1-based position within the driver's own route
    pub position: u32,
}

/// Parcels grouped under one header range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverManifest {
    pub driver_name: String,
    pub range_start: u32,
    pub range_end: u32,
    pub parcels: Vec<SequencedParcel>,
}

/// All header ranges, in document order
pub fn driver_ranges(text: &str) -> Vec<DriverRange> {
    range_regex()
        .captures_iter(text)
        .filter_map(|caps| {
            Some(DriverRange {
                driver_name: caps[1].to_uppercase(),
                start: caps[2].parse().ok()?,
                end: caps[3].parse().ok()?,
            })
        })
        .collect()
}

/// `(order, tracking, address)` for a manifest line, `None` for anything else
fn manifest_line(line: &str) -> Option<(u32, String, String)> {
    let caps = line_regex().captures(line)?;
    let order: u32 = caps[1].parse().ok()?;
    let rest = caps.get(2)?.as_str();

    let tracking = tracking_regex().find(rest)?;
    let before = rest[..tracking.start()].trim();
    let address = trailing_time_regex().replace(before, "").trim().to_string();

    Some((order, normalize_tracking(tracking.as_str()), address))
}

/// Group manifest lines by driver range
///
/// Drivers whose range matched no line are omitted. A document without any
/// header range is not a multi-driver manifest.
pub fn parse(text: &str) -> Result<Vec<DriverManifest>, ParseError> {
    let ranges = driver_ranges(text);
    if ranges.is_empty() {
        return Err(ParseError::MissingDriverRanges);
    }

    let mut manifests: Vec<DriverManifest> = ranges
        .iter()
        .map(|range| DriverManifest {
            driver_name: range.driver_name.clone(),
            range_start: range.start,
            range_end: range.end,
            parcels: Vec::new(),
        })
        .collect();

    for line in text.lines() {
        let Some((order, tracking_code, address)) = manifest_line(line) else {
            continue;
        };
        let Some(idx) = ranges.iter().position(|range| range.contains(order)) else {
            continue;
        };
        manifests[idx].parcels.push(SequencedParcel {
            tracking_code,
            address,
            order,
            position: order - ranges[idx].start + 1,
        });
    }

    manifests.retain(|manifest| !manifest.parcels.is_empty());
    Ok(manifests)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest_text(count: u32) -> String {
        let mut text = String::from("TOURNEE SPOKE REIMS (HAKIM 1-69) (LOUIS 70-168) (NADIA 169-200)\n\nN° Adresse Heure Colis\n");
        for order in 1..=count {
            text.push_str(&format!(
                "{order} {order} RUE DE LA PAIX 51100 REIMS 08:{:02} CNFR{:012}HD\n",
                order % 60,
                order
            ));
        }
        text
    }

    #[test]
    fn test_header_ranges_extracted_in_order() {
        let ranges = driver_ranges("Spoke (hakim 1-69) (LOUIS 70 - 168) (note)");
        assert_eq!(
            ranges,
            vec![
                DriverRange { driver_name: "HAKIM".into(), start: 1, end: 69 },
                DriverRange { driver_name: "LOUIS".into(), start: 70, end: 168 },
            ]
        );
    }

    #[test]
    fn test_relative_positions_per_driver() {
        let manifests = parse(&manifest_text(168)).unwrap();

        // NADIA's range matched nothing and is dropped
        assert_eq!(manifests.len(), 2);

        let hakim = &manifests[0];
        assert_eq!(hakim.driver_name, "HAKIM");
        assert_eq!(hakim.parcels.len(), 69);
        assert_eq!(hakim.parcels.first().map(|p| p.position), Some(1));
        assert_eq!(hakim.parcels.last().map(|p| p.position), Some(69));

        let louis = &manifests[1];
        assert_eq!(louis.driver_name, "LOUIS");
        assert_eq!(louis.parcels.len(), 99);
        assert_eq!(louis.parcels[0].order, 70);
        assert_eq!(louis.parcels[0].position, 1);
        assert_eq!(louis.parcels.last().map(|p| p.position), Some(99));
    }

    #[test]
    fn test_adjacent_header_groups() {
        let mut text = String::from("(HAKIM 1-69)(LOUIS 70-168)\n");
        for order in 1..=168u32 {
            text.push_str(&format!("{order} 2 RUE CERES 51100 REIMS 09:{:02} GFFR{:012}\n", order % 60, order));
        }

        let manifests = parse(&text).unwrap();
        assert_eq!(manifests.len(), 2);
        assert_eq!(manifests[0].driver_name, "HAKIM");
        assert_eq!(manifests[0].parcels.len(), 69);
        assert_eq!(manifests[0].parcels.last().map(|p| p.position), Some(69));
        assert_eq!(manifests[1].driver_name, "LOUIS");
        assert_eq!(manifests[1].parcels.len(), 99);
        assert_eq!(manifests[1].parcels.first().map(|p| p.position), Some(1));
        assert_eq!(manifests[1].parcels.last().map(|p| p.position), Some(99));
    }

    #[test]
    fn test_overlong_tracking_is_not_truncated() {
        assert!(manifest_line("3 1 RUE X 51100 REIMS CNFR1234567890123456789012").is_none());
        assert!(manifest_line("3 1 RUE X 51100 REIMS CNFR12345678901234567890HDX").is_none());

        let (_, tracking, _) = manifest_line("3 1 RUE X 51100 REIMS CNFR12345678901234567890HD").unwrap();
        assert_eq!(tracking, "CNFR12345678901234567890HD");
    }

    #[test]
    fn test_line_strips_trailing_time_from_address() {
        let (order, tracking, address) =
            manifest_line("12 4 RUE DU BARBATRE 51100 REIMS 00:09 cnfr1234567890hd").unwrap();
        assert_eq!(order, 12);
        assert_eq!(tracking, "CNFR1234567890HD");
        assert_eq!(address, "4 RUE DU BARBATRE 51100 REIMS");
    }

    #[test]
    fn test_line_without_tracking_is_ignored() {
        assert!(manifest_line("12 4 RUE DU BARBATRE 51100 REIMS").is_none());
        assert!(manifest_line("Page 2/4").is_none());
    }

    #[test]
    fn test_order_outside_every_range_is_dropped() {
        let text = "(ANA 1-2)\n1 A CNFR1234567890\n5 B CNFR1234567891\n";
        let manifests = parse(text).unwrap();
        assert_eq!(manifests.len(), 1);
        assert_eq!(manifests[0].parcels.len(), 1);
    }

    #[test]
    fn test_overlapping_ranges_first_wins() {
        let text = "(ANA 1-10) (BOB 5-20)\n7 A CNFR1234567890\n12 B CNFR1234567891\n";
        let manifests = parse(text).unwrap();
        assert_eq!(manifests[0].driver_name, "ANA");
        assert_eq!(manifests[0].parcels[0].position, 7);
        assert_eq!(manifests[1].driver_name, "BOB");
        assert_eq!(manifests[1].parcels[0].position, 8);
    }
}
