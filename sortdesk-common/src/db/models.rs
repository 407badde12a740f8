//! Database models
//!
//! Status and source enums are stored as lowercase/camelCase TEXT; `as_str` and
//! `FromStr` are the only conversions between the two forms.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::Error;

/// Lifecycle of a sorting day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayStatus {
    Active,
    Closed,
}

impl DayStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DayStatus::Active => "active",
            DayStatus::Closed => "closed",
        }
    }
}

impl FromStr for DayStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(DayStatus::Active),
            "closed" => Ok(DayStatus::Closed),
            other => Err(Error::InvalidInput(format!("Unknown day status: {}", other))),
        }
    }
}

/// One calendar date of sorting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Day {
    pub id: Uuid,
    pub date: NaiveDate,
    pub status: DayStatus,
    pub cutoff: Option<NaiveTime>,
    pub cutoff_enforced: bool,
    pub created_at: DateTime<Utc>,
}

impl Day {
    pub fn is_active(&self) -> bool {
        self.status == DayStatus::Active
    }
}

/// Values applied when a Day is created lazily
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayDefaults {
    pub cutoff: Option<NaiveTime>,
    pub cutoff_enforced: bool,
}

/// Driver directory entry (maintained outside the engine)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Driver {
    pub id: Uuid,
    pub first_name: Option<String>,
    pub last_name: String,
    pub subcontractor_id: Option<Uuid>,
    pub active: bool,
}

impl Driver {
    /// "First Last", or just the last name when no first name is known
    pub fn display_name(&self) -> String {
        match &self.first_name {
            Some(first) if !first.trim().is_empty() => format!("{} {}", first.trim(), self.last_name.trim()),
            _ => self.last_name.trim().to_string(),
        }
    }
}

/// A driver's delivery route for one Day
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub id: Uuid,
    pub day_id: Uuid,
    pub driver_id: Uuid,
    /// Declared parcel count, recomputed after each import batch
    pub parcel_count: u32,
    /// Whether a sequencing document has been applied
    pub sequencing_applied: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParcelStatus {
    Unsorted,
    Sorted,
    Unknown,
}

impl ParcelStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParcelStatus::Unsorted => "unsorted",
            ParcelStatus::Sorted => "sorted",
            ParcelStatus::Unknown => "unknown",
        }
    }
}

impl FromStr for ParcelStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unsorted" => Ok(ParcelStatus::Unsorted),
            "sorted" => Ok(ParcelStatus::Sorted),
            "unknown" => Ok(ParcelStatus::Unknown),
            other => Err(Error::InvalidInput(format!("Unknown parcel status: {}", other))),
        }
    }
}

/// Where a parcel row came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParcelSource {
    CarrierA,
    CarrierB,
    Sequencing,
    Unknown,
}

impl ParcelSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParcelSource::CarrierA => "carrierA",
            ParcelSource::CarrierB => "carrierB",
            ParcelSource::Sequencing => "sequencing",
            ParcelSource::Unknown => "unknown",
        }
    }
}

impl FromStr for ParcelSource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "carrierA" => Ok(ParcelSource::CarrierA),
            "carrierB" => Ok(ParcelSource::CarrierB),
            "sequencing" => Ok(ParcelSource::Sequencing),
            "unknown" => Ok(ParcelSource::Unknown),
            other => Err(Error::InvalidInput(format!("Unknown parcel source: {}", other))),
        }
    }
}

/// A parcel expected (or seen) on a given Day
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parcel {
    pub id: Uuid,
    pub day_id: Uuid,
    pub route_id: Option<Uuid>,
    /// Natural key, stored uppercase
    pub tracking_code: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub region: Option<String>,
    pub source: ParcelSource,
    pub status: ParcelStatus,
    pub sequence_number: Option<u32>,
}

impl Parcel {
    /// Address, postal code and city joined for display
    pub fn full_address(&self) -> String {
        [&self.address, &self.postal_code, &self.city]
            .into_iter()
            .filter_map(|part| part.as_deref())
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Fields for `ParcelStore::insert_parcel`
#[derive(Debug, Clone)]
pub struct NewParcel {
    pub day_id: Uuid,
    pub route_id: Option<Uuid>,
    pub tracking_code: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub region: Option<String>,
    pub source: ParcelSource,
    pub status: ParcelStatus,
    pub sequence_number: Option<u32>,
}

impl NewParcel {
    /// Row for a tracking code seen at scan time but absent from every import
    pub fn unknown(day_id: Uuid, tracking_code: String) -> Self {
        Self {
            day_id,
            route_id: None,
            tracking_code,
            address: None,
            city: None,
            postal_code: None,
            region: None,
            source: ParcelSource::Unknown,
            status: ParcelStatus::Unknown,
            sequence_number: None,
        }
    }
}

/// The single live scan of a parcel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scan {
    pub id: Uuid,
    pub parcel_id: Uuid,
    pub operator_id: Uuid,
    pub scanned_at: DateTime<Utc>,
    pub offline: bool,
}

/// Layout of an ingested document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentFormat {
    CarrierA,
    CarrierB,
    /// Positional fallback for spreadsheets the classifier did not recognize
    Unknown,
    SequencingMulti,
    SequencingSingle,
}

impl DocumentFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentFormat::CarrierA => "carrierA",
            DocumentFormat::CarrierB => "carrierB",
            DocumentFormat::Unknown => "unknown",
            DocumentFormat::SequencingMulti => "sequencingMulti",
            DocumentFormat::SequencingSingle => "sequencingSingle",
        }
    }

    /// Source tag given to parcels inserted from this format
    pub fn parcel_source(&self) -> ParcelSource {
        match self {
            DocumentFormat::CarrierA => ParcelSource::CarrierA,
            DocumentFormat::CarrierB => ParcelSource::CarrierB,
            DocumentFormat::Unknown => ParcelSource::Unknown,
            DocumentFormat::SequencingMulti | DocumentFormat::SequencingSingle => {
                ParcelSource::Sequencing
            }
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "carrierA" => Ok(DocumentFormat::CarrierA),
            "carrierB" => Ok(DocumentFormat::CarrierB),
            "unknown" => Ok(DocumentFormat::Unknown),
            "sequencingMulti" => Ok(DocumentFormat::SequencingMulti),
            "sequencingSingle" => Ok(DocumentFormat::SequencingSingle),
            other => Err(Error::InvalidInput(format!("Unknown document format: {}", other))),
        }
    }
}

/// Append-only audit entry, one per ingestion call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRecord {
    pub id: Uuid,
    pub day_id: Uuid,
    pub route_id: Option<Uuid>,
    pub driver_id: Option<Uuid>,
    pub file_name: String,
    pub format: DocumentFormat,
    pub added_count: u32,
    pub skipped_count: u32,
    pub created_at: DateTime<Utc>,
}

/// Fields for `ImportLog::record_import`
#[derive(Debug, Clone)]
pub struct NewImportRecord {
    pub day_id: Uuid,
    pub route_id: Option<Uuid>,
    pub driver_id: Option<Uuid>,
    pub file_name: String,
    pub format: DocumentFormat,
    pub added_count: u32,
    pub skipped_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parcel() -> Parcel {
        Parcel {
            id: Uuid::new_v4(),
            day_id: Uuid::new_v4(),
            route_id: None,
            tracking_code: "GFFR12345678901".to_string(),
            address: Some("12 rue de Paris".to_string()),
            city: Some("Ivry-sur-Seine".to_string()),
            postal_code: Some("94200".to_string()),
            region: None,
            source: ParcelSource::CarrierA,
            status: ParcelStatus::Unsorted,
            sequence_number: None,
        }
    }

    #[test]
    fn test_full_address_joins_present_parts() {
        assert_eq!(parcel().full_address(), "12 rue de Paris, 94200, Ivry-sur-Seine");

        let mut partial = parcel();
        partial.postal_code = None;
        partial.city = Some("  ".to_string());
        assert_eq!(partial.full_address(), "12 rue de Paris");
    }

    #[test]
    fn test_enum_text_forms_roundtrip() {
        for status in [ParcelStatus::Unsorted, ParcelStatus::Sorted, ParcelStatus::Unknown] {
            assert_eq!(status.as_str().parse::<ParcelStatus>().unwrap(), status);
        }
        for source in [
            ParcelSource::CarrierA,
            ParcelSource::CarrierB,
            ParcelSource::Sequencing,
            ParcelSource::Unknown,
        ] {
            assert_eq!(source.as_str().parse::<ParcelSource>().unwrap(), source);
        }
        assert!("trie".parse::<ParcelStatus>().is_err());
    }

    #[test]
    fn test_serde_tags_match_stored_text() {
        assert_eq!(serde_json::to_string(&ParcelSource::CarrierB).unwrap(), "\"carrierB\"");
        assert_eq!(
            serde_json::to_string(&DocumentFormat::SequencingMulti).unwrap(),
            "\"sequencingMulti\""
        );
        assert_eq!(serde_json::to_string(&DayStatus::Closed).unwrap(), "\"closed\"");
    }

    #[test]
    fn test_driver_display_name() {
        let mut driver = Driver {
            id: Uuid::new_v4(),
            first_name: Some("Hakim".to_string()),
            last_name: "Benali".to_string(),
            subcontractor_id: None,
            active: true,
        };
        assert_eq!(driver.display_name(), "Hakim Benali");
        driver.first_name = None;
        assert_eq!(driver.display_name(), "Benali");
    }
}
