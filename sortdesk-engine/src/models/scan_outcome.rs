//! Scan classification results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sortdesk_common::db::{Parcel, Route};
use uuid::Uuid;

/// Route context shown to the scanning operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSummary {
    pub route_id: Uuid,
    pub driver_id: Uuid,
    pub driver_name: Option<String>,
    pub parcel_count: u32,
    pub sequence_number: Option<u32>,
}

impl RouteSummary {
    pub fn new(route: &Route, parcel: &Parcel, driver_name: Option<String>) -> Self {
        Self {
            route_id: route.id,
            driver_id: route.driver_id,
            driver_name,
            parcel_count: route.parcel_count,
            sequence_number: parcel.sequence_number,
        }
    }
}

/// Outcome of one scan attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ScanOutcome {
    /// First scan; the parcel is now sorted
    Success {
        parcel: Parcel,
        route: Option<RouteSummary>,
    },
    /// The parcel already had a live scan; reports the scan that was replaced
    Duplicate {
        parcel: Parcel,
        route: Option<RouteSummary>,
        first_operator_id: Uuid,
        first_scanned_at: DateTime<Utc>,
    },
    /// Code absent from every import for the Day
    Unknown { tracking_code: String },
}

impl ScanOutcome {
    pub fn kind(&self) -> &'static str {
        match self {
            ScanOutcome::Success { .. } => "success",
            ScanOutcome::Duplicate { .. } => "duplicate",
            ScanOutcome::Unknown { .. } => "unknown",
        }
    }
}

/// One entry of an offline batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfflineScan {
    pub tracking_code: String,
    pub scanned_at: DateTime<Utc>,
}

/// Aggregate counts of an offline batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSummary {
    pub total: u32,
    pub synced: u32,
    pub duplicates: u32,
    pub unknown: u32,
}
