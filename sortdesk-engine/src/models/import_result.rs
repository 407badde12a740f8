//! Import outcome summaries
//!
//! Per-record anomalies are accumulated here as [`ImportIssue`]s instead of
//! aborting the call.

use serde::{Deserialize, Serialize};
use sortdesk_common::db::DocumentFormat;
use uuid::Uuid;

/// Issue severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    /// Informational, nothing was lost
    Warning,
    /// A record or driver block was left out, the batch continued
    Skip,
    /// The batch could not continue
    Critical,
}

/// One anomaly recorded during an import
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportIssue {
    /// Machine code, e.g. `DRIVER_NOT_FOUND`
    pub code: String,
    pub message: String,
    pub severity: IssueSeverity,
}

impl ImportIssue {
    pub fn warning(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            severity: IssueSeverity::Warning,
        }
    }

    pub fn skip(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            severity: IssueSeverity::Skip,
        }
    }
}

/// Result of `importParcels` for one carrier document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportSummary {
    pub import_id: Uuid,
    pub day_id: Uuid,
    pub route_id: Uuid,
    pub driver_id: Uuid,
    pub file_name: String,
    pub format: DocumentFormat,
    pub added_count: u32,
    pub skipped_count: u32,
    pub total_parsed: u32,
    /// Route parcel count after the batch
    pub route_parcel_count: u32,
    pub errors: Vec<ImportIssue>,
}

/// Per-driver result of a multi-driver sequencing import
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DriverImportOutcome {
    Imported {
        driver_name: String,
        driver_id: Uuid,
        route_id: Uuid,
        added_count: u32,
        skipped_count: u32,
        parcel_count: u32,
    },
    DriverNotFound {
        driver_name: String,
        parcel_count: u32,
    },
}

impl DriverImportOutcome {
    pub fn driver_name(&self) -> &str {
        match self {
            DriverImportOutcome::Imported { driver_name, .. }
            | DriverImportOutcome::DriverNotFound { driver_name, .. } => driver_name,
        }
    }
}

/// Result of a multi-driver sequencing import
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestImportSummary {
    pub import_id: Uuid,
    pub day_id: Uuid,
    pub file_name: String,
    pub drivers: Vec<DriverImportOutcome>,
    pub added_count: u32,
    pub skipped_count: u32,
    pub total_parsed: u32,
    pub errors: Vec<ImportIssue>,
}

/// Result of applying a single-route sequence to an existing route
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceApplySummary {
    pub import_id: Uuid,
    pub route_id: Uuid,
    /// Entries read from the document
    pub found: u32,
    /// Route parcels that received a sequence number
    pub updated: u32,
}

/// Result of creating a route from a single-route sequence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteSequenceSummary {
    pub import_id: Uuid,
    pub day_id: Uuid,
    pub route_id: Uuid,
    pub driver_id: Uuid,
    pub found: u32,
    pub updated: u32,
    pub route_parcel_count: u32,
}
