//! Result types returned by the engine services

pub mod import_result;
pub mod scan_outcome;

pub use import_result::{
    DriverImportOutcome, ImportIssue, ImportSummary, IssueSeverity, ManifestImportSummary,
    RouteSequenceSummary, SequenceApplySummary,
};
pub use scan_outcome::{OfflineScan, RouteSummary, ScanOutcome, SyncSummary};
