//! SQL operations, one module per table
//!
//! Free functions over a `SqlitePool`; `store::SqliteStore` wraps them behind
//! the store traits. Identifiers are stored as TEXT guids, dates as
//! `YYYY-MM-DD`, timestamps as fixed-width RFC 3339.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use sortdesk_common::{Error, Result};
use uuid::Uuid;

pub mod days;
pub mod drivers;
pub mod imports;
pub mod parcels;
pub mod routes;
pub mod scans;

pub(crate) fn parse_guid(value: &str) -> Result<Uuid> {
    Uuid::parse_str(value).map_err(|e| Error::InvalidInput(format!("Invalid guid '{}': {}", value, e)))
}

pub(crate) fn parse_optional_guid(value: Option<String>) -> Result<Option<Uuid>> {
    value.as_deref().map(parse_guid).transpose()
}

pub(crate) fn date_text(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Fixed width so TEXT ordering matches time ordering
pub(crate) fn timestamp_text(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// SQLite INTEGER counters are never negative here
pub(crate) fn to_count(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}
