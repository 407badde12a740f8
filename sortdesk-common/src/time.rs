//! Timestamp and calendar-date utilities

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};

use crate::{Error, Result};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Current sorting date (UTC calendar date)
pub fn today() -> NaiveDate {
    now().date_naive()
}

/// Date imports target by default: carrier files arrive the day before sorting
pub fn tomorrow() -> NaiveDate {
    today()
        .checked_add_days(Days::new(1))
        .unwrap_or_else(today)
}

/// Parse a `YYYY-MM-DD` day date
pub fn parse_day_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| Error::InvalidInput(format!("Invalid date '{}': {}", s, e)))
}

/// Parse an `HH:MM` (or `HH:MM:SS`) cutoff time
pub fn parse_cutoff(s: &str) -> Result<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|e| Error::InvalidInput(format!("Invalid cutoff time '{}': {}", s, e)))
}

/// Parse an RFC 3339 timestamp stored as TEXT
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::InvalidInput(format!("Invalid timestamp '{}': {}", s, e)))
}
