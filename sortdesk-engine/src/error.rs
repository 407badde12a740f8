//! Error types for sortdesk-engine
//!
//! Structural failures are raised; per-record anomalies (duplicate tracking,
//! unmatched driver in a multi-driver document) go into summaries instead.

use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use crate::parsers::ParseError;

/// Engine error type
#[derive(Debug, Error)]
pub enum EngineError {
    /// Document structurally unrecognizable; aborts this import call only
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Document produced zero records (distinct from "nothing new")
    #[error("File empty or unrecognized format")]
    EmptyDocument,

    /// Named driver absent from the directory
    #[error("Driver \"{0}\" not found. Check the file name.")]
    DriverNotFound(String),

    /// Scan attempted with no active day for the date
    #[error("No active sorting day for {0}")]
    NoActiveDay(NaiveDate),

    #[error("Route not found: {0}")]
    RouteNotFound(Uuid),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Export failed: {0}")]
    Export(String),

    /// Store error
    #[error(transparent)]
    Store(#[from] sortdesk_common::Error),
}

impl EngineError {
    /// Stable code for callers rendering results
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Parse(_) => "PARSE_ERROR",
            EngineError::EmptyDocument => "EMPTY_DOCUMENT",
            EngineError::DriverNotFound(_) => "DRIVER_NOT_FOUND",
            EngineError::NoActiveDay(_) => "NO_ACTIVE_DAY",
            EngineError::RouteNotFound(_) => "ROUTE_NOT_FOUND",
            EngineError::InvalidInput(_) => "INVALID_INPUT",
            EngineError::Export(_) => "EXPORT_ERROR",
            EngineError::Store(_) => "STORE_ERROR",
        }
    }
}

impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        EngineError::Store(sortdesk_common::Error::Database(err))
    }
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
