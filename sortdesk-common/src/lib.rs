//! # Sortdesk Common Library
//!
//! Shared code for the sorting engine and its tooling:
//! - Persisted data model (days, routes, parcels, scans, drivers, import records)
//! - SQLite schema initialization
//! - Configuration loading and root folder resolution
//! - Error type and time helpers

pub mod config;
pub mod db;
pub mod error;
pub mod time;

pub use error::{Error, Result};
