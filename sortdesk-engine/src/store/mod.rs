//! Store interfaces consumed by the engine
//!
//! One async trait per collaborator. Services are generic over
//! [`SortingStore`], which every type implementing all six traits gets for
//! free; [`SqliteStore`] is the production implementation.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sortdesk_common::db::{
    Day, DayDefaults, DayStatus, Driver, ImportRecord, NewImportRecord, NewParcel, Parcel,
    ParcelStatus, Route, Scan,
};
use sortdesk_common::Result;
use uuid::Uuid;

use crate::services::driver_matcher::match_driver;

pub mod sqlite;

pub use sqlite::SqliteStore;

/// Result of an insert-if-absent on (day, tracking code)
#[derive(Debug, Clone)]
pub enum InsertOutcome {
    Inserted(Parcel),
    /// Another row already holds the code for this Day
    AlreadyPresent(Parcel),
}

#[async_trait]
pub trait DayStore: Send + Sync {
    async fn find_day(&self, date: NaiveDate) -> Result<Option<Day>>;

    /// Create the Day (status active) if absent; returns the stored row either way
    async fn create_day(&self, date: NaiveDate, defaults: &DayDefaults) -> Result<Day>;

    async fn set_day_status(&self, day_id: Uuid, status: DayStatus) -> Result<()>;
}

#[async_trait]
pub trait RouteStore: Send + Sync {
    async fn find_route(&self, day_id: Uuid, driver_id: Uuid) -> Result<Option<Route>>;

    async fn find_route_by_id(&self, route_id: Uuid) -> Result<Option<Route>>;

    /// Create the Route (count 0, not sequenced) if absent
    async fn create_route(&self, day_id: Uuid, driver_id: Uuid) -> Result<Route>;

    async fn count_route_parcels(&self, route_id: Uuid) -> Result<u32>;

    async fn update_route_count(&self, route_id: Uuid, count: u32) -> Result<()>;

    async fn set_route_sequenced(&self, route_id: Uuid, sequenced: bool) -> Result<()>;
}

#[async_trait]
pub trait ParcelStore: Send + Sync {
    /// Case-insensitive lookup within one Day; a known parcel wins over an unknown row
    async fn find_parcel_by_code(&self, day_id: Uuid, code: &str) -> Result<Option<Parcel>>;

    async fn insert_parcel(&self, fields: &NewParcel) -> Result<InsertOutcome>;

    async fn update_parcel_status(&self, parcel_id: Uuid, status: ParcelStatus) -> Result<()>;

    async fn update_parcel_order(&self, parcel_id: Uuid, order: u32, route_id: Option<Uuid>) -> Result<()>;

    async fn list_route_parcels(&self, route_id: Uuid) -> Result<Vec<Parcel>>;
}

#[async_trait]
pub trait ScanStore: Send + Sync {
    async fn find_scan_by_parcel(&self, parcel_id: Uuid) -> Result<Option<Scan>>;

    async fn upsert_scan(
        &self,
        parcel_id: Uuid,
        operator_id: Uuid,
        scanned_at: DateTime<Utc>,
        offline: bool,
    ) -> Result<Scan>;

    /// First-scan write; `false` when a live scan already exists
    async fn insert_scan_if_absent(
        &self,
        parcel_id: Uuid,
        operator_id: Uuid,
        scanned_at: DateTime<Utc>,
        offline: bool,
    ) -> Result<bool>;
}

#[async_trait]
pub trait DriverDirectory: Send + Sync {
    async fn find_driver(&self, driver_id: Uuid) -> Result<Option<Driver>>;

    /// Active drivers, optionally restricted to one subcontractor
    async fn list_active_drivers(&self, scope: Option<Uuid>) -> Result<Vec<Driver>>;

    /// Tolerant name lookup (see [`match_driver`])
    async fn find_driver_by_name(&self, name: &str, scope: Option<Uuid>) -> Result<Option<Driver>> {
        let candidates = self.list_active_drivers(scope).await?;
        Ok(match_driver(&candidates, name).cloned())
    }
}

#[async_trait]
pub trait ImportLog: Send + Sync {
    async fn record_import(&self, record: &NewImportRecord) -> Result<ImportRecord>;

    /// Import records of a Day, newest first
    async fn list_imports(&self, date: NaiveDate) -> Result<Vec<ImportRecord>>;
}

/// Every collaborator the engine needs
pub trait SortingStore: DayStore + RouteStore + ParcelStore + ScanStore + DriverDirectory + ImportLog {}

impl<T> SortingStore for T where T: DayStore + RouteStore + ParcelStore + ScanStore + DriverDirectory + ImportLog {}
