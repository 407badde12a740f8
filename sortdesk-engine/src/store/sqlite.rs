//! SQLite-backed store
//!
//! Reads go straight to the pool; writes go through [`retry_on_lock`] so a
//! scanner writing during a large import waits instead of failing.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sortdesk_common::db::{
    Day, DayDefaults, DayStatus, Driver, ImportRecord, NewImportRecord, NewParcel, Parcel,
    ParcelStatus, Route, Scan,
};
use sortdesk_common::Result;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{DayStore, DriverDirectory, ImportLog, InsertOutcome, ParcelStore, RouteStore, ScanStore};
use crate::db;
use crate::utils::retry_on_lock;

/// Default lock wait, matching `[store] max_lock_wait_ms`
pub const DEFAULT_MAX_LOCK_WAIT_MS: u64 = 5000;

#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    max_lock_wait_ms: u64,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            max_lock_wait_ms: DEFAULT_MAX_LOCK_WAIT_MS,
        }
    }

    pub fn with_max_lock_wait(mut self, max_lock_wait_ms: u64) -> Self {
        self.max_lock_wait_ms = max_lock_wait_ms;
        self
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Parcel by id (display and export paths)
    pub async fn find_parcel(&self, parcel_id: Uuid) -> Result<Option<Parcel>> {
        db::parcels::find_parcel(&self.pool, parcel_id).await
    }
}

#[async_trait]
impl DayStore for SqliteStore {
    async fn find_day(&self, date: NaiveDate) -> Result<Option<Day>> {
        db::days::find_day(&self.pool, date).await
    }

    async fn create_day(&self, date: NaiveDate, defaults: &DayDefaults) -> Result<Day> {
        retry_on_lock("create day", self.max_lock_wait_ms, || {
            db::days::create_day(&self.pool, date, defaults)
        })
        .await
    }

    async fn set_day_status(&self, day_id: Uuid, status: DayStatus) -> Result<()> {
        retry_on_lock("set day status", self.max_lock_wait_ms, || {
            db::days::set_day_status(&self.pool, day_id, status)
        })
        .await
    }
}

#[async_trait]
impl RouteStore for SqliteStore {
    async fn find_route(&self, day_id: Uuid, driver_id: Uuid) -> Result<Option<Route>> {
        db::routes::find_route(&self.pool, day_id, driver_id).await
    }

    async fn find_route_by_id(&self, route_id: Uuid) -> Result<Option<Route>> {
        db::routes::find_route_by_id(&self.pool, route_id).await
    }

    async fn create_route(&self, day_id: Uuid, driver_id: Uuid) -> Result<Route> {
        retry_on_lock("create route", self.max_lock_wait_ms, || {
            db::routes::create_route(&self.pool, day_id, driver_id)
        })
        .await
    }

    async fn count_route_parcels(&self, route_id: Uuid) -> Result<u32> {
        db::routes::count_route_parcels(&self.pool, route_id).await
    }

    async fn update_route_count(&self, route_id: Uuid, count: u32) -> Result<()> {
        retry_on_lock("update route count", self.max_lock_wait_ms, || {
            db::routes::update_route_count(&self.pool, route_id, count)
        })
        .await
    }

    async fn set_route_sequenced(&self, route_id: Uuid, sequenced: bool) -> Result<()> {
        retry_on_lock("set route sequenced", self.max_lock_wait_ms, || {
            db::routes::set_route_sequenced(&self.pool, route_id, sequenced)
        })
        .await
    }
}

#[async_trait]
impl ParcelStore for SqliteStore {
    async fn find_parcel_by_code(&self, day_id: Uuid, code: &str) -> Result<Option<Parcel>> {
        db::parcels::find_parcel_by_code(&self.pool, day_id, code).await
    }

    async fn insert_parcel(&self, fields: &NewParcel) -> Result<InsertOutcome> {
        retry_on_lock("insert parcel", self.max_lock_wait_ms, || {
            db::parcels::insert_parcel(&self.pool, fields)
        })
        .await
    }

    async fn update_parcel_status(&self, parcel_id: Uuid, status: ParcelStatus) -> Result<()> {
        retry_on_lock("update parcel status", self.max_lock_wait_ms, || {
            db::parcels::update_parcel_status(&self.pool, parcel_id, status)
        })
        .await
    }

    async fn update_parcel_order(&self, parcel_id: Uuid, order: u32, route_id: Option<Uuid>) -> Result<()> {
        retry_on_lock("update parcel order", self.max_lock_wait_ms, || {
            db::parcels::update_parcel_order(&self.pool, parcel_id, order, route_id)
        })
        .await
    }

    async fn list_route_parcels(&self, route_id: Uuid) -> Result<Vec<Parcel>> {
        db::parcels::list_route_parcels(&self.pool, route_id).await
    }
}

#[async_trait]
impl ScanStore for SqliteStore {
    async fn find_scan_by_parcel(&self, parcel_id: Uuid) -> Result<Option<Scan>> {
        db::scans::find_scan_by_parcel(&self.pool, parcel_id).await
    }

    async fn upsert_scan(
        &self,
        parcel_id: Uuid,
        operator_id: Uuid,
        scanned_at: DateTime<Utc>,
        offline: bool,
    ) -> Result<Scan> {
        retry_on_lock("upsert scan", self.max_lock_wait_ms, || {
            db::scans::upsert_scan(&self.pool, parcel_id, operator_id, scanned_at, offline)
        })
        .await
    }

    async fn insert_scan_if_absent(
        &self,
        parcel_id: Uuid,
        operator_id: Uuid,
        scanned_at: DateTime<Utc>,
        offline: bool,
    ) -> Result<bool> {
        retry_on_lock("insert scan", self.max_lock_wait_ms, || {
            db::scans::insert_scan_if_absent(&self.pool, parcel_id, operator_id, scanned_at, offline)
        })
        .await
    }
}

#[async_trait]
impl DriverDirectory for SqliteStore {
    async fn find_driver(&self, driver_id: Uuid) -> Result<Option<Driver>> {
        db::drivers::find_driver(&self.pool, driver_id).await
    }

    async fn list_active_drivers(&self, scope: Option<Uuid>) -> Result<Vec<Driver>> {
        db::drivers::list_active_drivers(&self.pool, scope).await
    }
}

#[async_trait]
impl ImportLog for SqliteStore {
    async fn record_import(&self, record: &NewImportRecord) -> Result<ImportRecord> {
        retry_on_lock("record import", self.max_lock_wait_ms, || {
            db::imports::record_import(&self.pool, record)
        })
        .await
    }

    async fn list_imports(&self, date: NaiveDate) -> Result<Vec<ImportRecord>> {
        db::imports::list_imports(&self.pool, date).await
    }
}
