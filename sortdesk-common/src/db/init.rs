//! Database initialization
//!
//! Creates the database file on first run and applies the schema idempotently
//! (`CREATE ... IF NOT EXISTS`), so opening an existing database is always safe.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Open (or create) the database and apply the schema
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // WAL lets scanners read while an import is writing
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;

    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    init_schema(&pool).await?;

    Ok(pool)
}

/// Apply every table and index; safe to call repeatedly
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(pool)
        .await?;

    create_days_table(pool).await?;
    create_drivers_table(pool).await?;
    create_routes_table(pool).await?;
    create_parcels_table(pool).await?;
    create_scans_table(pool).await?;
    create_imports_table(pool).await?;

    Ok(())
}

pub async fn create_days_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS days (
            guid TEXT PRIMARY KEY,
            date TEXT NOT NULL UNIQUE,
            status TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'closed')),
            cutoff TEXT,
            cutoff_enforced INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Driver directory; written by the directory owner, read by the engine
pub async fn create_drivers_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS drivers (
            guid TEXT PRIMARY KEY,
            first_name TEXT,
            last_name TEXT NOT NULL,
            subcontractor_id TEXT,
            active INTEGER NOT NULL DEFAULT 1
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_routes_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS routes (
            guid TEXT PRIMARY KEY,
            day_id TEXT NOT NULL REFERENCES days(guid),
            driver_id TEXT NOT NULL,
            parcel_count INTEGER NOT NULL DEFAULT 0,
            sequencing_applied INTEGER NOT NULL DEFAULT 0,
            UNIQUE (day_id, driver_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Parcels plus the two partial unique indexes that back insert-if-absent:
/// one live non-unknown row and one unknown row per tracking code per day.
pub async fn create_parcels_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS parcels (
            guid TEXT PRIMARY KEY,
            day_id TEXT NOT NULL REFERENCES days(guid),
            route_id TEXT REFERENCES routes(guid),
            tracking_code TEXT NOT NULL COLLATE NOCASE,
            address TEXT,
            city TEXT,
            postal_code TEXT,
            region TEXT,
            source TEXT NOT NULL,
            status TEXT NOT NULL CHECK (status IN ('unsorted', 'sorted', 'unknown')),
            sequence_number INTEGER,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_parcels_day_tracking_known
        ON parcels (day_id, tracking_code)
        WHERE status <> 'unknown'
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_parcels_day_tracking_unknown
        ON parcels (day_id, tracking_code)
        WHERE status = 'unknown'
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_parcels_route ON parcels (route_id)")
        .execute(pool)
        .await?;

    Ok(())
}

/// At most one live scan per parcel (UNIQUE parcel_id, overwritten on rescan)
pub async fn create_scans_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS scans (
            guid TEXT PRIMARY KEY,
            parcel_id TEXT NOT NULL UNIQUE REFERENCES parcels(guid),
            operator_id TEXT NOT NULL,
            scanned_at TEXT NOT NULL,
            offline INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_imports_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS imports (
            guid TEXT PRIMARY KEY,
            day_id TEXT NOT NULL REFERENCES days(guid),
            route_id TEXT,
            driver_id TEXT,
            file_name TEXT NOT NULL,
            format TEXT NOT NULL,
            added_count INTEGER NOT NULL DEFAULT 0,
            skipped_count INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
