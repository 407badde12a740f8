//! Scan rows; UNIQUE(parcel_id) keeps one live scan per parcel

use chrono::{DateTime, Utc};
use sortdesk_common::db::Scan;
use sortdesk_common::time::parse_timestamp;
use sortdesk_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{parse_guid, timestamp_text};

fn scan_from_row(row: &SqliteRow) -> Result<Scan> {
    let guid: String = row.try_get("guid")?;
    let parcel_id: String = row.try_get("parcel_id")?;
    let operator_id: String = row.try_get("operator_id")?;
    let scanned_at: String = row.try_get("scanned_at")?;

    Ok(Scan {
        id: parse_guid(&guid)?,
        parcel_id: parse_guid(&parcel_id)?,
        operator_id: parse_guid(&operator_id)?,
        scanned_at: parse_timestamp(&scanned_at)?,
        offline: row.try_get("offline")?,
    })
}

pub async fn find_scan_by_parcel(pool: &SqlitePool, parcel_id: Uuid) -> Result<Option<Scan>> {
    let row = sqlx::query("SELECT guid, parcel_id, operator_id, scanned_at, offline FROM scans WHERE parcel_id = ?")
        .bind(parcel_id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(scan_from_row).transpose()
}

/// Write the live scan, overwriting operator, time and offline flag if one exists
pub async fn upsert_scan(
    pool: &SqlitePool,
    parcel_id: Uuid,
    operator_id: Uuid,
    scanned_at: DateTime<Utc>,
    offline: bool,
) -> Result<Scan> {
    sqlx::query(
        r#"
        INSERT INTO scans (guid, parcel_id, operator_id, scanned_at, offline)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(parcel_id) DO UPDATE SET
            operator_id = excluded.operator_id,
            scanned_at = excluded.scanned_at,
            offline = excluded.offline
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(parcel_id.to_string())
    .bind(operator_id.to_string())
    .bind(timestamp_text(scanned_at))
    .bind(offline)
    .execute(pool)
    .await?;

    find_scan_by_parcel(pool, parcel_id)
        .await?
        .ok_or_else(|| Error::Internal(format!("Scan for parcel {} missing after upsert", parcel_id)))
}

/// Create the first scan; `false` when the parcel already has one
pub async fn insert_scan_if_absent(
    pool: &SqlitePool,
    parcel_id: Uuid,
    operator_id: Uuid,
    scanned_at: DateTime<Utc>,
    offline: bool,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO scans (guid, parcel_id, operator_id, scanned_at, offline)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(parcel_id) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(parcel_id.to_string())
    .bind(operator_id.to_string())
    .bind(timestamp_text(scanned_at))
    .bind(offline)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}
