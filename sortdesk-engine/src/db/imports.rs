//! Import audit rows (append-only)

use chrono::NaiveDate;
use sortdesk_common::db::{ImportRecord, NewImportRecord};
use sortdesk_common::time::{now, parse_timestamp};
use sortdesk_common::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{date_text, parse_guid, parse_optional_guid, timestamp_text, to_count};

fn import_from_row(row: &SqliteRow) -> Result<ImportRecord> {
    let guid: String = row.try_get("guid")?;
    let day_id: String = row.try_get("day_id")?;
    let format: String = row.try_get("format")?;
    let created_at: String = row.try_get("created_at")?;

    Ok(ImportRecord {
        id: parse_guid(&guid)?,
        day_id: parse_guid(&day_id)?,
        route_id: parse_optional_guid(row.try_get("route_id")?)?,
        driver_id: parse_optional_guid(row.try_get("driver_id")?)?,
        file_name: row.try_get("file_name")?,
        format: format.parse()?,
        added_count: to_count(row.try_get("added_count")?),
        skipped_count: to_count(row.try_get("skipped_count")?),
        created_at: parse_timestamp(&created_at)?,
    })
}

pub async fn record_import(pool: &SqlitePool, record: &NewImportRecord) -> Result<ImportRecord> {
    let stored = ImportRecord {
        id: Uuid::new_v4(),
        day_id: record.day_id,
        route_id: record.route_id,
        driver_id: record.driver_id,
        file_name: record.file_name.clone(),
        format: record.format,
        added_count: record.added_count,
        skipped_count: record.skipped_count,
        created_at: now(),
    };

    sqlx::query(
        r#"
        INSERT INTO imports (
            guid, day_id, route_id, driver_id, file_name, format,
            added_count, skipped_count, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(stored.id.to_string())
    .bind(stored.day_id.to_string())
    .bind(stored.route_id.map(|id| id.to_string()))
    .bind(stored.driver_id.map(|id| id.to_string()))
    .bind(&stored.file_name)
    .bind(stored.format.as_str())
    .bind(i64::from(stored.added_count))
    .bind(i64::from(stored.skipped_count))
    .bind(timestamp_text(stored.created_at))
    .execute(pool)
    .await?;

    Ok(stored)
}

/// Import records of the Day for `date`, newest first
pub async fn list_imports(pool: &SqlitePool, date: NaiveDate) -> Result<Vec<ImportRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT i.guid, i.day_id, i.route_id, i.driver_id, i.file_name, i.format,
               i.added_count, i.skipped_count, i.created_at
        FROM imports i
        JOIN days d ON d.guid = i.day_id
        WHERE d.date = ?
        ORDER BY i.created_at DESC, i.rowid DESC
        "#,
    )
    .bind(date_text(date))
    .fetch_all(pool)
    .await?;

    rows.iter().map(import_from_row).collect()
}
