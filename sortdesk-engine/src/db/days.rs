//! Day rows

use chrono::NaiveDate;
use sortdesk_common::db::{Day, DayDefaults, DayStatus};
use sortdesk_common::time::{now, parse_cutoff, parse_day_date, parse_timestamp};
use sortdesk_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{date_text, parse_guid, timestamp_text};

const DAY_COLUMNS: &str = "guid, date, status, cutoff, cutoff_enforced, created_at";

fn day_from_row(row: &SqliteRow) -> Result<Day> {
    let guid: String = row.try_get("guid")?;
    let date: String = row.try_get("date")?;
    let status: String = row.try_get("status")?;
    let cutoff: Option<String> = row.try_get("cutoff")?;
    let created_at: String = row.try_get("created_at")?;

    Ok(Day {
        id: parse_guid(&guid)?,
        date: parse_day_date(&date)?,
        status: status.parse()?,
        cutoff: cutoff.as_deref().map(parse_cutoff).transpose()?,
        cutoff_enforced: row.try_get("cutoff_enforced")?,
        created_at: parse_timestamp(&created_at)?,
    })
}

pub async fn find_day(pool: &SqlitePool, date: NaiveDate) -> Result<Option<Day>> {
    let row = sqlx::query(&format!("SELECT {DAY_COLUMNS} FROM days WHERE date = ?"))
        .bind(date_text(date))
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(day_from_row).transpose()
}

/// Insert the Day if absent, then return whichever row owns the date
///
/// Concurrent creators converge on one row through the UNIQUE(date) constraint.
pub async fn create_day(pool: &SqlitePool, date: NaiveDate, defaults: &DayDefaults) -> Result<Day> {
    sqlx::query(
        r#"
        INSERT INTO days (guid, date, status, cutoff, cutoff_enforced, created_at)
        VALUES (?, ?, 'active', ?, ?, ?)
        ON CONFLICT(date) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(date_text(date))
    .bind(defaults.cutoff.map(|t| t.format("%H:%M").to_string()))
    .bind(defaults.cutoff_enforced)
    .bind(timestamp_text(now()))
    .execute(pool)
    .await?;

    find_day(pool, date)
        .await?
        .ok_or_else(|| Error::Internal(format!("Day {} missing after insert", date)))
}

pub async fn set_day_status(pool: &SqlitePool, day_id: Uuid, status: DayStatus) -> Result<()> {
    let result = sqlx::query("UPDATE days SET status = ? WHERE guid = ?")
        .bind(status.as_str())
        .bind(day_id.to_string())
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Day {}", day_id)));
    }
    Ok(())
}
