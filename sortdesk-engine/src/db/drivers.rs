//! Driver directory rows (read by the engine, written by the directory owner)

use sortdesk_common::db::Driver;
use sortdesk_common::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{parse_guid, parse_optional_guid};

fn driver_from_row(row: &SqliteRow) -> Result<Driver> {
    let guid: String = row.try_get("guid")?;
    Ok(Driver {
        id: parse_guid(&guid)?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        subcontractor_id: parse_optional_guid(row.try_get("subcontractor_id")?)?,
        active: row.try_get("active")?,
    })
}

pub async fn find_driver(pool: &SqlitePool, driver_id: Uuid) -> Result<Option<Driver>> {
    let row = sqlx::query(
        "SELECT guid, first_name, last_name, subcontractor_id, active FROM drivers WHERE guid = ?",
    )
    .bind(driver_id.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(driver_from_row).transpose()
}

/// Active drivers, optionally restricted to one subcontractor
pub async fn list_active_drivers(pool: &SqlitePool, scope: Option<Uuid>) -> Result<Vec<Driver>> {
    let rows = sqlx::query(
        r#"
        SELECT guid, first_name, last_name, subcontractor_id, active
        FROM drivers
        WHERE active = 1 AND (? IS NULL OR subcontractor_id = ?)
        ORDER BY last_name, first_name
        "#,
    )
    .bind(scope.map(|id| id.to_string()))
    .bind(scope.map(|id| id.to_string()))
    .fetch_all(pool)
    .await?;

    rows.iter().map(driver_from_row).collect()
}

/// Insert or update a directory entry
pub async fn save_driver(pool: &SqlitePool, driver: &Driver) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO drivers (guid, first_name, last_name, subcontractor_id, active)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(guid) DO UPDATE SET
            first_name = excluded.first_name,
            last_name = excluded.last_name,
            subcontractor_id = excluded.subcontractor_id,
            active = excluded.active
        "#,
    )
    .bind(driver.id.to_string())
    .bind(&driver.first_name)
    .bind(&driver.last_name)
    .bind(driver.subcontractor_id.map(|id| id.to_string()))
    .bind(driver.active)
    .execute(pool)
    .await?;

    Ok(())
}
