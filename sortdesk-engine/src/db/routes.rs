//! Route rows

use sortdesk_common::db::Route;
use sortdesk_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{parse_guid, to_count};

const ROUTE_COLUMNS: &str = "guid, day_id, driver_id, parcel_count, sequencing_applied";

fn route_from_row(row: &SqliteRow) -> Result<Route> {
    let guid: String = row.try_get("guid")?;
    let day_id: String = row.try_get("day_id")?;
    let driver_id: String = row.try_get("driver_id")?;
    let parcel_count: i64 = row.try_get("parcel_count")?;

    Ok(Route {
        id: parse_guid(&guid)?,
        day_id: parse_guid(&day_id)?,
        driver_id: parse_guid(&driver_id)?,
        parcel_count: to_count(parcel_count),
        sequencing_applied: row.try_get("sequencing_applied")?,
    })
}

pub async fn find_route(pool: &SqlitePool, day_id: Uuid, driver_id: Uuid) -> Result<Option<Route>> {
    let row = sqlx::query(&format!(
        "SELECT {ROUTE_COLUMNS} FROM routes WHERE day_id = ? AND driver_id = ?"
    ))
    .bind(day_id.to_string())
    .bind(driver_id.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(route_from_row).transpose()
}

pub async fn find_route_by_id(pool: &SqlitePool, route_id: Uuid) -> Result<Option<Route>> {
    let row = sqlx::query(&format!("SELECT {ROUTE_COLUMNS} FROM routes WHERE guid = ?"))
        .bind(route_id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(route_from_row).transpose()
}

/// Insert the Route if absent (count 0, not sequenced), then return the live row
pub async fn create_route(pool: &SqlitePool, day_id: Uuid, driver_id: Uuid) -> Result<Route> {
    sqlx::query(
        r#"
        INSERT INTO routes (guid, day_id, driver_id, parcel_count, sequencing_applied)
        VALUES (?, ?, ?, 0, 0)
        ON CONFLICT(day_id, driver_id) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(day_id.to_string())
    .bind(driver_id.to_string())
    .execute(pool)
    .await?;

    find_route(pool, day_id, driver_id)
        .await?
        .ok_or_else(|| Error::Internal(format!("Route for driver {} missing after insert", driver_id)))
}

/// Parcels currently bound to the route
pub async fn count_route_parcels(pool: &SqlitePool, route_id: Uuid) -> Result<u32> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM parcels WHERE route_id = ?")
        .bind(route_id.to_string())
        .fetch_one(pool)
        .await?;

    Ok(to_count(count))
}

pub async fn update_route_count(pool: &SqlitePool, route_id: Uuid, count: u32) -> Result<()> {
    sqlx::query("UPDATE routes SET parcel_count = ? WHERE guid = ?")
        .bind(i64::from(count))
        .bind(route_id.to_string())
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn set_route_sequenced(pool: &SqlitePool, route_id: Uuid, sequenced: bool) -> Result<()> {
    sqlx::query("UPDATE routes SET sequencing_applied = ? WHERE guid = ?")
        .bind(sequenced)
        .bind(route_id.to_string())
        .execute(pool)
        .await?;

    Ok(())
}
