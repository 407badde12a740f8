//! Parcel rows
//!
//! Tracking codes are stored uppercase in a NOCASE column, so equality in
//! WHERE clauses is case-insensitive. Two partial unique indexes allow one
//! known row and one unknown row per code per Day.

use sortdesk_common::db::{NewParcel, Parcel, ParcelStatus};
use sortdesk_common::time::now;
use sortdesk_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{parse_guid, parse_optional_guid, timestamp_text, to_count};
use crate::store::InsertOutcome;

const PARCEL_COLUMNS: &str = "guid, day_id, route_id, tracking_code, address, city, postal_code, region, source, status, sequence_number";

fn parcel_from_row(row: &SqliteRow) -> Result<Parcel> {
    let guid: String = row.try_get("guid")?;
    let day_id: String = row.try_get("day_id")?;
    let source: String = row.try_get("source")?;
    let status: String = row.try_get("status")?;
    let sequence_number: Option<i64> = row.try_get("sequence_number")?;

    Ok(Parcel {
        id: parse_guid(&guid)?,
        day_id: parse_guid(&day_id)?,
        route_id: parse_optional_guid(row.try_get("route_id")?)?,
        tracking_code: row.try_get("tracking_code")?,
        address: row.try_get("address")?,
        city: row.try_get("city")?,
        postal_code: row.try_get("postal_code")?,
        region: row.try_get("region")?,
        source: source.parse()?,
        status: status.parse()?,
        sequence_number: sequence_number.map(to_count),
    })
}

/// Parcel with this code on the Day; a known row is preferred over an unknown one
pub async fn find_parcel_by_code(pool: &SqlitePool, day_id: Uuid, code: &str) -> Result<Option<Parcel>> {
    let row = sqlx::query(&format!(
        r#"
        SELECT {PARCEL_COLUMNS} FROM parcels
        WHERE day_id = ? AND tracking_code = ?
        ORDER BY CASE WHEN status = 'unknown' THEN 1 ELSE 0 END
        LIMIT 1
        "#
    ))
    .bind(day_id.to_string())
    .bind(code.trim())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(parcel_from_row).transpose()
}

/// Row occupying the same unique slot as a parcel with `status`
async fn find_conflicting(pool: &SqlitePool, day_id: Uuid, code: &str, status: ParcelStatus) -> Result<Option<Parcel>> {
    let unknown = status == ParcelStatus::Unknown;
    let row = sqlx::query(&format!(
        r#"
        SELECT {PARCEL_COLUMNS} FROM parcels
        WHERE day_id = ? AND tracking_code = ? AND (status = 'unknown') = ?
        LIMIT 1
        "#
    ))
    .bind(day_id.to_string())
    .bind(code)
    .bind(unknown)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(parcel_from_row).transpose()
}

pub async fn find_parcel(pool: &SqlitePool, parcel_id: Uuid) -> Result<Option<Parcel>> {
    let row = sqlx::query(&format!("SELECT {PARCEL_COLUMNS} FROM parcels WHERE guid = ?"))
        .bind(parcel_id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(parcel_from_row).transpose()
}

/// Insert-if-absent on (day, tracking code)
///
/// A unique-index conflict is not an error: the row already holding the slot
/// is returned as [`InsertOutcome::AlreadyPresent`].
pub async fn insert_parcel(pool: &SqlitePool, fields: &NewParcel) -> Result<InsertOutcome> {
    let id = Uuid::new_v4();
    let tracking_code = fields.tracking_code.trim().to_uppercase();

    let result = sqlx::query(
        r#"
        INSERT INTO parcels (
            guid, day_id, route_id, tracking_code, address, city, postal_code, region,
            source, status, sequence_number, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(fields.day_id.to_string())
    .bind(fields.route_id.map(|r| r.to_string()))
    .bind(&tracking_code)
    .bind(&fields.address)
    .bind(&fields.city)
    .bind(&fields.postal_code)
    .bind(&fields.region)
    .bind(fields.source.as_str())
    .bind(fields.status.as_str())
    .bind(fields.sequence_number.map(i64::from))
    .bind(timestamp_text(now()))
    .execute(pool)
    .await
    .map_err(Error::from);

    match result {
        Ok(_) => Ok(InsertOutcome::Inserted(Parcel {
            id,
            day_id: fields.day_id,
            route_id: fields.route_id,
            tracking_code,
            address: fields.address.clone(),
            city: fields.city.clone(),
            postal_code: fields.postal_code.clone(),
            region: fields.region.clone(),
            source: fields.source,
            status: fields.status,
            sequence_number: fields.sequence_number,
        })),
        Err(err) if err.is_unique_violation() => {
            let existing = find_conflicting(pool, fields.day_id, &tracking_code, fields.status)
                .await?
                .ok_or_else(|| Error::Internal(format!("Conflicting parcel {} vanished", tracking_code)))?;
            Ok(InsertOutcome::AlreadyPresent(existing))
        }
        Err(err) => Err(err),
    }
}

pub async fn update_parcel_status(pool: &SqlitePool, parcel_id: Uuid, status: ParcelStatus) -> Result<()> {
    sqlx::query("UPDATE parcels SET status = ? WHERE guid = ?")
        .bind(status.as_str())
        .bind(parcel_id.to_string())
        .execute(pool)
        .await?;

    Ok(())
}

/// Set the delivery sequence number, rebinding the route when one is given
pub async fn update_parcel_order(
    pool: &SqlitePool,
    parcel_id: Uuid,
    order: u32,
    route_id: Option<Uuid>,
) -> Result<()> {
    sqlx::query("UPDATE parcels SET sequence_number = ?, route_id = COALESCE(?, route_id) WHERE guid = ?")
        .bind(i64::from(order))
        .bind(route_id.map(|r| r.to_string()))
        .bind(parcel_id.to_string())
        .execute(pool)
        .await?;

    Ok(())
}

/// Parcels of a route in delivery order; unsequenced parcels last, in import order
pub async fn list_route_parcels(pool: &SqlitePool, route_id: Uuid) -> Result<Vec<Parcel>> {
    let rows = sqlx::query(&format!(
        r#"
        SELECT {PARCEL_COLUMNS} FROM parcels
        WHERE route_id = ?
        ORDER BY sequence_number IS NULL, sequence_number, created_at, rowid
        "#
    ))
    .bind(route_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(parcel_from_row).collect()
}
