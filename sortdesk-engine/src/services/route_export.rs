//! Route sheet export (`.xlsx`, one row per parcel in delivery order)

use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use sortdesk_common::db::Parcel;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::store::SortingStore;

pub const ROUTE_SHEET_NAME: &str = "Route";

const COLUMNS: [(&str, f64); 4] = [
    ("Tracking", 20.0),
    ("Address", 40.0),
    ("City", 20.0),
    ("Postal Code", 10.0),
];

fn write_headers(sheet: &mut Worksheet, format: &Format) -> Result<(), XlsxError> {
    for (col, (title, width)) in COLUMNS.iter().enumerate() {
        let col = col as u16;
        sheet.write_string_with_format(0, col, *title, format)?;
        sheet.set_column_width(col, *width)?;
    }
    Ok(())
}

fn build_workbook(parcels: &[Parcel]) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(ROUTE_SHEET_NAME)?;
    write_headers(sheet, &header_format)?;

    let mut row: u32 = 1;
    for parcel in parcels {
        sheet.write_string(row, 0, &parcel.tracking_code)?;
        sheet.write_string(row, 1, parcel.address.as_deref().unwrap_or(""))?;
        sheet.write_string(row, 2, parcel.city.as_deref().unwrap_or(""))?;
        sheet.write_string(row, 3, parcel.postal_code.as_deref().unwrap_or(""))?;
        row += 1;
    }

    workbook.save_to_buffer()
}

/// Workbook bytes for `parcels`, written in the order given
pub fn route_sheet(parcels: &[Parcel]) -> EngineResult<Vec<u8>> {
    build_workbook(parcels).map_err(|e| EngineError::Export(e.to_string()))
}

/// Route sheet for a stored route, parcels in delivery order
pub async fn export_route<S: SortingStore + ?Sized>(store: &S, route_id: Uuid) -> EngineResult<Vec<u8>> {
    let route = store
        .find_route_by_id(route_id)
        .await?
        .ok_or(EngineError::RouteNotFound(route_id))?;

    let parcels = store.list_route_parcels(route.id).await?;
    tracing::debug!(route_id = %route.id, parcels = parcels.len(), "Exporting route sheet");
    route_sheet(&parcels)
}
