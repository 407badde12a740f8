//! Engine services
//!
//! Each service is generic over [`SortingStore`] and holds it behind an `Arc`,
//! so one store can be shared by the importer, the scanner and the sync
//! reconciler.

use chrono::NaiveDate;
use sortdesk_common::db::{Day, DayDefaults, Route};
use tracing::info;
use uuid::Uuid;

use crate::error::EngineResult;
use crate::store::SortingStore;

pub mod driver_matcher;
pub mod import_reconciler;
pub mod offline_sync;
pub mod route_export;
pub mod scan_machine;
pub mod sequencing;

pub use driver_matcher::match_driver;
pub use import_reconciler::{CarrierParser, ImportReconciler};
pub use offline_sync::OfflineSync;
pub use route_export::{export_route, route_sheet};
pub use scan_machine::ScanMachine;
pub use sequencing::SequencingService;

/// Find the Day for `date`, creating it (active, configured cutoff) if absent
pub(crate) async fn resolve_day<S: SortingStore + ?Sized>(
    store: &S,
    date: NaiveDate,
    defaults: &DayDefaults,
) -> EngineResult<Day> {
    if let Some(day) = store.find_day(date).await? {
        return Ok(day);
    }
    let day = store.create_day(date, defaults).await?;
    info!(date = %date, day_id = %day.id, "Created sorting day");
    Ok(day)
}

/// Find the driver's Route on the Day, creating it if absent
pub(crate) async fn resolve_route<S: SortingStore + ?Sized>(
    store: &S,
    day_id: Uuid,
    driver_id: Uuid,
) -> EngineResult<Route> {
    if let Some(route) = store.find_route(day_id, driver_id).await? {
        return Ok(route);
    }
    Ok(store.create_route(day_id, driver_id).await?)
}

/// Recompute the declared count from the parcels bound to the route
pub(crate) async fn refresh_route_count<S: SortingStore + ?Sized>(
    store: &S,
    route_id: Uuid,
) -> EngineResult<u32> {
    let count = store.count_route_parcels(route_id).await?;
    store.update_route_count(route_id, count).await?;
    Ok(count)
}
