//! Scan state machine
//!
//! ```text
//! absent ──scan──▶ unknown (terminal, no route)
//! unsorted ──first scan──▶ sorted (terminal)
//! sorted ──scan──▶ sorted, live scan overwritten, reported as duplicate
//! ```
//!
//! A parcel has at most one live scan. The duplicate report carries the
//! operator and time of the scan being replaced, read before the overwrite.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use sortdesk_common::db::{Day, NewParcel, Parcel, ParcelStatus};
use sortdesk_common::time::now;
use sortdesk_common::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{RouteSummary, ScanOutcome};
use crate::parsers::normalize_tracking;
use crate::store::SortingStore;

/// Live scans write through; offline replays never materialize unknown
/// parcels and never replace an existing live scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanMode {
    Live,
    Replay,
}

pub struct ScanMachine<S> {
    store: Arc<S>,
}

impl<S> Clone for ScanMachine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: SortingStore> ScanMachine<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Active Day for `date`; scanning before any import is impossible
    pub async fn active_day(&self, date: NaiveDate) -> EngineResult<Day> {
        self.store
            .find_day(date)
            .await?
            .filter(Day::is_active)
            .ok_or(EngineError::NoActiveDay(date))
    }

    /// Record a scanner read at the current time
    pub async fn record_scan(
        &self,
        day_date: NaiveDate,
        tracking_code: &str,
        operator_id: Uuid,
        offline: bool,
    ) -> EngineResult<ScanOutcome> {
        let code = normalize_tracking(tracking_code);
        if code.is_empty() {
            return Err(EngineError::InvalidInput("empty tracking code".to_string()));
        }

        let day = self.active_day(day_date).await?;
        self.classify(&day, &code, operator_id, now(), offline, ScanMode::Live)
            .await
    }

    /// Replay one offline-collected scan at its client-side time
    pub async fn replay_offline_scan(
        &self,
        day: &Day,
        tracking_code: &str,
        operator_id: Uuid,
        scanned_at: DateTime<Utc>,
    ) -> EngineResult<ScanOutcome> {
        let code = normalize_tracking(tracking_code);
        if code.is_empty() {
            return Ok(ScanOutcome::Unknown { tracking_code: code });
        }
        self.classify(day, &code, operator_id, scanned_at, true, ScanMode::Replay)
            .await
    }

    async fn classify(
        &self,
        day: &Day,
        code: &str,
        operator_id: Uuid,
        scanned_at: DateTime<Utc>,
        offline: bool,
        mode: ScanMode,
    ) -> EngineResult<ScanOutcome> {
        let store = self.store.as_ref();

        let parcel = match store.find_parcel_by_code(day.id, code).await? {
            Some(parcel) if parcel.status != ParcelStatus::Unknown => parcel,
            Some(_) => {
                debug!(tracking = code, "Scan of a code already recorded as unknown");
                return Ok(ScanOutcome::Unknown {
                    tracking_code: code.to_string(),
                });
            }
            None => {
                if mode == ScanMode::Live {
                    store
                        .insert_parcel(&NewParcel::unknown(day.id, code.to_string()))
                        .await?;
                }
                warn!(tracking = code, operator = %operator_id, offline, "Unknown parcel scanned");
                return Ok(ScanOutcome::Unknown {
                    tracking_code: code.to_string(),
                });
            }
        };

        let previous = match store.find_scan_by_parcel(parcel.id).await? {
            Some(previous) => Some(previous),
            None => {
                if store
                    .insert_scan_if_absent(parcel.id, operator_id, scanned_at, offline)
                    .await?
                {
                    store.update_parcel_status(parcel.id, ParcelStatus::Sorted).await?;
                    let parcel = Parcel {
                        status: ParcelStatus::Sorted,
                        ..parcel
                    };
                    info!(tracking = code, operator = %operator_id, offline, "Parcel sorted");
                    let route = self.route_summary(&parcel, mode).await?;
                    return Ok(ScanOutcome::Success { parcel, route });
                }
                // another scanner won the first-scan race
                store.find_scan_by_parcel(parcel.id).await?
            }
        };

        let previous = previous.ok_or_else(|| {
            Error::Internal(format!("Scan of parcel {} vanished during classification", parcel.id))
        })?;

        if mode == ScanMode::Live {
            store
                .upsert_scan(parcel.id, operator_id, scanned_at, offline)
                .await?;
        }

        // a live scan implies sorted, even if the first scan's status write failed
        let parcel = if parcel.status == ParcelStatus::Sorted {
            parcel
        } else {
            warn!(tracking = code, status = parcel.status.as_str(), "Scanned parcel not sorted, repairing status");
            store.update_parcel_status(parcel.id, ParcelStatus::Sorted).await?;
            Parcel {
                status: ParcelStatus::Sorted,
                ..parcel
            }
        };

        info!(
            tracking = code,
            operator = %operator_id,
            first_operator = %previous.operator_id,
            first_scanned_at = %previous.scanned_at,
            "Duplicate scan"
        );

        let route = self.route_summary(&parcel, mode).await?;
        Ok(ScanOutcome::Duplicate {
            parcel,
            route,
            first_operator_id: previous.operator_id,
            first_scanned_at: previous.scanned_at,
        })
    }

    /// Route and driver context for display; skipped for offline replays
    async fn route_summary(&self, parcel: &Parcel, mode: ScanMode) -> EngineResult<Option<RouteSummary>> {
        let Some(route_id) = parcel.route_id else {
            return Ok(None);
        };
        if mode == ScanMode::Replay {
            return Ok(None);
        }

        let store = self.store.as_ref();
        let Some(route) = store.find_route_by_id(route_id).await? else {
            return Ok(None);
        };
        let driver_name = store
            .find_driver(route.driver_id)
            .await?
            .map(|driver| driver.display_name());

        Ok(Some(RouteSummary::new(&route, parcel, driver_name)))
    }
}
