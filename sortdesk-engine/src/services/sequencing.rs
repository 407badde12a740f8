//! Sequencing ingestion
//!
//! Three entry points:
//! - multi-driver manifests create routes and parcels for every named driver
//! - single-route lists apply delivery order to an existing route
//! - single-route lists can also build a route from parcels already imported
//!   for the Day

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::NaiveDate;
use sortdesk_common::db::{
    DayDefaults, DocumentFormat, NewImportRecord, NewParcel, ParcelSource, ParcelStatus,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{refresh_route_count, resolve_day, resolve_route};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    DriverImportOutcome, ImportIssue, ManifestImportSummary, RouteSequenceSummary,
    SequenceApplySummary,
};
use crate::parsers::address::split_address;
use crate::parsers::{
    normalize_tracking, DocumentParser, DriverManifest, ParsedDocument, RawDocument, SequenceEntry,
};
use crate::store::{InsertOutcome, SortingStore};

fn count_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// Parse a multi-driver manifest document
pub fn parse_manifest(document: &RawDocument) -> EngineResult<Vec<DriverManifest>> {
    match DocumentParser::SequencingMulti.parse(document)? {
        ParsedDocument::Manifest(drivers) => Ok(drivers),
        _ => Err(EngineError::InvalidInput("expected a multi-driver manifest".to_string())),
    }
}

/// Parse a single-route sequence document
pub fn parse_sequence(document: &RawDocument) -> EngineResult<Vec<SequenceEntry>> {
    match DocumentParser::SequencingSingle.parse(document)? {
        ParsedDocument::Sequence(entries) => Ok(entries),
        _ => Err(EngineError::InvalidInput("expected a single-route sequence".to_string())),
    }
}

pub struct SequencingService<S> {
    store: Arc<S>,
    day_defaults: DayDefaults,
}

impl<S: SortingStore> SequencingService<S> {
    pub fn new(store: Arc<S>, day_defaults: DayDefaults) -> Self {
        Self { store, day_defaults }
    }

    /// Ingest a multi-driver manifest for `day_date`
    ///
    /// Existence is checked against the whole Day, not the driver's route, so
    /// parcels already imported from a carrier file are not duplicated. Such a
    /// parcel receives its sequence number only when it already sits on this
    /// driver's route; one bound to another route is left untouched. Drivers
    /// missing from the directory are reported individually and do not abort
    /// the batch.
    pub async fn import_manifest(
        &self,
        day_date: NaiveDate,
        file_name: &str,
        drivers: &[DriverManifest],
        scope: Option<Uuid>,
    ) -> EngineResult<ManifestImportSummary> {
        let total_parsed: usize = drivers.iter().map(|d| d.parcels.len()).sum();
        if total_parsed == 0 {
            warn!(file = file_name, "Manifest rejected: no parcels matched a driver range");
            return Err(EngineError::EmptyDocument);
        }

        let store = self.store.as_ref();
        let day = resolve_day(store, day_date, &self.day_defaults).await?;

        let mut outcomes = Vec::with_capacity(drivers.len());
        let mut errors = Vec::new();
        let mut added_total = 0u32;
        let mut skipped_total = 0u32;

        for manifest in drivers {
            let parcel_count = count_u32(manifest.parcels.len());

            let Some(driver) = store.find_driver_by_name(&manifest.driver_name, scope).await? else {
                warn!(driver = %manifest.driver_name, parcels = parcel_count, "Manifest driver not in directory");
                errors.push(ImportIssue::skip(
                    "DRIVER_NOT_FOUND",
                    format!(
                        "Driver \"{}\" not found; {} parcels not imported",
                        manifest.driver_name, parcel_count
                    ),
                ));
                outcomes.push(DriverImportOutcome::DriverNotFound {
                    driver_name: manifest.driver_name.clone(),
                    parcel_count,
                });
                continue;
            };

            let route = resolve_route(store, day.id, driver.id).await?;
            let mut added_count = 0u32;
            let mut skipped_count = 0u32;

            for parcel in &manifest.parcels {
                let tracking_code = normalize_tracking(&parcel.tracking_code);

                let existing = store
                    .find_parcel_by_code(day.id, &tracking_code)
                    .await?
                    .filter(|p| p.status != ParcelStatus::Unknown);

                let existing = match existing {
                    Some(existing) => Some(existing),
                    None => {
                        let parts = split_address(&parcel.address);
                        let fields = NewParcel {
                            day_id: day.id,
                            route_id: Some(route.id),
                            tracking_code: tracking_code.clone(),
                            address: parts.street,
                            city: parts.city,
                            postal_code: parts.postal_code,
                            region: None,
                            source: ParcelSource::Sequencing,
                            status: ParcelStatus::Unsorted,
                            sequence_number: Some(parcel.position),
                        };
                        match store.insert_parcel(&fields).await? {
                            InsertOutcome::Inserted(_) => None,
                            InsertOutcome::AlreadyPresent(existing) => Some(existing),
                        }
                    }
                };

                match existing {
                    Some(existing) if existing.route_id == Some(route.id) => {
                        debug!(tracking = %tracking_code, position = parcel.position, "Known parcel, setting order");
                        store.update_parcel_order(existing.id, parcel.position, None).await?;
                        skipped_count += 1;
                    }
                    Some(existing) => {
                        // positions apply to this driver's route only
                        warn!(
                            tracking = %tracking_code,
                            driver = %manifest.driver_name,
                            parcel_route = ?existing.route_id,
                            "Known parcel bound to another route, order not applied"
                        );
                        skipped_count += 1;
                    }
                    None => added_count += 1,
                }
            }

            refresh_route_count(store, route.id).await?;
            store.set_route_sequenced(route.id, true).await?;

            added_total += added_count;
            skipped_total += skipped_count;
            outcomes.push(DriverImportOutcome::Imported {
                driver_name: manifest.driver_name.clone(),
                driver_id: driver.id,
                route_id: route.id,
                added_count,
                skipped_count,
                parcel_count,
            });
        }

        let record = store
            .record_import(&NewImportRecord {
                day_id: day.id,
                route_id: None,
                driver_id: None,
                file_name: file_name.to_string(),
                format: DocumentFormat::SequencingMulti,
                added_count: added_total,
                skipped_count: skipped_total,
            })
            .await?;

        info!(
            file = file_name,
            date = %day_date,
            drivers = outcomes.len(),
            unmatched = errors.len(),
            added = added_total,
            skipped = skipped_total,
            "Manifest import complete"
        );

        Ok(ManifestImportSummary {
            import_id: record.id,
            day_id: day.id,
            file_name: file_name.to_string(),
            drivers: outcomes,
            added_count: added_total,
            skipped_count: skipped_total,
            total_parsed: count_u32(total_parsed),
            errors,
        })
    }

    /// Parse and ingest a multi-driver manifest document
    pub async fn import_manifest_document(
        &self,
        day_date: NaiveDate,
        document: &RawDocument,
        scope: Option<Uuid>,
    ) -> EngineResult<ManifestImportSummary> {
        let drivers = parse_manifest(document)?;
        self.import_manifest(day_date, &document.file_name, &drivers, scope)
            .await
    }

    /// Apply a delivery order to the parcels of an existing route
    ///
    /// Entries whose code is not on the route are ignored. `found` counts the
    /// entries read, `updated` the route parcels that received an order.
    pub async fn apply_route_sequence(
        &self,
        route_id: Uuid,
        file_name: &str,
        entries: &[SequenceEntry],
    ) -> EngineResult<SequenceApplySummary> {
        let store = self.store.as_ref();
        let route = store
            .find_route_by_id(route_id)
            .await?
            .ok_or(EngineError::RouteNotFound(route_id))?;

        if entries.is_empty() {
            return Err(EngineError::EmptyDocument);
        }

        let by_code: HashMap<String, Uuid> = store
            .list_route_parcels(route.id)
            .await?
            .into_iter()
            .map(|p| (p.tracking_code.to_uppercase(), p.id))
            .collect();

        let mut updated = 0u32;
        for entry in entries {
            match by_code.get(&normalize_tracking(&entry.tracking_code)) {
                Some(parcel_id) => {
                    store.update_parcel_order(*parcel_id, entry.order, None).await?;
                    updated += 1;
                }
                None => debug!(tracking = %entry.tracking_code, "Sequence entry not on route"),
            }
        }

        store.set_route_sequenced(route.id, true).await?;

        let found = count_u32(entries.len());
        let record = store
            .record_import(&NewImportRecord {
                day_id: route.day_id,
                route_id: Some(route.id),
                driver_id: Some(route.driver_id),
                file_name: file_name.to_string(),
                format: DocumentFormat::SequencingSingle,
                added_count: updated,
                skipped_count: found.saturating_sub(updated),
            })
            .await?;

        info!(file = file_name, route_id = %route.id, found, updated, "Route sequence applied");

        Ok(SequenceApplySummary {
            import_id: record.id,
            route_id: route.id,
            found,
            updated,
        })
    }

    /// Build (or extend) a driver's route from parcels already known for the Day
    ///
    /// Every listed parcel of the Day is rebound to the route with its order;
    /// codes unknown to the Day are ignored.
    pub async fn create_route_with_sequence(
        &self,
        day_date: NaiveDate,
        driver_id: Uuid,
        file_name: &str,
        entries: &[SequenceEntry],
    ) -> EngineResult<RouteSequenceSummary> {
        if entries.is_empty() {
            return Err(EngineError::EmptyDocument);
        }

        let store = self.store.as_ref();
        if store.find_driver(driver_id).await?.is_none() {
            return Err(EngineError::DriverNotFound(driver_id.to_string()));
        }

        let day = resolve_day(store, day_date, &self.day_defaults).await?;
        let route = resolve_route(store, day.id, driver_id).await?;

        let mut updated = 0u32;
        let mut previous_routes = HashSet::new();
        for entry in entries {
            let tracking_code = normalize_tracking(&entry.tracking_code);
            let parcel = store
                .find_parcel_by_code(day.id, &tracking_code)
                .await?
                .filter(|p| p.status != ParcelStatus::Unknown);

            if let Some(parcel) = parcel {
                if let Some(previous) = parcel.route_id.filter(|id| *id != route.id) {
                    previous_routes.insert(previous);
                }
                store.update_parcel_order(parcel.id, entry.order, Some(route.id)).await?;
                updated += 1;
            }
        }

        // parcels moved off other routes change those counts too
        for previous in previous_routes {
            refresh_route_count(store, previous).await?;
        }
        let route_parcel_count = refresh_route_count(store, route.id).await?;
        store.set_route_sequenced(route.id, true).await?;

        let found = count_u32(entries.len());
        let record = store
            .record_import(&NewImportRecord {
                day_id: day.id,
                route_id: Some(route.id),
                driver_id: Some(driver_id),
                file_name: file_name.to_string(),
                format: DocumentFormat::SequencingSingle,
                added_count: updated,
                skipped_count: found.saturating_sub(updated),
            })
            .await?;

        info!(
            file = file_name,
            route_id = %route.id,
            found,
            updated,
            route_parcels = route_parcel_count,
            "Route created from sequence"
        );

        Ok(RouteSequenceSummary {
            import_id: record.id,
            day_id: day.id,
            route_id: route.id,
            driver_id,
            found,
            updated,
            route_parcel_count,
        })
    }
}
