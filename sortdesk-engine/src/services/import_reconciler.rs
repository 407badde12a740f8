//! Import reconciler
//!
//! Merges parsed carrier records into the Day/Route/Parcel model without
//! duplicating tracking codes already known for the Day.

use std::sync::Arc;

use chrono::NaiveDate;
use sortdesk_common::db::{DayDefaults, DocumentFormat, NewImportRecord, NewParcel, ParcelStatus};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{refresh_route_count, resolve_day, resolve_route};
use crate::classifier;
use crate::error::{EngineError, EngineResult};
use crate::models::{ImportIssue, ImportSummary};
use crate::parsers::{normalize_tracking, DocumentParser, ParsedDocument, ParsedParcel, RawDocument};
use crate::store::{InsertOutcome, SortingStore};

/// Grammar selection for a carrier upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarrierParser {
    CarrierA,
    CarrierB,
    /// Header-based detection, positional fallback
    Auto,
}

pub struct ImportReconciler<S> {
    store: Arc<S>,
    day_defaults: DayDefaults,
}

impl<S: SortingStore> ImportReconciler<S> {
    pub fn new(store: Arc<S>, day_defaults: DayDefaults) -> Self {
        Self { store, day_defaults }
    }

    /// Merge one parsed batch into the driver's route for `day_date`
    ///
    /// **Algorithm:**
    /// 1. Reject an empty batch with `EmptyDocument` (nothing parseable is not "nothing new")
    /// 2. Resolve or create the Day, then the driver's Route
    /// 3. Per record: skip codes already held by a non-unknown parcel of the Day,
    ///    insert the rest as `unsorted` bound to the Route
    /// 4. Recompute the Route count from its bound parcels
    /// 5. Append one Import Record
    ///
    /// Records inserted before a store failure stay inserted; re-running the
    /// import skips them.
    pub async fn import_parcels(
        &self,
        day_date: NaiveDate,
        driver_id: Uuid,
        file_name: &str,
        format: DocumentFormat,
        parcels: &[ParsedParcel],
    ) -> EngineResult<ImportSummary> {
        if parcels.is_empty() {
            warn!(file = file_name, "Import rejected: no parseable records");
            return Err(EngineError::EmptyDocument);
        }

        let store = self.store.as_ref();
        let day = resolve_day(store, day_date, &self.day_defaults).await?;
        let route = resolve_route(store, day.id, driver_id).await?;
        let source = format.parcel_source();

        let mut added_count = 0u32;
        let mut skipped_count = 0u32;

        for parsed in parcels {
            let tracking_code = normalize_tracking(&parsed.tracking_code);

            if let Some(existing) = store.find_parcel_by_code(day.id, &tracking_code).await? {
                if existing.status != ParcelStatus::Unknown {
                    debug!(tracking = %tracking_code, "Already imported for this day, skipping");
                    skipped_count += 1;
                    continue;
                }
            }

            let fields = NewParcel {
                day_id: day.id,
                route_id: Some(route.id),
                tracking_code: tracking_code.clone(),
                address: parsed.address.clone(),
                city: parsed.city.clone(),
                postal_code: parsed.postal_code.clone(),
                region: parsed.region.clone(),
                source,
                status: ParcelStatus::Unsorted,
                sequence_number: None,
            };

            match store.insert_parcel(&fields).await? {
                InsertOutcome::Inserted(_) => added_count += 1,
                InsertOutcome::AlreadyPresent(_) => {
                    debug!(tracking = %tracking_code, "Inserted concurrently, skipping");
                    skipped_count += 1;
                }
            }
        }

        let route_parcel_count = refresh_route_count(store, route.id).await?;

        let record = store
            .record_import(&NewImportRecord {
                day_id: day.id,
                route_id: Some(route.id),
                driver_id: Some(driver_id),
                file_name: file_name.to_string(),
                format,
                added_count,
                skipped_count,
            })
            .await?;

        let mut errors = Vec::new();
        if added_count == 0 {
            errors.push(ImportIssue::warning(
                "NOTHING_NEW",
                format!("All {} parcels were already imported for {}", skipped_count, day_date),
            ));
        }

        info!(
            file = file_name,
            format = %format,
            date = %day_date,
            added = added_count,
            skipped = skipped_count,
            route_parcels = route_parcel_count,
            "Import complete"
        );

        Ok(ImportSummary {
            import_id: record.id,
            day_id: day.id,
            route_id: route.id,
            driver_id,
            file_name: file_name.to_string(),
            format,
            added_count,
            skipped_count,
            total_parsed: u32::try_from(parcels.len()).unwrap_or(u32::MAX),
            route_parcel_count,
            errors,
        })
    }

    /// Import a carrier upload whose file stem names the driver (`Prenom_Nom.xlsx`)
    pub async fn import_document(
        &self,
        day_date: NaiveDate,
        document: &RawDocument,
        parser: CarrierParser,
        scope: Option<Uuid>,
    ) -> EngineResult<ImportSummary> {
        let driver_name = document.stem();
        let driver = self
            .store
            .find_driver_by_name(&driver_name, scope)
            .await?
            .ok_or_else(|| {
                warn!(file = %document.file_name, driver = %driver_name, "No driver matches file name");
                EngineError::DriverNotFound(driver_name.clone())
            })?;

        let (format, parcels) = match parser {
            CarrierParser::Auto => {
                let classified = classifier::parse_auto(document)?;
                (classified.format, classified.parcels)
            }
            CarrierParser::CarrierA => (DocumentFormat::CarrierA, parse_parcels(DocumentParser::CarrierA, document)?),
            CarrierParser::CarrierB => (DocumentFormat::CarrierB, parse_parcels(DocumentParser::CarrierB, document)?),
        };

        self.import_parcels(day_date, driver.id, &document.file_name, format, &parcels)
            .await
    }
}

fn parse_parcels(parser: DocumentParser, document: &RawDocument) -> EngineResult<Vec<ParsedParcel>> {
    match parser.parse(document)? {
        ParsedDocument::Parcels(parcels) => Ok(parcels),
        _ => Err(EngineError::InvalidInput(format!(
            "{} is not a spreadsheet layout",
            parser.format()
        ))),
    }
}
