//! Offline sync reconciler
//!
//! Replays a batch of scans collected while a scanner had no connection.
//! Entries are processed in order and classified independently; there is no
//! batch-level rollback.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;
use uuid::Uuid;

use super::scan_machine::ScanMachine;
use crate::error::EngineResult;
use crate::models::{OfflineScan, ScanOutcome, SyncSummary};
use crate::store::SortingStore;

pub struct OfflineSync<S> {
    machine: ScanMachine<S>,
}

impl<S: SortingStore> OfflineSync<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            machine: ScanMachine::new(store),
        }
    }

    pub fn from_machine(machine: ScanMachine<S>) -> Self {
        Self { machine }
    }

    /// Replay `scans` against the active Day for `day_date`
    ///
    /// Unknown codes are counted but not persisted. A parcel that already has
    /// a live scan counts as a duplicate and keeps its live scan.
    pub async fn sync_batch(
        &self,
        day_date: NaiveDate,
        operator_id: Uuid,
        scans: &[OfflineScan],
    ) -> EngineResult<SyncSummary> {
        let day = self.machine.active_day(day_date).await?;
        let mut summary = SyncSummary::default();

        for scan in scans {
            summary.total += 1;
            let outcome = self
                .machine
                .replay_offline_scan(&day, &scan.tracking_code, operator_id, scan.scanned_at)
                .await?;

            match outcome {
                ScanOutcome::Success { .. } => summary.synced += 1,
                ScanOutcome::Duplicate { .. } => summary.duplicates += 1,
                ScanOutcome::Unknown { .. } => summary.unknown += 1,
            }
        }

        info!(
            operator = %operator_id,
            date = %day_date,
            total = summary.total,
            synced = summary.synced,
            duplicates = summary.duplicates,
            unknown = summary.unknown,
            "Offline batch synced"
        );

        Ok(summary)
    }
}
