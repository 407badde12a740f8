//! Offline sync integration tests

mod helpers;

use chrono::{TimeZone, Utc};
use helpers::*;
use sortdesk_common::db::{DayStatus, DocumentFormat, ParcelStatus};
use sortdesk_engine::models::{OfflineScan, SyncSummary};
use sortdesk_engine::store::{DayStore, ParcelStore, ScanStore};
use sortdesk_engine::EngineError;
use uuid::Uuid;

const SORTED: &str = "GFFR00000000000001";
const PENDING: &str = "GFFR00000000000002";
const ABSENT: &str = "ZZFR00000000000009";

fn offline(code: &str, minute: u32) -> OfflineScan {
    OfflineScan {
        tracking_code: code.to_string(),
        scanned_at: Utc.with_ymd_and_hms(2026, 3, 14, 6, minute, 0).unwrap(),
    }
}

async fn engine_with_one_sorted() -> (sortdesk_engine::Engine<sortdesk_engine::store::SqliteStore>, Uuid) {
    let engine = test_engine().await;
    let driver = add_driver(&engine, "Louis", "Martin").await;
    engine
        .importer
        .import_parcels(
            sort_date(),
            driver.id,
            "Louis_Martin.xlsx",
            DocumentFormat::CarrierB,
            &parsed_batch(&[SORTED, PENDING]),
        )
        .await
        .unwrap();

    let live_operator = Uuid::new_v4();
    engine
        .scanner
        .record_scan(sort_date(), SORTED, live_operator, false)
        .await
        .unwrap();
    (engine, live_operator)
}

#[tokio::test]
async fn test_mixed_batch_summary() {
    let (engine, _) = engine_with_one_sorted().await;

    let summary = engine
        .sync
        .sync_batch(
            sort_date(),
            Uuid::new_v4(),
            &[offline(PENDING, 1), offline(SORTED, 2), offline(ABSENT, 3)],
        )
        .await
        .unwrap();

    assert_eq!(
        summary,
        SyncSummary {
            total: 3,
            synced: 1,
            duplicates: 1,
            unknown: 1,
        }
    );
}

#[tokio::test]
async fn test_unknown_offline_codes_are_not_persisted() {
    let (engine, _) = engine_with_one_sorted().await;

    engine
        .sync
        .sync_batch(sort_date(), Uuid::new_v4(), &[offline(ABSENT, 1), offline("", 2)])
        .await
        .unwrap();

    let pool = engine.store.pool();
    assert_eq!(
        count_rows(pool, "SELECT COUNT(*) FROM parcels WHERE status = 'unknown'").await,
        0
    );
}

#[tokio::test]
async fn test_duplicate_keeps_live_scan() {
    let (engine, live_operator) = engine_with_one_sorted().await;
    let day = engine.store.find_day(sort_date()).await.unwrap().unwrap();

    engine
        .sync
        .sync_batch(sort_date(), Uuid::new_v4(), &[offline(SORTED, 5)])
        .await
        .unwrap();

    let parcel = engine.store.find_parcel_by_code(day.id, SORTED).await.unwrap().unwrap();
    let scan = engine.store.find_scan_by_parcel(parcel.id).await.unwrap().unwrap();
    assert_eq!(scan.operator_id, live_operator);
    assert!(!scan.offline);
}

#[tokio::test]
async fn test_synced_scan_keeps_client_time() {
    let (engine, _) = engine_with_one_sorted().await;
    let day = engine.store.find_day(sort_date()).await.unwrap().unwrap();
    let operator = Uuid::new_v4();
    let entry = offline("gffr00000000000002", 42);

    engine
        .sync
        .sync_batch(sort_date(), operator, std::slice::from_ref(&entry))
        .await
        .unwrap();

    let parcel = engine.store.find_parcel_by_code(day.id, PENDING).await.unwrap().unwrap();
    assert_eq!(parcel.status, ParcelStatus::Sorted);

    let scan = engine.store.find_scan_by_parcel(parcel.id).await.unwrap().unwrap();
    assert_eq!(scan.operator_id, operator);
    assert_eq!(scan.scanned_at, entry.scanned_at);
    assert!(scan.offline);
}

#[tokio::test]
async fn test_same_code_twice_in_batch() {
    let (engine, _) = engine_with_one_sorted().await;

    let summary = engine
        .sync
        .sync_batch(sort_date(), Uuid::new_v4(), &[offline(PENDING, 1), offline(PENDING, 2)])
        .await
        .unwrap();

    assert_eq!(summary.synced, 1);
    assert_eq!(summary.duplicates, 1);
}

#[tokio::test]
async fn test_sync_requires_active_day() {
    let (engine, _) = engine_with_one_sorted().await;
    let day = engine.store.find_day(sort_date()).await.unwrap().unwrap();
    engine.store.set_day_status(day.id, DayStatus::Closed).await.unwrap();

    let err = engine
        .sync
        .sync_batch(sort_date(), Uuid::new_v4(), &[offline(PENDING, 1)])
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NoActiveDay(_)));

    let other_day = sort_date().succ_opt().unwrap();
    let err = engine
        .sync
        .sync_batch(other_day, Uuid::new_v4(), &[])
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NoActiveDay(date) if date == other_day));
}
