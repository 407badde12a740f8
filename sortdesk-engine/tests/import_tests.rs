//! Import reconciler integration tests

mod helpers;

use chrono::NaiveTime;
use helpers::*;
use sortdesk_common::db::{DocumentFormat, ParcelSource, ParcelStatus};
use sortdesk_engine::models::IssueSeverity;
use sortdesk_engine::parsers::RawDocument;
use sortdesk_engine::services::CarrierParser;
use sortdesk_engine::store::{DayStore, ImportLog, ParcelStore, RouteStore};
use sortdesk_engine::EngineError;

const CODES: [&str; 3] = ["GFFR00000000000001", "GFFR00000000000002", "gffr00000000000003"];

#[tokio::test]
async fn test_import_creates_day_route_and_parcels() {
    let engine = test_engine().await;
    let driver = add_driver(&engine, "Hakim", "Benali").await;

    let summary = engine
        .importer
        .import_parcels(sort_date(), driver.id, "Hakim_Benali.xlsx", DocumentFormat::CarrierA, &parsed_batch(&CODES))
        .await
        .unwrap();

    assert_eq!(summary.added_count, 3);
    assert_eq!(summary.skipped_count, 0);
    assert_eq!(summary.total_parsed, 3);
    assert_eq!(summary.route_parcel_count, 3);
    assert!(summary.errors.is_empty());

    let day = engine.store.find_day(sort_date()).await.unwrap().expect("day created");
    assert!(day.is_active());
    assert_eq!(day.cutoff, NaiveTime::from_hms_opt(22, 30, 0));
    assert!(day.cutoff_enforced);

    let route = engine.store.find_route(day.id, driver.id).await.unwrap().expect("route created");
    assert_eq!(route.id, summary.route_id);
    assert_eq!(route.parcel_count, 3);
    assert!(!route.sequencing_applied);

    let parcel = engine
        .store
        .find_parcel_by_code(day.id, "GFFR00000000000003")
        .await
        .unwrap()
        .expect("lowercase code stored uppercase");
    assert_eq!(parcel.tracking_code, "GFFR00000000000003");
    assert_eq!(parcel.status, ParcelStatus::Unsorted);
    assert_eq!(parcel.source, ParcelSource::CarrierA);
    assert_eq!(parcel.route_id, Some(route.id));
    assert_eq!(parcel.postal_code.as_deref(), Some("51100"));
}

#[tokio::test]
async fn test_reimport_adds_nothing_and_keeps_count() {
    let engine = test_engine().await;
    let driver = add_driver(&engine, "Hakim", "Benali").await;
    let batch = parsed_batch(&CODES);

    engine
        .importer
        .import_parcels(sort_date(), driver.id, "a.xlsx", DocumentFormat::CarrierA, &batch)
        .await
        .unwrap();
    let second = engine
        .importer
        .import_parcels(sort_date(), driver.id, "a.xlsx", DocumentFormat::CarrierA, &batch)
        .await
        .unwrap();

    assert_eq!(second.added_count, 0);
    assert_eq!(second.skipped_count, 3);
    assert_eq!(second.route_parcel_count, 3);
    assert_eq!(second.errors.len(), 1);
    assert_eq!(second.errors[0].code, "NOTHING_NEW");
    assert_eq!(second.errors[0].severity, IssueSeverity::Warning);

    let pool = engine.store.pool();
    assert_eq!(count_rows(pool, "SELECT COUNT(*) FROM parcels").await, 3);
    assert_eq!(count_rows(pool, "SELECT COUNT(*) FROM imports").await, 2);
}

#[tokio::test]
async fn test_duplicate_inside_one_file_is_skipped() {
    let engine = test_engine().await;
    let driver = add_driver(&engine, "Hakim", "Benali").await;

    let summary = engine
        .importer
        .import_parcels(
            sort_date(),
            driver.id,
            "a.xlsx",
            DocumentFormat::CarrierB,
            &parsed_batch(&["CNFR1234567890HD", " cnfr1234567890hd "]),
        )
        .await
        .unwrap();

    assert_eq!(summary.added_count, 1);
    assert_eq!(summary.skipped_count, 1);
}

#[tokio::test]
async fn test_code_known_on_another_route_is_not_duplicated() {
    let engine = test_engine().await;
    let hakim = add_driver(&engine, "Hakim", "Benali").await;
    let louis = add_driver(&engine, "Louis", "Martin").await;

    engine
        .importer
        .import_parcels(sort_date(), hakim.id, "h.xlsx", DocumentFormat::CarrierA, &parsed_batch(&CODES[..2]))
        .await
        .unwrap();
    let summary = engine
        .importer
        .import_parcels(sort_date(), louis.id, "l.xlsx", DocumentFormat::CarrierA, &parsed_batch(&CODES))
        .await
        .unwrap();

    assert_eq!(summary.added_count, 1);
    assert_eq!(summary.skipped_count, 2);
    assert_eq!(summary.route_parcel_count, 1);
}

#[tokio::test]
async fn test_same_code_on_another_day_is_new() {
    let engine = test_engine().await;
    let driver = add_driver(&engine, "Hakim", "Benali").await;
    let next_day = sort_date().succ_opt().unwrap();

    engine
        .importer
        .import_parcels(sort_date(), driver.id, "a.xlsx", DocumentFormat::CarrierA, &parsed_batch(&CODES))
        .await
        .unwrap();
    let summary = engine
        .importer
        .import_parcels(next_day, driver.id, "a.xlsx", DocumentFormat::CarrierA, &parsed_batch(&CODES))
        .await
        .unwrap();

    assert_eq!(summary.added_count, 3);
}

#[tokio::test]
async fn test_empty_batch_is_error_and_creates_nothing() {
    let engine = test_engine().await;
    let driver = add_driver(&engine, "Hakim", "Benali").await;

    let result = engine
        .importer
        .import_parcels(sort_date(), driver.id, "empty.xlsx", DocumentFormat::CarrierA, &[])
        .await;

    let err = result.expect_err("empty batch must not succeed");
    assert!(matches!(err, EngineError::EmptyDocument));
    assert_eq!(err.code(), "EMPTY_DOCUMENT");
    assert!(engine.store.find_day(sort_date()).await.unwrap().is_none());
    assert_eq!(count_rows(engine.store.pool(), "SELECT COUNT(*) FROM imports").await, 0);
}

#[tokio::test]
async fn test_route_count_is_recomputed_not_incremented() {
    let engine = test_engine().await;
    let driver = add_driver(&engine, "Hakim", "Benali").await;

    let first = engine
        .importer
        .import_parcels(sort_date(), driver.id, "a.xlsx", DocumentFormat::CarrierA, &parsed_batch(&CODES))
        .await
        .unwrap();

    // parcel removed outside the engine
    sqlx::query("DELETE FROM parcels WHERE tracking_code = 'GFFR00000000000001'")
        .execute(engine.store.pool())
        .await
        .unwrap();

    let second = engine
        .importer
        .import_parcels(sort_date(), driver.id, "b.xlsx", DocumentFormat::CarrierA, &parsed_batch(&["GFFR00000000000009"]))
        .await
        .unwrap();

    assert_eq!(second.route_id, first.route_id);
    assert_eq!(second.route_parcel_count, 3);
    let route = engine.store.find_route_by_id(first.route_id).await.unwrap().unwrap();
    assert_eq!(route.parcel_count, 3);
}

#[tokio::test]
async fn test_unknown_scan_row_does_not_block_import() {
    let engine = test_engine().await;
    let driver = add_driver(&engine, "Hakim", "Benali").await;
    let operator = uuid::Uuid::new_v4();

    // day exists, code scanned before any import lists it
    engine
        .importer
        .import_parcels(sort_date(), driver.id, "a.xlsx", DocumentFormat::CarrierA, &parsed_batch(&CODES[..1]))
        .await
        .unwrap();
    engine
        .scanner
        .record_scan(sort_date(), "CNFR1234567890HD", operator, false)
        .await
        .unwrap();

    let summary = engine
        .importer
        .import_parcels(sort_date(), driver.id, "b.xlsx", DocumentFormat::CarrierB, &parsed_batch(&["CNFR1234567890HD"]))
        .await
        .unwrap();
    assert_eq!(summary.added_count, 1);

    let day = engine.store.find_day(sort_date()).await.unwrap().unwrap();
    let parcel = engine
        .store
        .find_parcel_by_code(day.id, "CNFR1234567890HD")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(parcel.status, ParcelStatus::Unsorted);
    assert_eq!(parcel.route_id, Some(summary.route_id));
}

#[tokio::test]
async fn test_import_document_resolves_driver_from_file_name() {
    let engine = test_engine().await;
    let driver = add_driver(&engine, "Louis", "Martin").await;
    let csv = "Tracking No.,Sort Code,Receiver's Region/Province,Receiver's City,Receiver's Detail Address\n\
               CNFR1234567890HD,51100,Marne,Reims,4 rue du Barbatre\n\
               CNFR1234567891HD,51200,Marne,Epernay,1 avenue de Champagne\n";
    let document = RawDocument::new("Louis_Martin.csv", csv.as_bytes().to_vec());

    let summary = engine
        .importer
        .import_document(sort_date(), &document, CarrierParser::Auto, None)
        .await
        .unwrap();

    assert_eq!(summary.driver_id, driver.id);
    assert_eq!(summary.format, DocumentFormat::CarrierB);
    assert_eq!(summary.added_count, 2);

    let day = engine.store.find_day(sort_date()).await.unwrap().unwrap();
    let parcel = engine
        .store
        .find_parcel_by_code(day.id, "CNFR1234567891HD")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(parcel.city.as_deref(), Some("Epernay"));
    assert_eq!(parcel.region.as_deref(), Some("Marne"));
    assert_eq!(parcel.source, ParcelSource::CarrierB);
}

#[tokio::test]
async fn test_import_document_unknown_driver() {
    let engine = test_engine().await;
    add_driver(&engine, "Louis", "Martin").await;
    let document = RawDocument::new("Nadia_Petit.csv", b"data.waybillNo\nGFFR0001\n".to_vec());

    let err = engine
        .importer
        .import_document(sort_date(), &document, CarrierParser::CarrierA, None)
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::DriverNotFound(ref name) if name == "Nadia_Petit"));
    assert!(engine.store.find_day(sort_date()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_header_only_document_is_empty_document() {
    let engine = test_engine().await;
    add_driver(&engine, "Louis", "Martin").await;
    let document = RawDocument::new("Louis_Martin.csv", b"data.waybillNo,data.toCity\n".to_vec());

    let err = engine
        .importer
        .import_document(sort_date(), &document, CarrierParser::CarrierA, None)
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::EmptyDocument));
}

#[tokio::test]
async fn test_unreadable_workbook_is_parse_error() {
    let engine = test_engine().await;
    add_driver(&engine, "Louis", "Martin").await;
    let document = RawDocument::new("Louis_Martin.xlsx", b"definitely not a zip".to_vec());

    let err = engine
        .importer
        .import_document(sort_date(), &document, CarrierParser::CarrierB, None)
        .await
        .unwrap_err();

    assert_eq!(err.code(), "PARSE_ERROR");
}

#[tokio::test]
async fn test_import_history_newest_first() {
    let engine = test_engine().await;
    let driver = add_driver(&engine, "Hakim", "Benali").await;

    for file in ["first.xlsx", "second.xlsx"] {
        engine
            .importer
            .import_parcels(sort_date(), driver.id, file, DocumentFormat::CarrierA, &parsed_batch(&CODES))
            .await
            .unwrap();
    }

    let records = engine.store.list_imports(sort_date()).await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].file_name, "second.xlsx");
    assert_eq!(records[0].added_count, 0);
    assert_eq!(records[0].skipped_count, 3);
    assert_eq!(records[1].file_name, "first.xlsx");
    assert_eq!(records[1].driver_id, Some(driver.id));
    assert_eq!(records[1].format, DocumentFormat::CarrierA);

    let other_day = sort_date().succ_opt().unwrap();
    assert!(engine.store.list_imports(other_day).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_imports_survive_reopening_database() {
    use sortdesk_engine::{Engine, EngineSettings};
    use tempfile::TempDir;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("data").join("sortdesk.db");
    let settings = EngineSettings::default();

    let driver_id = {
        let engine = Engine::open(&db_path, &settings).await.unwrap();
        let driver = add_driver(&engine, "Hakim", "Benali").await;
        engine
            .importer
            .import_parcels(sort_date(), driver.id, "a.xlsx", DocumentFormat::CarrierA, &parsed_batch(&CODES))
            .await
            .unwrap();
        engine.store.pool().close().await;
        driver.id
    };

    let engine = Engine::open(&db_path, &settings).await.unwrap();
    let second = engine
        .importer
        .import_parcels(sort_date(), driver_id, "a.xlsx", DocumentFormat::CarrierA, &parsed_batch(&CODES))
        .await
        .unwrap();
    assert_eq!(second.added_count, 0);
    assert_eq!(second.route_parcel_count, 3);
}
