//! Shared fixtures for the engine integration tests
//!
//! Each test gets its own in-memory database. The pool is limited to one
//! connection because every `sqlite::memory:` connection is a separate database.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use sortdesk_common::db::init_schema;
use sortdesk_common::db::Driver;
use sortdesk_engine::db::drivers::save_driver;
use sortdesk_engine::parsers::ParsedParcel;
use sortdesk_engine::store::SqliteStore;
use sortdesk_engine::{Engine, EngineSettings};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use uuid::Uuid;

pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");
    init_schema(&pool).await.expect("Failed to apply schema");
    pool
}

pub async fn test_engine() -> Engine<SqliteStore> {
    let store = SqliteStore::new(memory_pool().await).with_max_lock_wait(500);
    Engine::new(Arc::new(store), &EngineSettings::default())
}

pub fn sort_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
}

pub async fn add_driver(engine: &Engine<SqliteStore>, first: &str, last: &str) -> Driver {
    let driver = Driver {
        id: Uuid::new_v4(),
        first_name: Some(first.to_string()),
        last_name: last.to_string(),
        subcontractor_id: None,
        active: true,
    };
    save_driver(engine.store.pool(), &driver).await.unwrap();
    driver
}

pub fn parsed(code: &str) -> ParsedParcel {
    ParsedParcel {
        tracking_code: code.to_string(),
        address: Some("12 rue de Vesle".to_string()),
        city: Some("Reims".to_string()),
        postal_code: Some("51100".to_string()),
        region: None,
    }
}

pub fn parsed_batch(codes: &[&str]) -> Vec<ParsedParcel> {
    codes.iter().map(|code| parsed(code)).collect()
}

pub async fn count_rows(pool: &SqlitePool, sql: &str) -> i64 {
    sqlx::query_scalar(sql).fetch_one(pool).await.unwrap()
}
