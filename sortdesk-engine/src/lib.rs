//! sortdesk-engine: parcel ingestion and sort tracking
//!
//! Carrier documents go through [`parsers`] (optionally picked by the
//! [`classifier`]) into the [`services::ImportReconciler`]; scanner reads go
//! through the [`services::ScanMachine`]; offline batches through
//! [`services::OfflineSync`]. Persistence is behind the [`store`] traits.

pub mod classifier;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod parsers;
pub mod services;
pub mod store;
pub mod utils;

pub use crate::config::EngineSettings;
pub use crate::error::{EngineError, EngineResult};

use std::path::Path;
use std::sync::Arc;

use crate::services::{ImportReconciler, OfflineSync, ScanMachine, SequencingService};
use crate::store::{SortingStore, SqliteStore};

/// The engine services sharing one store
pub struct Engine<S> {
    pub store: Arc<S>,
    pub importer: ImportReconciler<S>,
    pub sequencing: SequencingService<S>,
    pub scanner: ScanMachine<S>,
    pub sync: OfflineSync<S>,
}

impl<S: SortingStore> Engine<S> {
    pub fn new(store: Arc<S>, settings: &EngineSettings) -> Self {
        let scanner = ScanMachine::new(Arc::clone(&store));
        Self {
            importer: ImportReconciler::new(Arc::clone(&store), settings.day_defaults.clone()),
            sequencing: SequencingService::new(Arc::clone(&store), settings.day_defaults.clone()),
            sync: OfflineSync::from_machine(scanner.clone()),
            scanner,
            store,
        }
    }
}

impl Engine<SqliteStore> {
    /// Open (or create) the database at `db_path` and build the engine on it
    pub async fn open(db_path: &Path, settings: &EngineSettings) -> sortdesk_common::Result<Self> {
        let pool = sortdesk_common::db::init_database(db_path).await?;
        let store = SqliteStore::new(pool).with_max_lock_wait(settings.max_lock_wait_ms);
        Ok(Self::new(Arc::new(store), settings))
    }
}
