//! Engine settings derived from the bootstrap TOML

use sortdesk_common::config::TomlConfig;
use sortdesk_common::db::DayDefaults;
use sortdesk_common::Result;
use tracing::info;

/// Runtime settings for the engine services and the SQLite store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Applied when an import or a sequencing document creates a Day
    pub day_defaults: DayDefaults,
    /// Lock-contention retry budget for store writes
    pub max_lock_wait_ms: u64,
}

impl EngineSettings {
    /// Settings from `[day]` and `[store]`; an unparseable cutoff is a config error
    pub fn from_toml(config: &TomlConfig) -> Result<Self> {
        let settings = Self {
            day_defaults: config.day.to_day_defaults()?,
            max_lock_wait_ms: config.store.max_lock_wait_ms,
        };
        info!(
            cutoff = ?settings.day_defaults.cutoff,
            cutoff_enforced = settings.day_defaults.cutoff_enforced,
            max_lock_wait_ms = settings.max_lock_wait_ms,
            "Engine settings loaded"
        );
        Ok(settings)
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        let config = TomlConfig::default();
        Self {
            day_defaults: config.day.to_day_defaults().unwrap_or_default(),
            max_lock_wait_ms: config.store.max_lock_wait_ms,
        }
    }
}
