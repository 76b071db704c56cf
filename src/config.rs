//! Datastore configuration.
//!
//! Every field has a default, so a config file only needs to name the values
//! it changes. `StoreConfig::load()` reads the JSON file named by
//! `DATASTORE_CONFIG` when set.

use crate::error::{StoreError, StoreResult};
use crate::types::PrivacyLevel;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable holding the path of the JSON config file.
pub const CONFIG_ENV: &str = "DATASTORE_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Slots in the query table
    pub max_queries: usize,
    /// Slots in the domain table
    pub max_domains: usize,
    /// Slots in the client table (alias-clients included)
    pub max_clients: usize,
    /// Slots in the upstream table
    pub max_upstreams: usize,
    /// Slots in the per-client decision cache
    pub max_cache_entries: usize,
    /// Byte budget of the string pool
    pub max_string_bytes: usize,

    /// Width of one OverTime bucket
    pub overtime_interval_secs: u64,
    /// Number of OverTime buckets kept
    pub overtime_slots: usize,

    /// How many of the most recent queries `find_query` looks at
    pub correlation_lookback: usize,

    /// Privacy level stamped on newly recorded queries
    pub privacy_level: PrivacyLevel,

    /// Trace every status transition at debug level
    pub debug_status: bool,

    /// Seconds between scheduled list reloads
    pub reload_interval_secs: u64,
    /// Run a list reload as soon as the server starts
    pub reload_on_start: bool,
    /// SQLite list database
    pub list_db_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_queries: 1_000_000,
            max_domains: 100_000,
            max_clients: 10_000,
            max_upstreams: 256,
            max_cache_entries: 200_000,
            max_string_bytes: 64 * 1024 * 1024,
            overtime_interval_secs: 600,
            // 25 hours of 10-minute buckets
            overtime_slots: 150,
            correlation_lookback: 1000,
            privacy_level: PrivacyLevel::ShowAll,
            debug_status: false,
            reload_interval_secs: 3600,
            reload_on_start: true,
            list_db_path: PathBuf::from("./var/data/lists.db"),
        }
    }
}

impl StoreConfig {
    pub fn from_json_str(json: &str) -> StoreResult<Self> {
        let config: StoreConfig = serde_json::from_str(json)
            .map_err(|e| StoreError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let text = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            StoreError::Config(format!(
                "Failed to read config {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_json_str(&text)
    }

    /// Config from the file named in `DATASTORE_CONFIG`, or defaults.
    pub fn load() -> StoreResult<Self> {
        match std::env::var(CONFIG_ENV) {
            Ok(path) if !path.is_empty() => Self::from_json_file(path),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> StoreResult<()> {
        let capacities = [
            ("max_queries", self.max_queries),
            ("max_domains", self.max_domains),
            ("max_clients", self.max_clients),
            ("max_upstreams", self.max_upstreams),
            ("max_cache_entries", self.max_cache_entries),
            ("overtime_slots", self.overtime_slots),
        ];
        for (name, value) in capacities {
            if value == 0 {
                return Err(StoreError::Config(format!("{} must be positive", name)));
            }
        }
        if self.max_string_bytes < 2 {
            return Err(StoreError::Config(
                "max_string_bytes must leave room for one string".to_string(),
            ));
        }
        if self.overtime_interval_secs == 0 {
            return Err(StoreError::Config(
                "overtime_interval_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
