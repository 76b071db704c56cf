//! Scheduled list reload - background task that reloads the list database on
//! a fixed interval.
//!
//! The list database changes underneath the resolver (list updates, group
//! edits). Between explicit reload requests the scheduler makes sure the
//! mirrored counts and the decision cache never drift for longer than one
//! interval.

use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};

use super::RefreshService;
use crate::clock::now_ms;
use crate::config::StoreConfig;
use log::{error, info};

/// Configuration for the scheduled reload.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Interval between reloads
    pub refresh_interval: Duration,
    /// Whether the scheduler runs at all
    pub enabled: bool,
    /// Reload once immediately instead of waiting a full interval
    pub run_immediately: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(60 * 60),
            enabled: true,
            run_immediately: true,
        }
    }
}

impl From<&StoreConfig> for SchedulerConfig {
    fn from(config: &StoreConfig) -> Self {
        Self {
            refresh_interval: Duration::from_secs(config.reload_interval_secs),
            enabled: config.reload_interval_secs > 0,
            run_immediately: config.reload_on_start,
        }
    }
}

/// Periodic list reload.
///
/// Spawned once at start-up; runs until the runtime shuts down.
pub struct RefreshScheduler {
    /// Service performing each reload
    service: RefreshService,
    /// Scheduler configuration
    config: SchedulerConfig,
    /// Timestamp of the last successful reload, 0 before the first one
    last_refresh_at: Arc<RwLock<u64>>,
}

impl RefreshScheduler {
    /// Creates a new list reload scheduler.
    ///
    /// # Arguments
    /// - `service`: reload service bound to the shared region and the list store
    /// - `config`: interval, enabled state and whether to reload right away
    ///
    /// # Returns
    /// A scheduler whose `last_refresh()` is 0 until the first reload succeeds.
    ///
    /// # Example
    /// ```rust,no_run
    /// use std::sync::Arc;
    /// use std::time::Duration;
    /// use datastore::{
    ///     Datastore, RefreshScheduler, RefreshService, SchedulerConfig, SharedRegion,
    ///     SqliteListStore, StoreConfig,
    /// };
    ///
    /// let region = SharedRegion::new(Datastore::new(StoreConfig::default())?);
    /// let lists = Arc::new(SqliteListStore::open("/etc/resolver/lists.db")?);
    /// let config = SchedulerConfig {
    ///     refresh_interval: Duration::from_secs(6 * 60 * 60),
    ///     enabled: true,
    ///     run_immediately: false,
    /// };
    /// let scheduler = RefreshScheduler::new(RefreshService::new(region, lists), config);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn new(service: RefreshService, config: SchedulerConfig) -> Self {
        Self {
            service,
            config,
            last_refresh_at: Arc::new(RwLock::new(0)),
        }
    }

    /// Returns the time of the last successful reload.
    ///
    /// # Returns
    /// Milliseconds since UNIX epoch, or 0 if no reload has succeeded yet.
    pub fn last_refresh(&self) -> u64 {
        *self.last_refresh_at.read()
    }

    /// Starts the reload loop.
    ///
    /// Runs indefinitely and should be spawned as a tokio task. Returns
    /// immediately when the scheduler is disabled. Otherwise it will:
    /// 1. Reload at once, or wait one interval if `run_immediately` is off
    /// 2. Run `do_refresh()` on every tick
    /// 3. Delay the next tick after a reload that overran the interval
    ///
    /// # Example
    /// ```rust,no_run
    /// # use std::sync::Arc;
    /// # use datastore::refresh::{RefreshScheduler, RefreshService, SchedulerConfig};
    /// # fn spawn(service: RefreshService) {
    /// let scheduler = Arc::new(RefreshScheduler::new(service, SchedulerConfig::default()));
    /// tokio::spawn(scheduler.clone().start());
    /// # }
    /// ```
    pub async fn start(self: Arc<Self>) {
        if !self.config.enabled {
            info!("Scheduled list reload is disabled, skipping");
            return;
        }

        info!(
            "Starting scheduled list reload with {}-second interval",
            self.config.refresh_interval.as_secs()
        );

        let mut ticker = interval(self.config.refresh_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        if !self.config.run_immediately {
            // The first tick of an interval completes immediately
            ticker.tick().await;
        }

        loop {
            ticker.tick().await;
            self.do_refresh().await;
        }
    }

    /// Executes one reload cycle.
    ///
    /// Failures are logged and do not stop the scheduler. On success the
    /// reload time is recorded for `last_refresh()`.
    pub async fn do_refresh(&self) {
        match self.service.refresh_lists().await {
            Ok(stats) => {
                info!(
                    "Scheduled list reload completed: {} gravity domains, {} cache entries reset in {}ms",
                    stats.database.gravity, stats.cache_entries_reset, stats.duration_ms
                );
                *self.last_refresh_at.write() = now_ms();
            }
            Err(e) => {
                error!("Scheduled list reload failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datastore::Datastore;
    use crate::lists::sqlite::fixtures::create_list_db;
    use crate::lists::SqliteListStore;
    use crate::region::SharedRegion;

    #[test]
    fn test_scheduler_config_defaults() {
        let config = SchedulerConfig::default();
        assert!(config.enabled);
        assert_eq!(config.refresh_interval.as_secs(), 3600);
    }

    #[test]
    fn test_scheduler_config_from_store_config() {
        let store_config = StoreConfig {
            reload_interval_secs: 0,
            reload_on_start: false,
            ..StoreConfig::default()
        };
        let config = SchedulerConfig::from(&store_config);
        assert!(!config.enabled);
        assert!(!config.run_immediately);
    }

    #[tokio::test]
    async fn test_do_refresh_records_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lists.db");
        create_list_db(&path);
        let lists = Arc::new(SqliteListStore::open(&path).unwrap());
        let region = SharedRegion::new(Datastore::new(StoreConfig::default()).unwrap());

        let scheduler = RefreshScheduler::new(
            RefreshService::new(region.clone(), lists),
            SchedulerConfig::default(),
        );
        assert_eq!(scheduler.last_refresh(), 0);
        scheduler.do_refresh().await;
        assert!(scheduler.last_refresh() > 0);
        assert_eq!(region.read().counters().database.gravity, 3);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lists.db");
        create_list_db(&path);
        let lists = Arc::new(SqliteListStore::open(&path).unwrap());
        std::fs::remove_file(&path).unwrap();
        let region = SharedRegion::new(Datastore::new(StoreConfig::default()).unwrap());

        let scheduler = RefreshScheduler::new(
            RefreshService::new(region, lists),
            SchedulerConfig::default(),
        );
        scheduler.do_refresh().await;
        assert_eq!(scheduler.last_refresh(), 0);
    }
}
