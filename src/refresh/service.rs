//! On-demand list reload.
//!
//! Wraps a `SharedRegion` and a `ListStore` so a reload can be requested
//! from anywhere (a signal handler, an API call) without knowing either.

use crate::datastore::ReloadStats;
use crate::error::{StoreError, StoreResult};
use crate::lists::ListStore;
use crate::region::SharedRegion;
use log::info;
use std::sync::Arc;

/// List reload service.
#[derive(Clone)]
pub struct RefreshService {
    /// Region whose datastore is reloaded
    region: SharedRegion,
    /// Source of the list database counts
    lists: Arc<dyn ListStore>,
}

impl RefreshService {
    /// Create a new list reload service.
    ///
    /// # Arguments
    /// - `region`: shared region holding the datastore to reload
    /// - `lists`: list store the counts and regex filters are read from
    ///
    /// # Example
    /// ```rust,no_run
    /// use std::sync::Arc;
    /// use datastore::{Datastore, RefreshService, SharedRegion, SqliteListStore, StoreConfig};
    ///
    /// let region = SharedRegion::new(Datastore::new(StoreConfig::default())?);
    /// let lists = Arc::new(SqliteListStore::open("/etc/resolver/lists.db")?);
    /// let service = RefreshService::new(region.clone(), lists);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn new(region: SharedRegion, lists: Arc<dyn ListStore>) -> Self {
        Self { region, lists }
    }

    pub fn region(&self) -> &SharedRegion {
        &self.region
    }

    /// Reload the lists now.
    ///
    /// The reload itself is synchronous and holds the exclusive lock; it runs
    /// on the blocking pool so the async runtime keeps serving other tasks.
    ///
    /// # Returns
    /// Stats about the reload, or the list store error that aborted it.
    /// A panicked reload task is reported as `StoreError::ListStore`.
    pub async fn refresh_lists(&self) -> StoreResult<ReloadStats> {
        let region = self.region.clone();
        let lists = self.lists.clone();
        let stats = tokio::task::spawn_blocking(move || {
            region.reload_all_domainlists(lists.as_ref())
        })
        .await
        .map_err(|e| {
            StoreError::ListStore(format!("Reload task failed: {}", e))
        })??;

        info!(
            "List refresh finished in {}ms ({} regex filters)",
            stats.duration_ms, stats.regex_filters
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::datastore::Datastore;
    use crate::lists::sqlite::fixtures::create_list_db;
    use crate::lists::SqliteListStore;

    #[tokio::test]
    async fn test_refresh_lists_updates_counts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lists.db");
        create_list_db(&path);
        let lists = Arc::new(SqliteListStore::open(&path).unwrap());

        let region = SharedRegion::new(Datastore::new(StoreConfig::default()).unwrap());
        let service = RefreshService::new(region.clone(), lists);

        let stats = service.refresh_lists().await.unwrap();
        assert_eq!(stats.database.gravity, 3);
        assert_eq!(region.read().counters().database.denied_domains, 4);
    }
}
