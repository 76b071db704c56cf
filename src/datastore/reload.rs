//! Full list reload.
//!
//! Runs under the exclusive lock: the list database is reopened, its row
//! counts are mirrored into the counters, every memoised blocking decision
//! is dropped, and regex filters and list health are refreshed.

use super::Datastore;
use crate::counters::DatabaseCounts;
use crate::error::StoreResult;
use crate::lists::{ListStore, ListTable};
use log::{info, warn};
use serde::Serialize;

/// Outcome of one reload.
#[derive(Debug, Clone, Serialize)]
pub struct ReloadStats {
    pub database: DatabaseCounts,
    pub regex_filters: usize,
    pub inaccessible_lists: usize,
    pub cache_entries_reset: usize,
    pub duration_ms: u64,
    /// Clock time the reload finished
    pub timestamp: u64,
}

impl Datastore {
    /// Reload everything derived from the list database.
    ///
    /// If the database cannot be reopened nothing changes and the error is
    /// returned. A table that cannot be counted keeps its previous count.
    pub fn reload_all_domainlists(&mut self, lists: &dyn ListStore) -> StoreResult<ReloadStats> {
        let start = self.clock.now_ms();
        if let Err(e) = lists.reopen() {
            warn!("List reload skipped, database unavailable: {}", e);
            return Err(e);
        }

        let mut database = self.aggregator.counters().database;
        for table in ListTable::ALL {
            match lists.count(table) {
                Ok(n) => *database_field(&mut database, table) = n,
                Err(e) => warn!("Keeping previous count for {:?}: {}", table, e),
            }
        }
        self.aggregator.set_database_counts(database);

        let cache_entries_reset = self.reset_decision_cache();

        let regex_filters = lists.reload_regex().unwrap_or_else(|e| {
            warn!("Regex reload failed: {}", e);
            0
        });
        let inaccessible_lists = lists.check_inaccessible_lists().unwrap_or_else(|e| {
            warn!("Inaccessible list check failed: {}", e);
            0
        });

        let timestamp = self.clock.now_ms();
        let stats = ReloadStats {
            database,
            regex_filters,
            inaccessible_lists,
            cache_entries_reset,
            duration_ms: timestamp.saturating_sub(start),
            timestamp,
        };
        info!(
            "Lists reloaded: {} gravity domains, {} bulk lists, {} allowed, {} denied, {} regex filters, {} cache entries reset",
            database.gravity,
            database.bulklists,
            database.allowed_domains,
            database.denied_domains,
            regex_filters,
            cache_entries_reset
        );
        Ok(stats)
    }

    /// Forget every memoised blocking decision and mark every client for a
    /// group re-read. Returns how many cache entries were reset.
    pub fn reset_decision_cache(&mut self) -> usize {
        let mut reset = 0;
        for (_, entry) in self.cache.iter_mut() {
            entry.reset();
            reset += 1;
        }
        for (_, client) in self.clients.iter_mut() {
            client.found_group = false;
        }
        reset
    }
}

fn database_field(database: &mut DatabaseCounts, table: ListTable) -> &mut i64 {
    match table {
        ListTable::Gravity => &mut database.gravity,
        ListTable::Groups => &mut database.groups,
        ListTable::Clients => &mut database.clients,
        ListTable::Adlists => &mut database.lists,
        ListTable::Bulklists => &mut database.bulklists,
        ListTable::AllowedDomains => &mut database.allowed_domains,
        ListTable::DeniedDomains => &mut database.denied_domains,
    }
}
