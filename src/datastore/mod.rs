//! # Datastore
//!
//! Owns every entity table, the string pool and the aggregator. All mutation
//! goes through `&mut Datastore`, which the `SharedRegion` hands out only
//! under its exclusive lock; readers share `&Datastore`.
//!
//! The impl is split by concern:
//! - `lookup`: find-or-create for domains, clients, upstreams, cache entries
//! - `query`: recording, correlating and retiring queries
//! - `status`: the query status state machine
//! - `alias`: client count deltas and alias-client propagation
//! - `privacy`: redacting accessors for reporting
//! - `reload`: list database reload

pub mod alias;
pub mod lookup;
pub mod privacy;
pub mod query;
pub mod reload;
pub mod status;

pub use alias::{AliasDirectory, AliasMap, ClientDelta};
pub use privacy::{HIDDEN_CLIENT, HIDDEN_DOMAIN};
pub use reload::ReloadStats;

use crate::clock::{Clock, SystemClock};
use crate::config::StoreConfig;
use crate::counters::overtime::fold_shift;
use crate::counters::{Aggregator, Counters, DatabaseCounts, OverTime};
use crate::entities::{CacheEntry, Client, ClientId, Domain, DomainId, Query, Upstream};
use crate::error::StoreResult;
use crate::events::{EventRaiser, NullEvents};
use crate::strings::StringPool;
use crate::table::{EntityTable, TableStats};
use crate::types::PrivacyLevel;
use log::debug;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

pub struct Datastore {
    config: StoreConfig,
    strings: StringPool,
    domains: EntityTable<Domain>,
    clients: EntityTable<Client>,
    upstreams: EntityTable<Upstream>,
    cache: EntityTable<CacheEntry>,
    queries: EntityTable<Query>,
    aggregator: Aggregator,
    events: Arc<dyn EventRaiser>,
    aliases: Option<Arc<dyn AliasDirectory>>,
    clock: Arc<dyn Clock>,
    /// Privacy level stamped on queries recorded from now on
    privacy_level: PrivacyLevel,
    /// History is being replayed; list-dependent work is deferred
    startup: bool,
}

impl std::fmt::Debug for Datastore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Datastore")
            .field("queries", &self.queries.live())
            .field("domains", &self.domains.live())
            .field("clients", &self.clients.live())
            .field("upstreams", &self.upstreams.live())
            .field("cache", &self.cache.live())
            .field("string_bytes", &self.strings.used_bytes())
            .finish()
    }
}

impl Datastore {
    /// Empty datastore using the system clock and discarding events.
    pub fn new(config: StoreConfig) -> StoreResult<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: StoreConfig, clock: Arc<dyn Clock>) -> StoreResult<Self> {
        config.validate()?;
        let overtime = OverTime::new(
            config.overtime_interval_secs,
            config.overtime_slots,
            clock.now_ms(),
        );
        Ok(Self {
            strings: StringPool::with_capacity(config.max_string_bytes),
            domains: EntityTable::new("domains", config.max_domains),
            clients: EntityTable::new("clients", config.max_clients),
            upstreams: EntityTable::new("upstreams", config.max_upstreams),
            cache: EntityTable::new("cache", config.max_cache_entries),
            queries: EntityTable::new("queries", config.max_queries),
            aggregator: Aggregator::new(overtime),
            events: Arc::new(NullEvents),
            aliases: None,
            clock,
            privacy_level: config.privacy_level,
            startup: false,
            config,
        })
    }

    pub fn with_events(mut self, events: Arc<dyn EventRaiser>) -> Self {
        self.events = events;
        self
    }

    pub fn with_alias_directory(mut self, aliases: Arc<dyn AliasDirectory>) -> Self {
        self.aliases = Some(aliases);
        self
    }

    // ============================================================================================
    // ACCESSORS
    // ============================================================================================

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn strings(&self) -> &StringPool {
        &self.strings
    }

    pub fn domains(&self) -> &EntityTable<Domain> {
        &self.domains
    }

    pub fn clients(&self) -> &EntityTable<Client> {
        &self.clients
    }

    pub fn upstreams(&self) -> &EntityTable<Upstream> {
        &self.upstreams
    }

    pub fn cache(&self) -> &EntityTable<CacheEntry> {
        &self.cache
    }

    pub fn queries(&self) -> &EntityTable<Query> {
        &self.queries
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    pub fn counters(&self) -> &Counters {
        self.aggregator.counters()
    }

    pub fn overtime(&self) -> &OverTime {
        self.aggregator.overtime()
    }

    pub fn privacy_level(&self) -> PrivacyLevel {
        self.privacy_level
    }

    /// Change the level for queries recorded from now on. Existing queries
    /// keep the level they were recorded with.
    pub fn set_privacy_level(&mut self, level: PrivacyLevel) {
        self.privacy_level = level;
    }

    pub fn is_startup(&self) -> bool {
        self.startup
    }

    /// While set, new clients do not request a regex reload; the reload at
    /// the end of start-up covers them.
    pub fn set_startup(&mut self, startup: bool) {
        self.startup = startup;
    }

    /// Unredacted domain name, for internal consumers.
    pub fn domain_name(&self, domain: DomainId) -> Option<&str> {
        self.domains.get(domain).map(|d| self.strings.resolve(d.name))
    }

    /// Unredacted client IP, for internal consumers.
    pub fn client_ip(&self, client: ClientId) -> Option<&str> {
        self.clients.get(client).map(|c| self.strings.resolve(c.ip))
    }

    // ============================================================================================
    // OVERTIME WINDOW
    // ============================================================================================

    /// Move the OverTime window forward so its newest bucket contains
    /// `now_ms`, shifting every client's per-bucket counts along with the
    /// global histogram. Returns how many buckets the window moved.
    pub fn advance_overtime(&mut self, now_ms: u64) -> usize {
        let shift = self.aggregator.advance_window(now_ms);
        if shift == 0 {
            return 0;
        }
        for (_, client) in self.clients.iter_mut() {
            fold_shift(&mut client.overtime, shift, |into, from| *into += *from);
        }
        debug!("OverTime window moved forward by {} bucket(s)", shift);
        shift
    }

    // ============================================================================================
    // STATISTICS
    // ============================================================================================

    pub fn table_stats(&self) -> Vec<TableStats> {
        vec![
            self.queries.stats(),
            self.domains.stats(),
            self.clients.stats(),
            self.upstreams.stats(),
            self.cache.stats(),
        ]
    }

    pub fn summary(&self) -> StoreSummary {
        let counters = self.aggregator.counters();
        let total = counters.total();
        let blocked = counters.blocked();
        let percent_blocked = if total == 0 {
            0.0
        } else {
            blocked as f64 * 100.0 / total as f64
        };
        let status = counters
            .status
            .iter()
            .enumerate()
            .filter_map(|(idx, n)| {
                crate::status::QueryStatus::ALL
                    .get(idx)
                    .map(|s| (s.as_str(), *n))
            })
            .collect();

        StoreSummary {
            total_queries: total,
            blocked,
            cached: counters.cached(),
            forwarded: counters.forwarded(),
            percent_blocked,
            unique_domains: self.domains.live(),
            unique_clients: self.clients.iter().filter(|(_, c)| !c.is_alias).count(),
            upstreams: self.upstreams.live(),
            cache_entries: self.cache.live(),
            status,
            database: counters.database,
            string_bytes: self.strings.used_bytes(),
        }
    }
}

/// Point-in-time report of the datastore's aggregates.
#[derive(Debug, Clone, Serialize)]
pub struct StoreSummary {
    pub total_queries: i64,
    pub blocked: i64,
    pub cached: i64,
    pub forwarded: i64,
    pub percent_blocked: f64,
    pub unique_domains: usize,
    pub unique_clients: usize,
    pub upstreams: usize,
    pub cache_entries: usize,
    pub status: BTreeMap<&'static str, i64>,
    pub database: DatabaseCounts,
    pub string_bytes: usize,
}

impl StoreSummary {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::clock::ManualClock;

    pub(crate) const T0: u64 = 1_700_000_000_000;

    pub(crate) fn small_config() -> StoreConfig {
        StoreConfig {
            max_queries: 64,
            max_domains: 16,
            max_clients: 8,
            max_upstreams: 4,
            max_cache_entries: 16,
            max_string_bytes: 4096,
            overtime_slots: 6,
            correlation_lookback: 8,
            ..StoreConfig::default()
        }
    }

    pub(crate) fn store() -> (Datastore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(T0));
        let store = Datastore::with_clock(small_config(), clock.clone()).unwrap();
        (store, clock)
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::entities::NewQuery;
    use crate::status::QueryStatus;

    #[test]
    fn test_new_store_is_empty() {
        let (store, _) = store();
        let summary = store.summary();
        assert_eq!(summary.total_queries, 0);
        assert_eq!(summary.percent_blocked, 0.0);
        assert_eq!(summary.unique_domains, 0);
        assert_eq!(store.overtime().len(), 6);
        assert_eq!(store.table_stats().len(), 5);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = StoreConfig {
            max_domains: 0,
            ..StoreConfig::default()
        };
        assert!(Datastore::new(config).is_err());
    }

    #[test]
    fn test_summary_json() {
        let (mut store, _) = store();
        let q = store.add_query(NewQuery::new(1, "ads.example", "10.0.0.1", 1)).unwrap();
        store.set_status(q, QueryStatus::Gravity, false);
        store.add_query(NewQuery::new(2, "example.com", "10.0.0.1", 1).with_status(QueryStatus::Forwarded))
            .unwrap();

        let summary = store.summary();
        assert_eq!(summary.total_queries, 2);
        assert_eq!(summary.blocked, 1);
        assert_eq!(summary.forwarded, 1);
        assert_eq!(summary.percent_blocked, 50.0);
        assert_eq!(summary.unique_clients, 1);
        assert_eq!(summary.status["GRAVITY"], 1);

        let json = summary.to_json();
        assert!(json.contains("\"total_queries\":2"));
        assert!(json.contains("\"blocked\":1"));
    }
}
