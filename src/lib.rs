//! # Resolver Datastore
//!
//! In-memory telemetry store of a DNS-filtering resolver: fixed-capacity
//! entity tables for queries, domains, clients, upstreams and the decision
//! cache, a string pool they share, and the aggregate counters and OverTime
//! histogram kept consistent with them.
//!
//! ## Layout
//! - `table`: generic slot arena with generation-checked handles
//! - `entities`: the record types stored in the tables
//! - `counters`: global counters, OverTime buckets and their single writer
//! - `status`: query status enumeration and its classification predicates
//! - `datastore`: the store itself, all mutations go through it
//! - `region`: the lock readers and the writer share
//! - `lists`, `refresh`: list database access and reloads

pub mod clock;
pub mod config;
pub mod counters;
pub mod datastore;
pub mod entities;
pub mod error;
pub mod events;
pub mod lists;
pub mod options;
pub mod refresh;
pub mod region;
pub mod status;
pub mod strings;
pub mod table;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::StoreConfig;
pub use counters::{Aggregator, Bucket, Counters, DatabaseCounts, OverTime};
pub use datastore::{
    AliasDirectory, AliasMap, ClientDelta, Datastore, ReloadStats, StoreSummary, HIDDEN_CLIENT,
    HIDDEN_DOMAIN,
};
pub use entities::{
    CacheEntry, CacheId, Client, ClientId, Domain, DomainId, HwAddr, NewQuery, Query, QueryId,
    Upstream, UpstreamId,
};
pub use error::{StoreError, StoreResult};
pub use events::{ChannelEvents, EventLog, EventRaiser, NullEvents, StoreEvent};
pub use lists::{ListStore, ListTable, SqliteListStore};
pub use refresh::{RefreshScheduler, RefreshService, SchedulerConfig};
pub use region::SharedRegion;
pub use status::QueryStatus;
pub use strings::{StrPos, StringPool};
pub use table::{EntityTable, Handle, TableStats};
pub use types::{CacheDecision, DnssecStatus, PrivacyLevel, QueryType, ReplyType};
