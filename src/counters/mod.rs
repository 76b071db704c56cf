//! # Counters & OverTime
//!
//! Running totals kept alongside the entity tables. The `Aggregator` owns all
//! of them and is the only code that writes them; everything else sends it
//! deltas.

pub mod aggregator;
pub mod overtime;

pub use aggregator::Aggregator;
pub use overtime::{Bucket, OverTime};

use crate::status::QueryStatus;
use crate::types::{QueryType, ReplyType};
use serde::Serialize;

/// Row counts mirrored from the list database after each reload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DatabaseCounts {
    pub gravity: i64,
    pub groups: i64,
    pub clients: i64,
    pub lists: i64,
    pub bulklists: i64,
    pub allowed_domains: i64,
    pub denied_domains: i64,
}

/// Global per-status, per-type and per-reply totals.
#[derive(Debug, Clone, PartialEq)]
pub struct Counters {
    pub status: [i64; QueryStatus::COUNT],
    pub query_types: [i64; QueryType::COUNT],
    pub replies: [i64; ReplyType::COUNT],
    pub database: DatabaseCounts,
}

impl Default for Counters {
    fn default() -> Self {
        Self {
            status: [0; QueryStatus::COUNT],
            query_types: [0; QueryType::COUNT],
            replies: [0; ReplyType::COUNT],
            database: DatabaseCounts::default(),
        }
    }
}

impl Counters {
    pub fn status_count(&self, status: QueryStatus) -> i64 {
        self.status[status.index()]
    }

    /// Queries with any status, i.e. every recorded query.
    pub fn total(&self) -> i64 {
        self.status.iter().sum()
    }

    fn sum_where(&self, pred: fn(QueryStatus) -> bool) -> i64 {
        QueryStatus::ALL
            .iter()
            .filter(|s| pred(**s))
            .map(|s| self.status[s.index()])
            .sum()
    }

    pub fn blocked(&self) -> i64 {
        self.sum_where(QueryStatus::is_blocked)
    }

    pub fn cached(&self) -> i64 {
        self.sum_where(QueryStatus::is_cached)
    }

    pub fn forwarded(&self) -> i64 {
        self.sum_where(QueryStatus::is_forwarded)
    }
}
