//! The single writer of aggregate state.
//!
//! Status moves update the per-status counter and the blocked/cached/
//! forwarded sub-counts of the query's own bucket in one call, using the
//! predicates from `status.rs`, so the global counters and the histogram
//! cannot disagree about what a status means.

use super::{Counters, DatabaseCounts, OverTime};
use crate::status::QueryStatus;
use crate::types::{QueryType, ReplyType};

#[derive(Debug, Clone)]
pub struct Aggregator {
    counters: Counters,
    overtime: OverTime,
}

impl Aggregator {
    pub fn new(overtime: OverTime) -> Self {
        Self {
            counters: Counters::default(),
            overtime,
        }
    }

    // ============================================================================================
    // READ
    // ============================================================================================

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    pub fn overtime(&self) -> &OverTime {
        &self.overtime
    }

    pub fn bucket_for(&self, timestamp_ms: u64) -> usize {
        self.overtime.bucket_for(timestamp_ms)
    }

    pub fn blocked_count(&self) -> i64 {
        self.counters.blocked()
    }

    pub fn cached_count(&self) -> i64 {
        self.counters.cached()
    }

    pub fn forwarded_count(&self) -> i64 {
        self.counters.forwarded()
    }

    // ============================================================================================
    // WRITE
    // ============================================================================================

    /// Move one query from `old` to `new` in `bucket`. `old == None` means
    /// the query is being counted for the first time.
    pub fn move_status(&mut self, old: Option<QueryStatus>, new: QueryStatus, bucket: usize) {
        if let Some(old) = old {
            self.adjust_status(old, bucket, -1);
        }
        self.adjust_status(new, bucket, 1);
    }

    /// Stop counting a query that held `status`.
    pub fn remove_status(&mut self, status: QueryStatus, bucket: usize) {
        self.adjust_status(status, bucket, -1);
    }

    fn adjust_status(&mut self, status: QueryStatus, bucket: usize, delta: i64) {
        self.counters.status[status.index()] += delta;
        if let Some(slot) = self.overtime.get_mut(bucket) {
            if status.is_blocked() {
                slot.blocked += delta;
            }
            if status.is_cached() {
                slot.cached += delta;
            }
            if status.is_forwarded() {
                slot.forwarded += delta;
            }
        }
    }

    /// Change a bucket's query total. Out-of-range buckets are ignored.
    pub fn add_overtime_total(&mut self, bucket: usize, delta: i64) {
        if let Some(slot) = self.overtime.get_mut(bucket) {
            slot.total += delta;
        }
    }

    pub fn add_query_type(&mut self, query_type: QueryType, delta: i64) {
        self.counters.query_types[query_type.index()] += delta;
    }

    pub fn move_reply(&mut self, old: Option<ReplyType>, new: ReplyType) {
        if let Some(old) = old {
            self.counters.replies[old.index()] -= 1;
        }
        self.counters.replies[new.index()] += 1;
    }

    pub fn remove_reply(&mut self, reply: ReplyType) {
        self.counters.replies[reply.index()] -= 1;
    }

    /// Move the OverTime window so its newest bucket contains `now_ms`.
    /// Returns how many buckets it moved; per-client vectors must be shifted
    /// by the same amount.
    pub fn advance_window(&mut self, now_ms: u64) -> usize {
        let shift = self.overtime.shift_for(now_ms);
        self.overtime.advance(shift);
        shift
    }

    pub fn set_database_counts(&mut self, counts: DatabaseCounts) {
        self.counters.database = counts;
    }
}
