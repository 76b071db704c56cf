//! Fixed-width time buckets over the retained history window.
//!
//! The window only moves forward. Buckets that fall out of it are folded
//! into the new first bucket, which is where timestamps before the window
//! are clipped to, so a bucket's count keeps matching the queries whose
//! timestamps select it.

use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Bucket {
    /// Start of the bucket, seconds since epoch
    pub timestamp: u64,
    pub total: i64,
    pub blocked: i64,
    pub cached: i64,
    pub forwarded: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverTime {
    interval_secs: u64,
    first_bucket_secs: u64,
    buckets: Vec<Bucket>,
}

impl OverTime {
    /// Window of `slots` buckets whose newest bucket contains `now_ms`.
    pub fn new(interval_secs: u64, slots: usize, now_ms: u64) -> Self {
        let interval_secs = interval_secs.max(1);
        let slots = slots.max(1);
        let newest = floor_to(now_ms / 1000, interval_secs);
        let first_bucket_secs = newest.saturating_sub((slots as u64 - 1) * interval_secs);
        let buckets = (0..slots)
            .map(|i| Bucket {
                timestamp: first_bucket_secs + i as u64 * interval_secs,
                ..Bucket::default()
            })
            .collect();
        Self {
            interval_secs,
            first_bucket_secs,
            buckets,
        }
    }

    /// Bucket index for a timestamp. Times before the window land in the
    /// first bucket, times after it in the last.
    pub fn bucket_for(&self, timestamp_ms: u64) -> usize {
        let floored = floor_to(timestamp_ms / 1000, self.interval_secs);
        if floored <= self.first_bucket_secs {
            return 0;
        }
        let idx = ((floored - self.first_bucket_secs) / self.interval_secs) as usize;
        idx.min(self.buckets.len() - 1)
    }

    /// How many buckets the window has to move for its newest bucket to
    /// contain `now_ms`. Zero when it already does.
    pub fn shift_for(&self, now_ms: u64) -> usize {
        let newest = floor_to(now_ms / 1000, self.interval_secs);
        let last = self.first_bucket_secs + (self.buckets.len() as u64 - 1) * self.interval_secs;
        if newest <= last {
            return 0;
        }
        usize::try_from((newest - last) / self.interval_secs).unwrap_or(usize::MAX)
    }

    /// Move the window forward by `shift` buckets.
    pub(crate) fn advance(&mut self, shift: usize) {
        if shift == 0 {
            return;
        }
        fold_shift(&mut self.buckets, shift, |into, from| {
            into.total += from.total;
            into.blocked += from.blocked;
            into.cached += from.cached;
            into.forwarded += from.forwarded;
        });
        let moved = (shift as u64).saturating_mul(self.interval_secs);
        self.first_bucket_secs = self.first_bucket_secs.saturating_add(moved);
        for (i, bucket) in self.buckets.iter_mut().enumerate() {
            bucket.timestamp = self.first_bucket_secs + i as u64 * self.interval_secs;
        }
    }

    pub fn interval_secs(&self) -> u64 {
        self.interval_secs
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    pub fn get(&self, idx: usize) -> Option<&Bucket> {
        self.buckets.get(idx)
    }

    pub(crate) fn get_mut(&mut self, idx: usize) -> Option<&mut Bucket> {
        self.buckets.get_mut(idx)
    }
}

/// Drop the first `shift` entries of a per-bucket vector, folding them into
/// what becomes the first entry, and pad the end with empty entries.
pub(crate) fn fold_shift<T, F>(items: &mut Vec<T>, shift: usize, merge: F)
where
    T: Default,
    F: Fn(&mut T, &T),
{
    let len = items.len();
    if shift == 0 || len == 0 {
        return;
    }
    let keep = shift.min(len - 1);
    let mut head = T::default();
    for item in &items[..=keep] {
        merge(&mut head, item);
    }
    items.drain(..keep);
    items[0] = head;
    items.resize_with(len, T::default);
}

fn floor_to(secs: u64, interval: u64) -> u64 {
    secs - secs % interval
}
