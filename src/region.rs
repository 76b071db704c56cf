//! # Shared Region
//!
//! One coarse lock around the whole datastore. Readers share it; the single
//! writer role takes it exclusively for every find-or-create-plus-side-effects
//! sequence, so readers never observe a half-applied mutation.

use crate::datastore::{Datastore, ReloadStats};
use crate::error::StoreResult;
use crate::lists::ListStore;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct SharedRegion {
    inner: Arc<RwLock<Datastore>>,
}

impl SharedRegion {
    pub fn new(store: Datastore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    /// Shared read access. Held guards block writers.
    pub fn read(&self) -> RwLockReadGuard<'_, Datastore> {
        self.inner.read()
    }

    /// Exclusive access; released when the guard drops.
    pub fn acquire_exclusive(&self) -> RwLockWriteGuard<'_, Datastore> {
        self.inner.write()
    }

    /// Run `f` under the exclusive lock.
    pub fn with_exclusive<R>(&self, f: impl FnOnce(&mut Datastore) -> R) -> R {
        let mut guard = self.inner.write();
        f(&mut guard)
    }

    /// List reload and decision-cache reset under one exclusive hold.
    pub fn reload_all_domainlists(&self, lists: &dyn ListStore) -> StoreResult<ReloadStats> {
        self.inner.write().reload_all_domainlists(lists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::entities::NewQuery;
    use crate::status::QueryStatus;
    use std::thread;

    #[test]
    fn test_writer_and_readers() {
        let region = SharedRegion::new(Datastore::new(StoreConfig::default()).unwrap());

        let writer = {
            let region = region.clone();
            thread::spawn(move || {
                for id in 0..200 {
                    let mut store = region.acquire_exclusive();
                    let q = store
                        .add_query(NewQuery::new(id, "example.com", "10.0.0.1", 1))
                        .unwrap();
                    store.set_status(q, QueryStatus::Gravity, false);
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let region = region.clone();
                thread::spawn(move || {
                    for _ in 0..200 {
                        let store = region.read();
                        let counters = store.counters();
                        // Every recorded query is counted exactly once
                        assert_eq!(counters.total(), store.queries().live() as i64);
                        let buckets: i64 = store.overtime().buckets().iter().map(|b| b.total).sum();
                        assert_eq!(buckets, counters.total());
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(region.read().counters().blocked(), 200);
    }

    #[test]
    fn test_with_exclusive_returns_value() {
        let region = SharedRegion::new(Datastore::new(StoreConfig::default()).unwrap());
        let id = region.with_exclusive(|store| store.find_domain("example.com", true).unwrap());
        assert_eq!(region.read().domain_name(id), Some("example.com"));
    }
}
