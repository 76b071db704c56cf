//! Query status transitions.
//!
//! A transition moves the query between per-status counters and between the
//! blocked/cached/forwarded sub-counts of its OverTime bucket. When the
//! query's blocked-ness flips, the domain's and client's blocked counts
//! follow (the client's through alias propagation).

use super::{ClientDelta, Datastore};
use crate::entities::QueryId;
use crate::status::QueryStatus;
use crate::types::ReplyType;
use log::debug;

impl Datastore {
    /// Move `query` to `new_status`.
    ///
    /// `init` marks the first assignment, which counts the query without
    /// uncounting a previous status; it is only meaningful right after the
    /// query was recorded. A non-initial transition to the current status
    /// changes nothing. Returns `false` for an unknown query.
    pub fn set_status(&mut self, query: QueryId, new_status: QueryStatus, init: bool) -> bool {
        let debug_status = self.config.debug_status;
        let Some(q) = self.queries.get_mut(query) else {
            return false;
        };
        let old = q.status;

        if old == new_status && !init {
            if debug_status {
                debug!("Query {}: status unchanged: {} ({})", q.id, old, old.as_u8());
            }
            return true;
        }

        let bucket = self.aggregator.bucket_for(q.timestamp_ms);
        let previous = if init { None } else { Some(old) };
        self.aggregator.move_status(previous, new_status, bucket);
        q.status = new_status;

        if debug_status {
            match previous {
                Some(old) => debug!(
                    "Query {}: status changed: {} ({}) -> {} ({})",
                    q.id,
                    old,
                    old.as_u8(),
                    new_status,
                    new_status.as_u8()
                ),
                None => debug!(
                    "Query {}: status initialized: {} ({})",
                    q.id,
                    new_status,
                    new_status.as_u8()
                ),
            }
        }

        let (domain, client) = (q.domain, q.client);
        let was_blocked = previous.is_some_and(QueryStatus::is_blocked);
        let delta = match (was_blocked, new_status.is_blocked()) {
            (false, true) => 1,
            (true, false) => -1,
            _ => return true,
        };
        if let Some(d) = self.domains.get_mut(domain) {
            d.blocked += delta;
        }
        self.change_client_count(client, ClientDelta::blocked(delta));
        true
    }

    /// `set_status` for a raw status value, as received from outside the
    /// crate. Values outside the enumeration are rejected without effect.
    pub fn set_status_raw(&mut self, query: QueryId, raw: u8, init: bool) -> bool {
        match QueryStatus::from_u8(raw) {
            Some(status) => self.set_status(query, status, init),
            None => {
                debug!("Query {}: rejected invalid status {}", query, raw);
                false
            }
        }
    }

    /// Record the reply type sent for `query`.
    pub fn set_reply(&mut self, query: QueryId, reply: ReplyType) -> bool {
        let Some(q) = self.queries.get_mut(query) else {
            return false;
        };
        if q.reply != reply {
            self.aggregator.move_reply(Some(q.reply), reply);
            q.reply = reply;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use crate::entities::NewQuery;
    use crate::status::QueryStatus;
    use crate::types::ReplyType;

    #[test]
    fn test_status_moves_counters_and_bucket() {
        let (mut store, _) = store();
        let q = store.add_query(NewQuery::new(1, "example.com", "10.0.0.1", 1)).unwrap();
        let bucket = store.overtime().bucket_for(T0);

        assert_eq!(store.counters().status_count(QueryStatus::Unknown), 1);
        assert!(store.set_status(q, QueryStatus::Forwarded, false));
        assert_eq!(store.counters().status_count(QueryStatus::Unknown), 0);
        assert_eq!(store.counters().status_count(QueryStatus::Forwarded), 1);
        assert_eq!(store.overtime().get(bucket).unwrap().forwarded, 1);

        assert!(store.set_status(q, QueryStatus::Gravity, false));
        let slot = store.overtime().get(bucket).unwrap();
        assert_eq!((slot.total, slot.blocked, slot.forwarded), (1, 1, 0));
        assert_eq!(store.counters().total(), 1);
    }

    #[test]
    fn test_same_status_is_noop() {
        let (mut store, _) = store();
        let q = store
            .add_query(NewQuery::new(1, "example.com", "10.0.0.1", 1).with_status(QueryStatus::Cache))
            .unwrap();
        let before = store.counters().clone();
        assert!(store.set_status(q, QueryStatus::Cache, false));
        assert_eq!(store.counters(), &before);
    }

    #[test]
    fn test_invalid_raw_status_rejected() {
        let (mut store, _) = store();
        let q = store.add_query(NewQuery::new(1, "example.com", "10.0.0.1", 1)).unwrap();
        let before = store.counters().clone();
        assert!(!store.set_status_raw(q, 18, false));
        assert!(!store.set_status_raw(q, 255, false));
        assert_eq!(store.counters(), &before);
        assert_eq!(store.queries().get(q).unwrap().status, QueryStatus::Unknown);

        assert!(store.set_status_raw(q, 3, false));
        assert_eq!(store.queries().get(q).unwrap().status, QueryStatus::Cache);
    }

    #[test]
    fn test_blocked_flip_updates_domain_and_client() {
        let (mut store, _) = store();
        let q = store.add_query(NewQuery::new(1, "ads.example", "10.0.0.1", 1)).unwrap();
        let (domain, client) = {
            let query = store.queries().get(q).unwrap();
            (query.domain, query.client)
        };

        store.set_status(q, QueryStatus::Gravity, false);
        // blocked -> blocked does not count twice
        store.set_status(q, QueryStatus::GravityCname, false);
        assert_eq!(store.domains().get(domain).unwrap().blocked, 1);
        assert_eq!(store.clients().get(client).unwrap().blocked, 1);

        store.set_status(q, QueryStatus::Retried, false);
        assert_eq!(store.domains().get(domain).unwrap().blocked, 0);
        assert_eq!(store.clients().get(client).unwrap().blocked, 0);
    }

    #[test]
    fn test_set_reply_moves_reply_counter() {
        let (mut store, _) = store();
        let q = store.add_query(NewQuery::new(1, "example.com", "10.0.0.1", 1)).unwrap();
        assert_eq!(store.counters().replies[ReplyType::Unknown.index()], 1);
        assert!(store.set_reply(q, ReplyType::Ip));
        assert!(store.set_reply(q, ReplyType::Ip));
        assert_eq!(store.counters().replies[ReplyType::Unknown.index()], 0);
        assert_eq!(store.counters().replies[ReplyType::Ip.index()], 1);
    }
}
