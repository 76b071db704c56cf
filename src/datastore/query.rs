//! Recording, correlating and retiring queries, and retiring the records
//! they point at.

use super::{ClientDelta, Datastore};
use crate::entities::{
    CacheId, ClientId, DomainId, NewQuery, Query, QueryId, UpstreamId,
};
use crate::error::{StoreError, StoreResult};
use crate::types::{DnssecStatus, QueryType, ReplyType};
use log::{debug, error};

impl Datastore {
    // ============================================================================================
    // RECORD
    // ============================================================================================

    /// Record a new query.
    ///
    /// The domain and client are found or created, the query is stored, and
    /// only then are the domain and client counted, the query counted in its
    /// OverTime bucket (globally and for the client) and in its query type,
    /// and its initial status applied. A refused query therefore leaves
    /// every count as it was. The query carries the privacy level in force
    /// right now.
    pub fn add_query(&mut self, new: NewQuery<'_>) -> StoreResult<QueryId> {
        if !self.queries.can_push() {
            error!(
                "Table {} is full ({} slots)",
                self.queries.name(),
                self.queries.capacity()
            );
            return Err(StoreError::ResourceExhausted {
                what: self.queries.name(),
                capacity: self.queries.capacity(),
            });
        }

        let timestamp_ms = new.timestamp_ms.unwrap_or_else(|| self.clock.now_ms());
        let query_type = QueryType::from_rr_type(new.rr_type);
        let (client, new_client) = self.find_or_create_client(new.client_ip)?;
        let (domain, new_domain) = self.find_or_create_domain(new.domain)?;

        let id = self.queries.push(Query {
            id: new.id,
            timestamp_ms,
            domain,
            client,
            upstream: None,
            cache: None,
            status: new.status,
            cname_domain: None,
            query_type,
            rr_type: new.rr_type,
            reply: ReplyType::Unknown,
            dnssec: DnssecStatus::Unknown,
            response_ms: None,
            privacy: self.privacy_level,
        })?;

        self.advance_overtime(timestamp_ms);
        self.count_domain(domain, new_domain);
        let bucket = self.aggregator.bucket_for(timestamp_ms);
        self.aggregator.add_overtime_total(bucket, 1);
        self.aggregator.add_query_type(query_type, 1);
        self.aggregator.move_reply(None, ReplyType::Unknown);
        self.change_client_count(
            client,
            ClientDelta {
                total: 1,
                blocked: 0,
                overtime: Some((bucket, 1)),
            },
        );
        if let Some(c) = self.clients.get_mut(client) {
            c.last_query_ms = timestamp_ms;
            if new_client {
                c.arp_count = 1;
            }
        }
        self.set_status(id, new.status, true);
        Ok(id)
    }

    /// Most recent query with correlation id `id`, looking back no further
    /// than `correlation_lookback` queries.
    pub fn find_query(&self, id: i32) -> Option<QueryId> {
        self.queries
            .rfind_within(self.config.correlation_lookback, |q| q.id == id)
    }

    // ============================================================================================
    // ANSWER DETAILS
    // ============================================================================================

    pub fn set_query_upstream(&mut self, query: QueryId, upstream: UpstreamId) -> bool {
        let now = self.clock.now_ms();
        if !self.upstreams.contains(upstream) {
            return false;
        }
        match self.queries.get_mut(query) {
            Some(q) => {
                q.upstream = Some(upstream);
                if let Some(u) = self.upstreams.get_mut(upstream) {
                    u.last_query_ms = now;
                }
                true
            }
            None => false,
        }
    }

    pub fn set_query_cache(&mut self, query: QueryId, cache: CacheId) -> bool {
        if !self.cache.contains(cache) {
            return false;
        }
        match self.queries.get_mut(query) {
            Some(q) => {
                q.cache = Some(cache);
                true
            }
            None => false,
        }
    }

    /// Remember the CNAME target on which `query` was blocked.
    pub fn set_query_cname(&mut self, query: QueryId, target: &str) -> StoreResult<bool> {
        if !self.queries.contains(query) {
            return Ok(false);
        }
        let domain = self.find_domain(target, false)?;
        if let Some(q) = self.queries.get_mut(query) {
            q.cname_domain = Some(domain);
        }
        Ok(true)
    }

    pub fn set_query_dnssec(&mut self, query: QueryId, dnssec: DnssecStatus) -> bool {
        match self.queries.get_mut(query) {
            Some(q) => {
                q.dnssec = dnssec;
                true
            }
            None => false,
        }
    }

    pub fn set_response_time(&mut self, query: QueryId, response_ms: f64) -> bool {
        match self.queries.get_mut(query) {
            Some(q) => {
                q.response_ms = Some(response_ms);
                true
            }
            None => false,
        }
    }

    // ============================================================================================
    // RETIRE
    // ============================================================================================

    /// Remove `query` and take back everything it contributed: its status,
    /// type and reply counts, its OverTime bucket, and the domain's and
    /// client's counts.
    pub fn retire_query(&mut self, query: QueryId) -> bool {
        let Some(q) = self.queries.retire(query) else {
            return false;
        };
        let bucket = self.aggregator.bucket_for(q.timestamp_ms);
        let blocked = q.status.is_blocked();

        self.aggregator.remove_status(q.status, bucket);
        self.aggregator.add_overtime_total(bucket, -1);
        self.aggregator.add_query_type(q.query_type, -1);
        self.aggregator.remove_reply(q.reply);

        if let Some(d) = self.domains.get_mut(q.domain) {
            d.count -= 1;
            if blocked {
                d.blocked -= 1;
            }
        }
        self.change_client_count(
            q.client,
            ClientDelta {
                total: -1,
                blocked: -i64::from(blocked),
                overtime: Some((bucket, -1)),
            },
        );
        debug!("Retired query {} (ID {})", q.id, query);
        true
    }

    pub fn retire_domain(&mut self, domain: DomainId) -> bool {
        self.domains.retire(domain).is_some()
    }

    /// Remove a client. A managed client's counts leave its alias-client; an
    /// alias-client's members become unmanaged.
    pub fn retire_client(&mut self, client: ClientId) -> bool {
        let is_alias = match self.clients.get(client) {
            Some(c) => c.is_alias,
            None => return false,
        };
        if is_alias {
            for (_, c) in self.clients.iter_mut() {
                if c.alias == Some(client) {
                    c.alias = None;
                }
            }
        } else {
            self.unlink_alias_client(client);
        }
        self.clients.retire(client).is_some()
    }

    pub fn retire_upstream(&mut self, upstream: UpstreamId) -> bool {
        self.upstreams.retire(upstream).is_some()
    }

    pub fn retire_cache_entry(&mut self, cache: CacheId) -> bool {
        self.cache.retire(cache).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use crate::entities::NewQuery;
    use crate::error::StoreError;
    use crate::status::QueryStatus;
    use crate::types::{DnssecStatus, QueryType, ReplyType};

    #[test]
    fn test_add_query_counts_everything() {
        let (mut store, _) = store();
        let q = store
            .add_query(NewQuery::new(7, "example.com", "10.0.0.1", 28).with_status(QueryStatus::Forwarded))
            .unwrap();
        let query = store.queries().get(q).unwrap().clone();
        assert_eq!(query.id, 7);
        assert_eq!(query.timestamp_ms, T0);
        assert_eq!(query.query_type, QueryType::Aaaa);

        let bucket = store.overtime().bucket_for(T0);
        let slot = store.overtime().get(bucket).unwrap();
        assert_eq!((slot.total, slot.forwarded), (1, 1));
        assert_eq!(store.counters().query_types[QueryType::Aaaa.index()], 1);
        assert_eq!(store.counters().forwarded(), 1);

        let domain = store.domains().get(query.domain).unwrap();
        assert_eq!(domain.count, 1);
        let client = store.clients().get(query.client).unwrap();
        assert_eq!(client.count, 1);
        assert_eq!(client.overtime[bucket], 1);
        assert_eq!(client.last_query_ms, T0);
    }

    #[test]
    fn test_explicit_timestamp_picks_bucket() {
        let (mut store, _) = store();
        let earlier = T0 - 600_000;
        store
            .add_query(NewQuery::new(1, "example.com", "10.0.0.1", 1).at(earlier))
            .unwrap();
        let bucket = store.overtime().bucket_for(earlier);
        assert_ne!(bucket, store.overtime().bucket_for(T0));
        assert_eq!(store.overtime().get(bucket).unwrap().total, 1);
    }

    #[test]
    fn test_find_query_prefers_newest() {
        let (mut store, _) = store();
        let first = store.add_query(NewQuery::new(42, "a.example", "10.0.0.1", 1)).unwrap();
        let second = store.add_query(NewQuery::new(42, "b.example", "10.0.0.1", 1)).unwrap();
        assert_ne!(first, second);
        assert_eq!(store.find_query(42), Some(second));
        assert_eq!(store.find_query(43), None);
    }

    #[test]
    fn test_find_query_lookback_bound() {
        let (mut store, _) = store();
        let old = store.add_query(NewQuery::new(1, "a.example", "10.0.0.1", 1)).unwrap();
        // correlation_lookback is 8 in the test config
        for id in 100..107 {
            store.add_query(NewQuery::new(id, "b.example", "10.0.0.1", 1)).unwrap();
        }
        assert_eq!(store.find_query(1), Some(old));
        store.add_query(NewQuery::new(107, "b.example", "10.0.0.1", 1)).unwrap();
        assert_eq!(store.find_query(1), None);
    }

    #[test]
    fn test_query_table_full() {
        let (mut store, _) = store();
        for id in 0..64 {
            store.add_query(NewQuery::new(id, "a.example", "10.0.0.1", 1)).unwrap();
        }
        let err = store
            .add_query(NewQuery::new(64, "a.example", "10.0.0.1", 1))
            .unwrap_err();
        assert!(matches!(err, StoreError::ResourceExhausted { what: "queries", .. }));
        // Rejected query left no trace
        assert_eq!(store.counters().total(), 64);
        let domain = store.domains().find(|_| true).unwrap();
        assert_eq!(store.domains().get(domain).unwrap().count, 64);
    }

    #[test]
    fn test_query_table_accepts_queries_after_retirement() {
        let (mut store, _) = store();
        let handles: Vec<_> = (0..64)
            .map(|id| store.add_query(NewQuery::new(id, "a.example", "10.0.0.1", 1)).unwrap())
            .collect();
        for q in handles {
            assert!(store.retire_query(q));
        }
        assert_eq!(store.queries().live(), 0);

        let q = store.add_query(NewQuery::new(64, "a.example", "10.0.0.1", 1)).unwrap();
        assert_eq!(q.index(), 0);
        assert_eq!(store.find_query(64), Some(q));
        assert_eq!(store.counters().total(), 1);
    }

    #[test]
    fn test_refused_query_leaves_client_uncounted() {
        let (mut store, _) = store();
        for i in 0..16 {
            store.find_domain(&format!("d{}.example", i), false).unwrap();
        }
        let err = store
            .add_query(NewQuery::new(1, "one-too-many.example", "10.0.0.1", 1))
            .unwrap_err();
        assert!(matches!(err, StoreError::ResourceExhausted { what: "domains", .. }));

        let client = store.find_client("10.0.0.1", false, false).unwrap().unwrap();
        let record = store.clients().get(client).unwrap();
        assert_eq!(record.count, 0);
        assert!(record.overtime.iter().all(|n| *n == 0));
        assert_eq!(store.counters().total(), 0);
        assert_eq!(store.queries().live(), 0);
    }

    #[test]
    fn test_new_domain_counted_without_last_query() {
        let (mut store, clock) = store();
        let q = store.add_query(NewQuery::new(1, "a.example", "10.0.0.1", 1)).unwrap();
        let domain = store.queries().get(q).unwrap().domain;
        assert_eq!(store.domains().get(domain).unwrap().count, 1);
        assert_eq!(store.domains().get(domain).unwrap().last_query_ms, 0);

        clock.advance(1_000);
        store.add_query(NewQuery::new(2, "a.example", "10.0.0.1", 1)).unwrap();
        let record = store.domains().get(domain).unwrap();
        assert_eq!((record.count, record.last_query_ms), (2, T0 + 1_000));
        let client = store.queries().get(q).unwrap().client;
        assert_eq!(store.clients().get(client).unwrap().count, 2);
    }

    #[test]
    fn test_add_query_moves_overtime_window() {
        let (mut store, _) = store();
        let q = store.add_query(NewQuery::new(1, "a.example", "10.0.0.1", 1)).unwrap();
        let client = store.queries().get(q).unwrap().client;
        let later = T0 + 10 * 3_600_000;
        store
            .add_query(NewQuery::new(2, "a.example", "10.0.0.1", 1).at(later))
            .unwrap();

        let last = store.overtime().len() - 1;
        assert_eq!(store.overtime().bucket_for(later), last);
        assert_eq!(store.overtime().get(last).unwrap().total, 1);
        assert_eq!(store.overtime().get(0).unwrap().total, 1);
        assert_eq!(store.clients().get(client).unwrap().overtime[0], 1);
        assert_eq!(store.clients().get(client).unwrap().overtime[last], 1);
        assert_eq!(store.advance_overtime(later), 0);
    }

    #[test]
    fn test_answer_details() {
        let (mut store, _) = store();
        let q = store.add_query(NewQuery::new(1, "example.com", "10.0.0.1", 1)).unwrap();
        let upstream = store.find_upstream("9.9.9.9", 53).unwrap();
        assert!(store.set_query_upstream(q, upstream));
        assert!(store.set_query_cname(q, "tracker.example").unwrap());
        assert!(store.set_query_dnssec(q, DnssecStatus::Secure));
        assert!(store.set_response_time(q, 3.5));

        let query = store.queries().get(q).unwrap();
        assert_eq!(query.upstream, Some(upstream));
        assert_eq!(query.dnssec, DnssecStatus::Secure);
        assert_eq!(query.response_ms, Some(3.5));
        let cname = query.cname_domain.unwrap();
        assert_eq!(store.domain_name(cname), Some("tracker.example"));
        assert_eq!(store.domains().get(cname).unwrap().count, 0);
        assert_eq!(store.upstreams().get(upstream).unwrap().last_query_ms, T0);
    }

    #[test]
    fn test_retire_query_reverses_contributions() {
        let (mut store, _) = store();
        let keep = store.add_query(NewQuery::new(1, "ads.example", "10.0.0.1", 1)).unwrap();
        store.set_status(keep, QueryStatus::Gravity, false);
        let before_counters = store.counters().clone();
        let before_overtime = store.overtime().clone();

        let q = store.add_query(NewQuery::new(2, "ads.example", "10.0.0.1", 1)).unwrap();
        store.set_status(q, QueryStatus::Denylist, false);
        store.set_reply(q, ReplyType::Nxdomain);
        assert!(store.retire_query(q));

        assert_eq!(store.counters(), &before_counters);
        assert_eq!(store.overtime(), &before_overtime);
        let query = store.queries().get(keep).unwrap();
        let domain = store.domains().get(query.domain).unwrap();
        assert_eq!((domain.count, domain.blocked), (1, 1));
        let client = store.clients().get(query.client).unwrap();
        assert_eq!((client.count, client.blocked), (1, 1));
        assert_eq!(client.overtime.iter().sum::<i64>(), 1);

        assert!(store.queries().get(q).is_none());
        assert!(!store.retire_query(q));
    }

    #[test]
    fn test_retired_handles_go_stale() {
        let (mut store, _) = store();
        let d = store.find_domain("old.example", false).unwrap();
        assert!(store.retire_domain(d));
        let fresh = store.find_domain("new.example", false).unwrap();
        assert_eq!(fresh.index(), d.index());
        assert!(store.domains().get(d).is_none());
        assert_eq!(store.domain_name(fresh), Some("new.example"));
        assert!(!store.retire_domain(d));

        let u = store.find_upstream("1.1.1.1", 53).unwrap();
        assert!(store.retire_upstream(u));
        assert!(!store.record_upstream_response(u, 1.0));
    }

    #[test]
    fn test_retire_client_leaves_alias() {
        let (mut store, _) = store();
        let member = store.find_client("10.0.0.1", true, false).unwrap().unwrap();
        let alias = store.find_client("group", false, true).unwrap().unwrap();
        store.link_alias_client(member, alias);
        assert_eq!(store.clients().get(alias).unwrap().count, 1);

        assert!(store.retire_client(member));
        assert_eq!(store.clients().get(alias).unwrap().count, 0);
        assert!(store.retire_client(alias));
        assert_eq!(store.clients().live(), 0);
    }
}
