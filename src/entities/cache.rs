use super::{ClientId, DomainId};
use crate::types::{CacheDecision, QueryType};

/// Memoised blocking decision for one (domain, client, query type).
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub domain: DomainId,
    pub client: ClientId,
    pub query_type: QueryType,
    pub decision: CacheDecision,
    /// List that produced the decision, if known
    pub list_id: Option<i64>,
    /// Reply is forced regardless of blocking mode
    pub force_reply: bool,
}

impl CacheEntry {
    pub fn new(domain: DomainId, client: ClientId, query_type: QueryType) -> Self {
        Self {
            domain,
            client,
            query_type,
            decision: CacheDecision::Unknown,
            list_id: None,
            force_reply: false,
        }
    }

    /// Forget the decision so the next query re-runs the list lookup.
    pub fn reset(&mut self) {
        self.decision = CacheDecision::Unknown;
        self.list_id = None;
    }
}
