use super::{CacheId, ClientId, DomainId, UpstreamId};
use crate::status::QueryStatus;
use crate::types::{DnssecStatus, PrivacyLevel, QueryType, ReplyType};

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// Correlation id the resolver uses to match the answer
    pub id: i32,
    pub timestamp_ms: u64,
    pub domain: DomainId,
    pub client: ClientId,
    pub upstream: Option<UpstreamId>,
    pub cache: Option<CacheId>,
    pub status: QueryStatus,
    /// Domain the answer's CNAME chain pointed to, when blocking happened there
    pub cname_domain: Option<DomainId>,
    pub query_type: QueryType,
    /// Raw RR type, kept for `TYPE<n>` reporting of `QueryType::Other`
    pub rr_type: u16,
    pub reply: ReplyType,
    pub dnssec: DnssecStatus,
    pub response_ms: Option<f64>,
    /// Privacy level in force when the query was recorded
    pub privacy: PrivacyLevel,
}

/// What the resolver knows about a query when it first arrives.
#[derive(Debug, Clone)]
pub struct NewQuery<'a> {
    pub id: i32,
    pub domain: &'a str,
    pub client_ip: &'a str,
    pub rr_type: u16,
    /// Defaults to the clock's current time
    pub timestamp_ms: Option<u64>,
    pub status: QueryStatus,
}

impl<'a> NewQuery<'a> {
    pub fn new(id: i32, domain: &'a str, client_ip: &'a str, rr_type: u16) -> Self {
        Self {
            id,
            domain,
            client_ip,
            rr_type,
            timestamp_ms: None,
            status: QueryStatus::Unknown,
        }
    }

    pub fn at(mut self, timestamp_ms: u64) -> Self {
        self.timestamp_ms = Some(timestamp_ms);
        self
    }

    pub fn with_status(mut self, status: QueryStatus) -> Self {
        self.status = status;
        self
    }
}
