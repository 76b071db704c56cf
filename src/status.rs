//! # Query Status
//!
//! The closed set of states a query can be in, and the three classification
//! predicates every counter, histogram bucket and report goes through.
//! Nothing else in the crate decides whether a status counts as blocked,
//! cached or forwarded.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum QueryStatus {
    Unknown = 0,
    Gravity = 1,
    Forwarded = 2,
    Cache = 3,
    Regex = 4,
    Denylist = 5,
    ExternalBlockedIp = 6,
    ExternalBlockedNull = 7,
    ExternalBlockedNxra = 8,
    GravityCname = 9,
    RegexCname = 10,
    DenylistCname = 11,
    Retried = 12,
    RetriedDnssec = 13,
    InProgress = 14,
    DbBusy = 15,
    SpecialDomain = 16,
    CacheStale = 17,
}

impl QueryStatus {
    pub const COUNT: usize = 18;

    pub const ALL: [QueryStatus; QueryStatus::COUNT] = [
        QueryStatus::Unknown,
        QueryStatus::Gravity,
        QueryStatus::Forwarded,
        QueryStatus::Cache,
        QueryStatus::Regex,
        QueryStatus::Denylist,
        QueryStatus::ExternalBlockedIp,
        QueryStatus::ExternalBlockedNull,
        QueryStatus::ExternalBlockedNxra,
        QueryStatus::GravityCname,
        QueryStatus::RegexCname,
        QueryStatus::DenylistCname,
        QueryStatus::Retried,
        QueryStatus::RetriedDnssec,
        QueryStatus::InProgress,
        QueryStatus::DbBusy,
        QueryStatus::SpecialDomain,
        QueryStatus::CacheStale,
    ];

    /// Decode a raw status value. Anything outside the enumeration is `None`.
    pub fn from_u8(raw: u8) -> Option<Self> {
        Self::ALL.get(raw as usize).copied()
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QueryStatus::Unknown => "UNKNOWN",
            QueryStatus::Gravity => "GRAVITY",
            QueryStatus::Forwarded => "FORWARDED",
            QueryStatus::Cache => "CACHE",
            QueryStatus::Regex => "REGEX",
            QueryStatus::Denylist => "DENYLIST",
            QueryStatus::ExternalBlockedIp => "EXTERNAL_BLOCKED_IP",
            QueryStatus::ExternalBlockedNull => "EXTERNAL_BLOCKED_NULL",
            QueryStatus::ExternalBlockedNxra => "EXTERNAL_BLOCKED_NXRA",
            QueryStatus::GravityCname => "GRAVITY_CNAME",
            QueryStatus::RegexCname => "REGEX_CNAME",
            QueryStatus::DenylistCname => "DENYLIST_CNAME",
            QueryStatus::Retried => "RETRIED",
            QueryStatus::RetriedDnssec => "RETRIED_DNSSEC",
            QueryStatus::InProgress => "IN_PROGRESS",
            QueryStatus::DbBusy => "DBBUSY",
            QueryStatus::SpecialDomain => "SPECIAL_DOMAIN",
            QueryStatus::CacheStale => "CACHE_STALE",
        }
    }

    /// Answered by the resolver itself because a block rule or an upstream
    /// block signal applied. A busy database counts as blocked.
    pub fn is_blocked(self) -> bool {
        match self {
            QueryStatus::Gravity
            | QueryStatus::Regex
            | QueryStatus::Denylist
            | QueryStatus::ExternalBlockedIp
            | QueryStatus::ExternalBlockedNull
            | QueryStatus::ExternalBlockedNxra
            | QueryStatus::GravityCname
            | QueryStatus::RegexCname
            | QueryStatus::DenylistCname
            | QueryStatus::DbBusy
            | QueryStatus::SpecialDomain => true,
            QueryStatus::Unknown
            | QueryStatus::Forwarded
            | QueryStatus::Cache
            | QueryStatus::Retried
            | QueryStatus::RetriedDnssec
            | QueryStatus::InProgress
            | QueryStatus::CacheStale => false,
        }
    }

    /// Served from the local cache, fresh or stale.
    pub fn is_cached(self) -> bool {
        matches!(self, QueryStatus::Cache | QueryStatus::CacheStale)
    }

    /// Sent to an upstream server, including retries.
    pub fn is_forwarded(self) -> bool {
        matches!(
            self,
            QueryStatus::Forwarded | QueryStatus::Retried | QueryStatus::RetriedDnssec
        )
    }
}

impl fmt::Display for QueryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<u8> for QueryStatus {
    type Error = u8;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        QueryStatus::from_u8(raw).ok_or(raw)
    }
}

impl FromStr for QueryStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QueryStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or(())
    }
}

/// Text for a raw status value, "INVALID" when out of range.
pub fn status_str(raw: u8) -> &'static str {
    QueryStatus::from_u8(raw).map_or("INVALID", QueryStatus::as_str)
}

fn status_list(pred: fn(QueryStatus) -> bool) -> String {
    let ids: Vec<String> = QueryStatus::ALL
        .iter()
        .copied()
        .filter(|s| pred(*s))
        .map(|s| s.as_u8().to_string())
        .collect();
    format!("({})", ids.join(","))
}

/// Parenthesised, comma-separated numeric list of blocking statuses, for use
/// in `IN (...)` filters by reporting code.
pub fn blocked_status_list() -> String {
    status_list(QueryStatus::is_blocked)
}

pub fn cached_status_list() -> String {
    status_list(QueryStatus::is_cached)
}
