//! Small value types attached to queries and cache entries.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

// ================================================================================================
// QUERY TYPE
// ================================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum QueryType {
    A = 0,
    Aaaa,
    Any,
    Srv,
    Soa,
    Ptr,
    Txt,
    Naptr,
    Mx,
    Ds,
    Rrsig,
    Dnskey,
    Ns,
    Other,
    Svcb,
    Https,
}

impl QueryType {
    pub const COUNT: usize = 16;

    pub const ALL: [QueryType; QueryType::COUNT] = [
        QueryType::A,
        QueryType::Aaaa,
        QueryType::Any,
        QueryType::Srv,
        QueryType::Soa,
        QueryType::Ptr,
        QueryType::Txt,
        QueryType::Naptr,
        QueryType::Mx,
        QueryType::Ds,
        QueryType::Rrsig,
        QueryType::Dnskey,
        QueryType::Ns,
        QueryType::Other,
        QueryType::Svcb,
        QueryType::Https,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Map an RR type number from the wire to its bucket.
    pub fn from_rr_type(rr: u16) -> Self {
        match rr {
            1 => QueryType::A,
            28 => QueryType::Aaaa,
            255 => QueryType::Any,
            33 => QueryType::Srv,
            6 => QueryType::Soa,
            12 => QueryType::Ptr,
            16 => QueryType::Txt,
            35 => QueryType::Naptr,
            15 => QueryType::Mx,
            43 => QueryType::Ds,
            46 => QueryType::Rrsig,
            48 => QueryType::Dnskey,
            2 => QueryType::Ns,
            64 => QueryType::Svcb,
            65 => QueryType::Https,
            _ => QueryType::Other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QueryType::A => "A",
            QueryType::Aaaa => "AAAA",
            QueryType::Any => "ANY",
            QueryType::Srv => "SRV",
            QueryType::Soa => "SOA",
            QueryType::Ptr => "PTR",
            QueryType::Txt => "TXT",
            QueryType::Naptr => "NAPTR",
            QueryType::Mx => "MX",
            QueryType::Ds => "DS",
            QueryType::Rrsig => "RRSIG",
            QueryType::Dnskey => "DNSKEY",
            QueryType::Ns => "NS",
            QueryType::Other => "OTHER",
            QueryType::Svcb => "SVCB",
            QueryType::Https => "HTTPS",
        }
    }

    /// Like `as_str`, but spells `Other` as `TYPE<n>` when the raw number is
    /// known.
    pub fn display_with(self, rr_type: Option<u16>) -> Cow<'static, str> {
        match (self, rr_type) {
            (QueryType::Other, Some(rr)) => Cow::Owned(format!("TYPE{}", rr)),
            _ => Cow::Borrowed(self.as_str()),
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ================================================================================================
// REPLY / DNSSEC
// ================================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum ReplyType {
    #[default]
    Unknown = 0,
    Nodata,
    Nxdomain,
    Cname,
    Ip,
    Domain,
    Rrname,
    Servfail,
    Refused,
    Notimp,
    Other,
    Dnssec,
    None,
    Blob,
}

impl ReplyType {
    pub const COUNT: usize = 14;

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReplyType::Unknown => "UNKNOWN",
            ReplyType::Nodata => "NODATA",
            ReplyType::Nxdomain => "NXDOMAIN",
            ReplyType::Cname => "CNAME",
            ReplyType::Ip => "IP",
            ReplyType::Domain => "DOMAIN",
            ReplyType::Rrname => "RRNAME",
            ReplyType::Servfail => "SERVFAIL",
            ReplyType::Refused => "REFUSED",
            ReplyType::Notimp => "NOTIMP",
            ReplyType::Other => "OTHER",
            ReplyType::Dnssec => "DNSSEC",
            ReplyType::None => "NONE",
            ReplyType::Blob => "BLOB",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DnssecStatus {
    #[default]
    Unknown,
    Secure,
    Insecure,
    Bogus,
    Abandoned,
    Truncated,
}

impl DnssecStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DnssecStatus::Unknown => "UNKNOWN",
            DnssecStatus::Secure => "SECURE",
            DnssecStatus::Insecure => "INSECURE",
            DnssecStatus::Bogus => "BOGUS",
            DnssecStatus::Abandoned => "ABANDONED",
            DnssecStatus::Truncated => "TRUNCATED",
        }
    }
}

// ================================================================================================
// PRIVACY
// ================================================================================================

/// How much of a query may be shown to readers. Stored on every query at the
/// time it is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum PrivacyLevel {
    #[default]
    ShowAll = 0,
    HideDomains = 1,
    HideDomainsClients = 2,
    Maximum = 3,
}

impl TryFrom<u8> for PrivacyLevel {
    type Error = String;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(PrivacyLevel::ShowAll),
            1 => Ok(PrivacyLevel::HideDomains),
            2 => Ok(PrivacyLevel::HideDomainsClients),
            3 => Ok(PrivacyLevel::Maximum),
            other => Err(format!("invalid privacy level {}", other)),
        }
    }
}

impl From<PrivacyLevel> for u8 {
    fn from(level: PrivacyLevel) -> u8 {
        level as u8
    }
}

// ================================================================================================
// CACHE DECISION
// ================================================================================================

/// Memoised outcome of the list lookup for one (domain, client, type).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CacheDecision {
    #[default]
    Unknown,
    Allowed,
    Blocked,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_type_from_wire() {
        assert_eq!(QueryType::from_rr_type(1), QueryType::A);
        assert_eq!(QueryType::from_rr_type(65), QueryType::Https);
        assert_eq!(QueryType::from_rr_type(99), QueryType::Other);
        assert_eq!(QueryType::Other.display_with(Some(99)), "TYPE99");
        assert_eq!(QueryType::Other.display_with(None), "OTHER");
        assert_eq!(QueryType::Mx.display_with(Some(15)), "MX");
    }

    #[test]
    fn test_query_type_indices_match_table() {
        for (idx, qtype) in QueryType::ALL.iter().enumerate() {
            assert_eq!(qtype.index(), idx);
        }
    }

    #[test]
    fn test_privacy_level_ordering_and_decode() {
        assert!(PrivacyLevel::HideDomains < PrivacyLevel::HideDomainsClients);
        assert_eq!(PrivacyLevel::try_from(2u8), Ok(PrivacyLevel::HideDomainsClients));
        assert!(PrivacyLevel::try_from(7u8).is_err());
        let level: PrivacyLevel = serde_json::from_str("1").unwrap();
        assert_eq!(level, PrivacyLevel::HideDomains);
    }
}
