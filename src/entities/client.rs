use super::ClientId;
use crate::strings::StrPos;
use std::fmt;

/// Hardware address as reported by the neighbour cache (up to 16 bytes).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct HwAddr {
    bytes: [u8; 16],
    len: u8,
}

impl HwAddr {
    pub const MAX_LEN: usize = 16;

    /// `None` if `bytes` is empty or longer than `MAX_LEN`.
    pub fn new(bytes: &[u8]) -> Option<Self> {
        if bytes.is_empty() || bytes.len() > Self::MAX_LEN {
            return None;
        }
        let mut buf = [0u8; 16];
        buf[..bytes.len()].copy_from_slice(bytes);
        Some(Self {
            bytes: buf,
            len: bytes.len() as u8,
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }
}

impl fmt::Display for HwAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, b) in self.as_bytes().iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

impl fmt::Debug for HwAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HwAddr({})", self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Client {
    /// Interned IP address, the lookup key
    pub ip: StrPos,
    /// Interned hostname, empty until resolved
    pub name: StrPos,
    pub hwaddr: Option<HwAddr>,
    /// Interned interface name
    pub iface: StrPos,
    pub count: i64,
    pub blocked: i64,
    /// Queries seen since the neighbour table was last scanned
    pub arp_count: i64,
    /// Per-bucket query counts, same layout as the global OverTime histogram
    pub overtime: Vec<i64>,
    /// Alias-client this client's counts are mirrored into
    pub alias: Option<ClientId>,
    /// This record is an alias-client and only receives propagated counts
    pub is_alias: bool,
    /// Interned comma-separated group ids
    pub groups: StrPos,
    pub found_group: bool,
    /// Group re-reads done since creation
    pub reread_groups: u32,
    /// Hostname not looked up yet
    pub is_new: bool,
    pub first_seen_ms: u64,
    pub last_query_ms: u64,
}

impl Client {
    pub fn new(ip: StrPos, is_alias: bool, overtime_slots: usize, now_ms: u64) -> Self {
        Self {
            ip,
            name: StrPos::EMPTY,
            hwaddr: None,
            iface: StrPos::EMPTY,
            count: 0,
            blocked: 0,
            arp_count: 0,
            overtime: vec![0; overtime_slots],
            alias: None,
            is_alias,
            groups: StrPos::EMPTY,
            found_group: false,
            reread_groups: 0,
            is_new: true,
            first_seen_ms: now_ms,
            last_query_ms: 0,
        }
    }
}
