//! # String Pool
//!
//! Append-only interning arena shared by all entity tables. Every string is
//! stored once per `intern` call followed by a NUL terminator; records keep
//! only the returned offset. Offset 0 always holds the empty string.
//!
//! The pool never deduplicates and never frees. Interning the same text twice
//! stores it twice.

use crate::error::{StoreError, StoreResult};
use log::error;
use std::net::{Ipv4Addr, Ipv6Addr};

/// Offset of an interned string. `StrPos::EMPTY` resolves to "".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StrPos(u32);

impl StrPos {
    pub const EMPTY: StrPos = StrPos(0);

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn offset(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug)]
pub struct StringPool {
    bytes: Vec<u8>,
    max_bytes: usize,
}

impl StringPool {
    pub fn with_capacity(max_bytes: usize) -> Self {
        // Offset 0 is the shared empty string
        Self {
            bytes: vec![0u8],
            max_bytes,
        }
    }

    /// Append `s` and return its offset.
    ///
    /// Anything after an interior NUL is dropped, since the terminator marks
    /// the end of the string on resolve.
    pub fn intern(&mut self, s: &str) -> StoreResult<StrPos> {
        let text = match s.find('\0') {
            Some(end) => &s[..end],
            None => s,
        };
        if text.is_empty() {
            return Ok(StrPos::EMPTY);
        }

        let needed = text.len() + 1;
        let offset = self.bytes.len();
        if offset + needed > self.max_bytes || offset + needed > u32::MAX as usize {
            error!(
                "String pool exhausted: {} + {} bytes exceeds {}",
                offset, needed, self.max_bytes
            );
            return Err(StoreError::ResourceExhausted {
                what: "string pool",
                capacity: self.max_bytes,
            });
        }
        if self.bytes.try_reserve(needed).is_err() {
            error!("String pool allocation of {} bytes failed", needed);
            return Err(StoreError::ResourceExhausted {
                what: "string pool",
                capacity: self.max_bytes,
            });
        }

        self.bytes.extend_from_slice(text.as_bytes());
        self.bytes.push(0);
        Ok(StrPos(offset as u32))
    }

    /// View the string starting at `pos`. Out-of-range offsets resolve to "".
    pub fn resolve(&self, pos: StrPos) -> &str {
        let start = pos.offset();
        if start >= self.bytes.len() {
            return "";
        }
        let tail = &self.bytes[start..];
        let end = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
        std::str::from_utf8(&tail[..end]).unwrap_or("")
    }

    /// Bytes in use, including the reserved empty string.
    pub fn used_bytes(&self) -> usize {
        self.bytes.len()
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }
}

/// Jenkins' one-at-a-time hash, used as a cheap pre-filter for domain lookups.
pub fn hash_str(s: &str) -> u32 {
    let mut hash: u32 = 0;
    for &b in s.as_bytes() {
        hash = hash.wrapping_add(b as u32);
        hash = hash.wrapping_add(hash << 10);
        hash ^= hash >> 6;
    }
    hash = hash.wrapping_add(hash << 3);
    hash ^= hash >> 11;
    hash = hash.wrapping_add(hash << 15);
    hash
}

/// ASCII lowercase; other characters are left alone.
pub fn to_lowercase_ascii(s: &str) -> String {
    s.to_ascii_lowercase()
}

pub fn is_valid_ipv4(addr: &str) -> bool {
    addr.parse::<Ipv4Addr>().is_ok()
}

pub fn is_valid_ipv6(addr: &str) -> bool {
    addr.parse::<Ipv6Addr>().is_ok()
}
