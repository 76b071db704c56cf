use crate::strings::StrPos;

#[derive(Debug, Clone, PartialEq)]
pub struct Domain {
    /// Interned name
    pub name: StrPos,
    /// `hash_str` of the name, checked before the full comparison
    pub hash: u32,
    /// Times this domain was queried
    pub count: i64,
    /// Times a query for this domain was blocked
    pub blocked: i64,
    /// Milliseconds since epoch of the last counted query, 0 if never
    pub last_query_ms: u64,
}
