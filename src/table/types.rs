//! Table statistics.

use serde::Serialize;

/// Size information for one entity table.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TableStats {
    /// Table name ("domains", "clients", ...)
    pub name: &'static str,
    /// Configured maximum number of slots
    pub capacity: usize,
    /// Slots ever handed out (high-water mark, the table's "current size")
    pub high_water: usize,
    /// Occupied slots
    pub live: usize,
}

impl TableStats {
    /// Tombstoned slots waiting for reuse.
    pub fn free(&self) -> usize {
        self.high_water - self.live
    }
}
