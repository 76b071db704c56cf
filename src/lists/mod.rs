//! # List Store
//!
//! The block/allow list database lives outside the datastore. After each
//! reload the datastore mirrors a handful of row counts from it and clears
//! its own memoised decisions.

pub mod sqlite;

pub use sqlite::SqliteListStore;

use crate::error::StoreResult;

/// Tables whose row counts are mirrored into `DatabaseCounts`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListTable {
    Gravity,
    Groups,
    Clients,
    Adlists,
    Bulklists,
    AllowedDomains,
    DeniedDomains,
}

impl ListTable {
    pub const ALL: [ListTable; 7] = [
        ListTable::Gravity,
        ListTable::Groups,
        ListTable::Clients,
        ListTable::Adlists,
        ListTable::Bulklists,
        ListTable::AllowedDomains,
        ListTable::DeniedDomains,
    ];
}

pub trait ListStore: Send + Sync {
    /// (Re-)open the underlying database.
    fn reopen(&self) -> StoreResult<()>;

    /// Number of rows in `table`.
    fn count(&self, table: ListTable) -> StoreResult<i64>;

    /// Recompile regex filters. Returns how many were loaded.
    fn reload_regex(&self) -> StoreResult<usize>;

    /// Look for lists that failed to download. Returns how many there are.
    fn check_inaccessible_lists(&self) -> StoreResult<usize>;
}
