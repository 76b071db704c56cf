//! SQLite-backed `ListStore`.
//!
//! Reads the list database by table name only; the schema itself is owned by
//! the tool that builds the database.

use super::{ListStore, ListTable};
use crate::error::{StoreError, StoreResult};
use log::{debug, warn};
use parking_lot::Mutex;
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};

/// Adlist download status meaning "unreachable, no cached copy".
const ADLIST_STATUS_UNAVAILABLE: i64 = 4;

pub struct SqliteListStore {
    path: PathBuf,
    conn: Mutex<Option<Connection>>,
}

impl std::fmt::Debug for SqliteListStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteListStore")
            .field("path", &self.path)
            .field("open", &self.conn.lock().is_some())
            .finish()
    }
}

impl SqliteListStore {
    /// Open the database at `path` read-only.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
            conn: Mutex::new(None),
        };
        store.reopen()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn query_count(&self, sql: &str) -> StoreResult<i64> {
        let guard = self.conn.lock();
        let conn = guard
            .as_ref()
            .ok_or_else(|| StoreError::ListStore("list database not open".to_string()))?;
        let count: i64 = conn.query_row(sql, [], |row| row.get(0))?;
        Ok(count)
    }
}

fn count_sql(table: ListTable) -> &'static str {
    match table {
        ListTable::Gravity => "SELECT COUNT(*) FROM gravity",
        ListTable::Groups => "SELECT COUNT(*) FROM \"group\"",
        ListTable::Clients => "SELECT COUNT(*) FROM client",
        ListTable::Adlists => "SELECT COUNT(*) FROM adlist",
        ListTable::Bulklists => "SELECT COUNT(*) FROM bulklist",
        ListTable::AllowedDomains => "SELECT COUNT(*) FROM domainlist WHERE type IN (0, 2)",
        ListTable::DeniedDomains => "SELECT COUNT(*) FROM domainlist WHERE type IN (1, 3)",
    }
}

impl ListStore for SqliteListStore {
    fn reopen(&self) -> StoreResult<()> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| {
            StoreError::ListStore(format!(
                "Failed to open list database {}: {}",
                self.path.display(),
                e
            ))
        })?;
        *self.conn.lock() = Some(conn);
        debug!("Opened list database {}", self.path.display());
        Ok(())
    }

    fn count(&self, table: ListTable) -> StoreResult<i64> {
        self.query_count(count_sql(table))
    }

    fn reload_regex(&self) -> StoreResult<usize> {
        let n = self.query_count(
            "SELECT COUNT(*) FROM domainlist WHERE type IN (2, 3) AND enabled = 1",
        )?;
        debug!("Loaded {} regex filters", n);
        Ok(n.max(0) as usize)
    }

    fn check_inaccessible_lists(&self) -> StoreResult<usize> {
        let sql = format!(
            "SELECT COUNT(*) FROM adlist WHERE enabled = 1 AND status = {}",
            ADLIST_STATUS_UNAVAILABLE
        );
        let n = self.query_count(&sql)?;
        if n > 0 {
            warn!("{} adlist(s) could not be downloaded and have no cached copy", n);
        }
        Ok(n.max(0) as usize)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use rusqlite::Connection;
    use std::path::Path;

    /// Build a minimal list database with a few rows in every table.
    pub(crate) fn create_list_db(path: &Path) {
        let conn = Connection::open(path).unwrap();
        conn.execute_batch(
            "CREATE TABLE gravity (domain TEXT, adlist_id INTEGER);
             CREATE TABLE \"group\" (id INTEGER PRIMARY KEY, name TEXT);
             CREATE TABLE client (id INTEGER PRIMARY KEY, ip TEXT);
             CREATE TABLE adlist (id INTEGER PRIMARY KEY, address TEXT, enabled INTEGER, status INTEGER);
             CREATE TABLE domainlist (id INTEGER PRIMARY KEY, type INTEGER, domain TEXT, enabled INTEGER);
             CREATE TABLE bulklist (id INTEGER PRIMARY KEY, address TEXT);
             INSERT INTO bulklist (address) VALUES ('https://lists.example/bulk.txt');
             INSERT INTO gravity VALUES ('ads.example', 1), ('track.example', 1), ('spy.example', 2);
             INSERT INTO \"group\" (name) VALUES ('Default'), ('Kids');
             INSERT INTO client (ip) VALUES ('10.0.0.2');
             INSERT INTO adlist (address, enabled, status) VALUES ('https://a', 1, 1), ('https://b', 1, 4);
             INSERT INTO domainlist (type, domain, enabled) VALUES
                 (0, 'good.example', 1),
                 (1, 'bad.example', 1),
                 (1, 'worse.example', 1),
                 (2, '^ok', 1),
                 (3, '^ad[sz]?\\.', 1),
                 (3, '^off', 0);",
        )
        .unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_by_table() -> Result<(), String> {
        let dir = tempfile::tempdir().map_err(|e| e.to_string())?;
        let path = dir.path().join("lists.db");
        fixtures::create_list_db(&path);

        let store = SqliteListStore::open(&path).map_err(|e| e.to_string())?;
        assert_eq!(store.count(ListTable::Gravity).unwrap(), 3);
        assert_eq!(store.count(ListTable::Groups).unwrap(), 2);
        assert_eq!(store.count(ListTable::Clients).unwrap(), 1);
        assert_eq!(store.count(ListTable::Adlists).unwrap(), 2);
        assert_eq!(store.count(ListTable::Bulklists).unwrap(), 1);
        assert_eq!(store.count(ListTable::AllowedDomains).unwrap(), 2);
        assert_eq!(store.count(ListTable::DeniedDomains).unwrap(), 4);
        assert_eq!(store.reload_regex().unwrap(), 2);
        assert_eq!(store.check_inaccessible_lists().unwrap(), 1);
        Ok(())
    }

    #[test]
    fn test_missing_database_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let result = SqliteListStore::open(dir.path().join("absent.db"));
        assert!(matches!(result, Err(StoreError::ListStore(_))));
    }
}
