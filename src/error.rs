//! Error types for the datastore.
//!
//! Only two things can go wrong inside the core: a table or the string pool
//! cannot grow (fatal for the operation in progress), or a collaborator
//! outside the core fails. Lookups that miss are not errors and are reported
//! as `None`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A table or the string pool hit its configured limit or the allocator
    /// refused to grow it.
    #[error("resource exhausted: {what} (capacity {capacity})")]
    ResourceExhausted { what: &'static str, capacity: usize },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("list store error: {0}")]
    ListStore(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::ListStore(e.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
