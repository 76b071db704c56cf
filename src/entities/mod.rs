//! Record types stored in the entity tables.
//!
//! Records hold plain values and handles to other records. Strings live in
//! the shared `StringPool` and are referenced by `StrPos`.

pub mod cache;
pub mod client;
pub mod domain;
pub mod query;
pub mod upstream;

pub use cache::CacheEntry;
pub use client::{Client, HwAddr};
pub use domain::Domain;
pub use query::{NewQuery, Query};
pub use upstream::Upstream;

use crate::table::Handle;

pub type DomainId = Handle<Domain>;
pub type ClientId = Handle<Client>;
pub type UpstreamId = Handle<Upstream>;
pub type CacheId = Handle<CacheEntry>;
pub type QueryId = Handle<Query>;
