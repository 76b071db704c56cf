//! List refresh - reload the block/allow list database into the datastore.
//!
//! Provides two refresh mechanisms:
//! 1. **On-demand refresh** (RefreshService): reload when asked
//! 2. **Scheduled refresh** (RefreshScheduler): periodic background task

pub mod scheduler;
pub mod service;

pub use scheduler::{RefreshScheduler, SchedulerConfig};
pub use service::RefreshService;
