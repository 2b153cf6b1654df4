//! # dnsvakt-storage
//!
//! The authoritative classification store: batch membership checks against
//! the blacklist and whitelist collections, plus the best-effort recording of
//! blacklist hits. The classifier talks to the [`ClassificationStore`] trait;
//! retry policy is layered above it, not here.

pub mod mongo;

use std::collections::{HashMap, HashSet};

use thiserror::Error;

pub use mongo::MongoStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store connection failed: {0}")]
    Connect(String),
    #[error("store query failed: {0}")]
    Query(String),
    #[error("store write failed: {0}")]
    Write(String),
}

/// Batch-lookup contract of the authoritative store.
///
/// Lookup results map every queried name to its membership verdict; names
/// absent from the collection map to `false`.
pub trait ClassificationStore: Send {
    fn check_blacklist(
        &self,
        names: &HashSet<String>,
    ) -> Result<HashMap<String, bool>, StoreError>;

    fn check_whitelist(
        &self,
        names: &HashSet<String>,
    ) -> Result<HashMap<String, bool>, StoreError>;

    /// Records one observed blacklist hit, timestamped in seconds since the
    /// UNIX epoch.
    fn record_blacklist_hit(&self, name: &str, unix_seconds: i64) -> Result<(), StoreError>;
}
