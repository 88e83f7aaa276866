//! Cache-first lookup engine shared by every lookup domain.
//!
//! A domain plugs in its key derivation, table layout and payload assembly via
//! [`CacheDomain`]; the [`RefreshCoordinator`] runs the same
//! lookup → freshness check → fetch → upsert algorithm for all of them.

pub mod coordinator;
pub mod freshness;
pub mod key;
pub mod store;

pub use coordinator::{LookupError, RefreshCoordinator, RefreshPolicy, Resolved};
pub use freshness::{Clock, SystemClock, is_fresh};
pub use key::CacheKey;
pub use store::{CacheStore, CacheTable, Column, ColumnValue, Entry, StoreError};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// One stored entry: at most one exists per key.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheRecord<P> {
    pub key: CacheKey,
    pub generated_at: DateTime<Utc>,
    pub payload: P,
}

/// Where a returned payload came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// A fresh stored record.
    Cache,
    /// Fetched from the provider during this lookup.
    Upstream,
    /// A stale stored record served because the refresh failed.
    Stale,
}

impl Source {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Upstream => "upstream",
            Self::Stale => "stale",
        }
    }
}

/// Domain-specific capabilities for the shared refresh algorithm.
pub trait CacheDomain: Send + Sync + 'static {
    /// Raw lookup input, validated before it reaches the coordinator.
    type Input: Send + Sync;
    /// What the upstream adapter returns for one input.
    type Fetched: Send;
    /// The normalized value that is stored and returned to callers.
    type Payload: Serialize + DeserializeOwned + Send + Sync;

    const TABLE: CacheTable;

    fn derive_key(input: &Self::Input) -> CacheKey;

    /// Assemble the stored payload from a successful fetch.
    fn build_payload(
        input: &Self::Input,
        fetched: Self::Fetched,
        generated_at: DateTime<Utc>,
    ) -> Self::Payload;

    /// Values for the table's denormalized columns, in declaration order.
    fn columns(payload: &Self::Payload) -> Vec<ColumnValue>;

    /// Mark a payload with where it was served from.
    fn tag(payload: Self::Payload, _source: Source) -> Self::Payload {
        payload
    }
}
