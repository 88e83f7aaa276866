//! The cache-first refresh algorithm.

use chrono::{DateTime, TimeDelta, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::freshness::{Clock, SystemClock, is_fresh};
use super::store::{CacheStore, Entry, StoreError};
use super::{CacheDomain, CacheRecord, Source};
use crate::upstream::{UpstreamAdapter, UpstreamError};
use crate::logging::warn_if_slow;

const SLOW_FETCH_THRESHOLD: Duration = Duration::from_secs(5);

/// Per-domain refresh settings.
#[derive(Debug, Clone, Copy)]
pub struct RefreshPolicy {
    /// Maximum age of a record before it is refreshed.
    pub ttl: Duration,
    /// Serve the stale record instead of failing when a refresh fails.
    pub serve_stale_on_error: bool,
}

impl RefreshPolicy {
    pub fn strict(ttl: Duration) -> Self {
        Self {
            ttl,
            serve_stale_on_error: false,
        }
    }
}

/// A payload returned by the coordinator, with its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<P> {
    pub payload: P,
    pub source: Source,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Ties a domain's cache table to its upstream adapter.
///
/// Each [`lookup`](Self::lookup) is an independent transaction: concurrent
/// lookups of the same stale key each fetch and each upsert, and the record
/// with the newest `generated_at` wins.
pub struct RefreshCoordinator<D: CacheDomain> {
    store: CacheStore<D>,
    adapter: Arc<dyn UpstreamAdapter<D::Input, Output = D::Fetched>>,
    ttl: TimeDelta,
    serve_stale_on_error: bool,
    clock: Arc<dyn Clock>,
}

impl<D: CacheDomain> RefreshCoordinator<D> {
    pub fn new(
        store: CacheStore<D>,
        adapter: Arc<dyn UpstreamAdapter<D::Input, Output = D::Fetched>>,
        policy: RefreshPolicy,
    ) -> Self {
        Self {
            store,
            adapter,
            ttl: TimeDelta::from_std(policy.ttl).unwrap_or(TimeDelta::MAX),
            serve_stale_on_error: policy.serve_stale_on_error,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the system clock, e.g. with a manually advanced one.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &CacheStore<D> {
        &self.store
    }

    /// Return the cached payload for `input` if fresh, otherwise fetch, store and return it.
    ///
    /// Upstream failures propagate unchanged unless stale serving is enabled
    /// and a stale record exists.
    pub async fn lookup(&self, input: &D::Input) -> Result<Resolved<D::Payload>, LookupError> {
        let table = D::TABLE.name;
        let key = D::derive_key(input);
        let now = self.clock.now();

        let mut unreadable = false;
        let stale = match self.store.read(&key).await? {
            Entry::Present(record) if is_fresh(record.generated_at, self.ttl, now) => {
                debug!(table, key = %key, "Cache hit");
                return Ok(resolve::<D>(record, Source::Cache));
            }
            Entry::Present(record) => {
                info!(
                    table,
                    key = %key,
                    cached_generated_at = %record.generated_at,
                    "Cache stale, refreshing"
                );
                Some(record)
            }
            Entry::Unreadable => {
                unreadable = true;
                None
            }
            Entry::Absent => {
                info!(table, key = %key, "Cache miss");
                None
            }
        };

        let start = Instant::now();
        let fetched = match self.adapter.fetch(input).await {
            Ok(fetched) => fetched,
            Err(e) => {
                warn!(
                    table,
                    key = %key,
                    kind = e.kind(),
                    upstream_status = e.status(),
                    error = %e,
                    "Upstream fetch failed"
                );
                if self.serve_stale_on_error
                    && let Some(record) = stale
                {
                    warn!(
                        table,
                        key = %key,
                        cached_generated_at = %record.generated_at,
                        "Serving stale record after failed refresh"
                    );
                    return Ok(resolve::<D>(record, Source::Stale));
                }
                return Err(e.into());
            }
        };
        warn_if_slow(start, SLOW_FETCH_THRESHOLD, table, key.as_str());

        let generated_at = self.clock.now();
        let record = CacheRecord {
            payload: D::build_payload(input, fetched, generated_at),
            key,
            generated_at,
        };
        // An unreadable row may carry a timestamp ahead of the clock; replace it outright.
        if unreadable {
            self.store.overwrite(&record).await?;
        } else {
            self.store.upsert(&record).await?;
        }

        Ok(resolve::<D>(record, Source::Upstream))
    }
}

fn resolve<D: CacheDomain>(record: CacheRecord<D::Payload>, source: Source) -> Resolved<D::Payload> {
    Resolved {
        payload: D::tag(record.payload, source),
        source,
        generated_at: record.generated_at,
    }
}
