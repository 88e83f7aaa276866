//! Shared fixtures for integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use geoforecast::cache::Clock;
use geoforecast::upstream::{UpstreamAdapter, UpstreamError};
use geoforecast::weather::HourlyPeriod;
use serde_json::Number;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// A pool over a fresh SQLite file. Keep the `TempDir` alive for the test's duration.
pub async fn temp_pool() -> (TempDir, SqlitePool) {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let options = SqliteConnectOptions::new()
        .filename(dir.path().join("cache.sqlite3"))
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(options)
        .await
        .expect("failed to open test database");
    (dir, pool)
}

type Respond<O> = dyn Fn(usize) -> Result<O, UpstreamError> + Send + Sync;

/// Adapter that counts calls and answers from a closure given the 1-based call number.
pub struct StubAdapter<O> {
    calls: AtomicUsize,
    respond: Box<Respond<O>>,
}

impl<O: Send + 'static> StubAdapter<O> {
    pub fn new(
        respond: impl Fn(usize) -> Result<O, UpstreamError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            respond: Box::new(respond),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<I: Sync + ?Sized, O: Send + 'static> UpstreamAdapter<I> for StubAdapter<O> {
    type Output = O;

    async fn fetch(&self, _input: &I) -> Result<O, UpstreamError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        (self.respond)(call)
    }
}

/// Clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn starting_at(rfc3339: &str) -> Arc<Self> {
        let now = DateTime::parse_from_rfc3339(rfc3339)
            .expect("valid timestamp")
            .to_utc();
        Arc::new(Self {
            now: Mutex::new(now),
        })
    }

    pub fn advance(&self, by: TimeDelta) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// A period that records which adapter call produced it in its temperature.
pub fn period_for_call(call: usize) -> HourlyPeriod {
    HourlyPeriod {
        start_time: Some("2026-02-27T16:00:00-07:00".to_owned()),
        temperature: Some(Number::from(call as u64)),
        ..Default::default()
    }
}

pub fn upstream_unavailable() -> UpstreamError {
    UpstreamError::Status {
        status: 503,
        url: "https://api.weather.gov/points/39.7555,-105.2211".to_owned(),
    }
}
