//! Freshness evaluation and the clock it reads.

use chrono::{DateTime, TimeDelta, Utc};

/// Source of "now" for freshness checks and record timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock UTC time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Whether a record generated at `generated_at` is still within `ttl` at `now`.
pub fn is_fresh(generated_at: DateTime<Utc>, ttl: TimeDelta, now: DateTime<Utc>) -> bool {
    now.signed_duration_since(generated_at) < ttl
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339).unwrap().to_utc()
    }

    #[test]
    fn test_within_ttl_is_fresh() {
        let generated = at("2026-02-27T16:00:00Z");
        assert!(is_fresh(
            generated,
            TimeDelta::minutes(10),
            at("2026-02-27T16:09:59Z")
        ));
    }

    #[test]
    fn test_exactly_ttl_is_stale() {
        let generated = at("2026-02-27T16:00:00Z");
        assert!(!is_fresh(
            generated,
            TimeDelta::minutes(10),
            at("2026-02-27T16:10:00Z")
        ));
    }

    #[test]
    fn test_past_ttl_is_stale() {
        let generated = at("2026-01-01T00:00:00Z");
        assert!(!is_fresh(
            generated,
            TimeDelta::days(30),
            at("2026-02-27T16:00:00Z")
        ));
    }

    #[test]
    fn test_future_timestamp_is_fresh() {
        let generated = at("2026-02-27T16:05:00Z");
        assert!(is_fresh(
            generated,
            TimeDelta::minutes(10),
            at("2026-02-27T16:00:00Z")
        ));
    }
}
