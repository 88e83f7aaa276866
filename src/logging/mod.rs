//! Tracing subscriber setup and small log-formatting helpers.

use crate::cli::TracingFormat;
use crate::config::Config;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Configure and initialize logging for the application.
pub fn setup_logging(config: &Config, tracing_format: TracingFormat) {
    // `RUST_LOG` wins; otherwise only this crate logs below `warn`.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let base_level = &config.log_level;
        EnvFilter::new(format!("warn,geoforecast={base_level}"))
    });

    let registry = tracing_subscriber::registry().with(filter);
    match tracing_format {
        TracingFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(true).pretty())
            .init(),
        TracingFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .json()
                    .flatten_event(true)
                    .with_current_span(true),
            )
            .init(),
    }
}

/// Render a duration compactly for log fields, e.g. `1.94ms` or `2.34s`.
pub fn fmt_duration(d: Duration) -> String {
    format!("{d:.2?}")
}

/// Warn when an operation started at `start` ran past `threshold`.
pub fn warn_if_slow(start: Instant, threshold: Duration, table: &str, key: &str) {
    let elapsed = start.elapsed();
    if elapsed > threshold {
        tracing::warn!(
            table,
            key,
            duration = fmt_duration(elapsed),
            "Slow upstream fetch"
        );
    }
}
