//! Cached hourly forecast and ZIP geocode lookups.
//!
//! Both lookups share one cache-first engine ([`cache`]): a SQLite table per
//! domain, a freshness window, and an upstream adapter that is only called on
//! a miss or a stale record.

pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod geocode;
pub mod logging;
pub mod state;
pub mod upstream;
pub mod weather;
pub mod web;
