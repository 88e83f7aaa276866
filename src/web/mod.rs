//! HTTP API for the forecast and geocode lookups.

pub mod error;
mod geocode;
pub mod middleware;
pub mod routes;
mod status;
mod weather;

pub use routes::*;
