//! Web API router construction.

use axum::Router;
use axum::http::HeaderName;
use axum::routing::get;
use std::time::Duration;
use tower_http::compression::CompressionLayer;
use tower_http::timeout::TimeoutLayer;

use crate::state::AppState;
use crate::web::middleware::request_id::RequestIdLayer;
use crate::web::{geocode, status, weather};

/// Response header naming where a lookup was served from (`cache`, `upstream`, `stale`).
pub const X_CACHE: HeaderName = HeaderName::from_static("x-cache");

/// Creates the web server router.
///
/// `request_timeout` bounds a whole request; it must exceed every upstream
/// call chain so slow providers surface as classified errors, not timeouts.
pub fn create_router(app_state: AppState, request_timeout: Duration) -> Router {
    let api_router = Router::new()
        .route("/health", get(status::health))
        .route("/weather/hourly", get(weather::hourly_forecast))
        .route("/geocode/zip/{zip}", get(geocode::zip_geocode))
        .with_state(app_state);

    Router::new().nest("/api", api_router).layer((
        // Outermost: per-request ID span + severity-proportional response logging.
        RequestIdLayer,
        CompressionLayer::new()
            .zstd(true)
            .br(true)
            .gzip(true)
            .quality(tower_http::CompressionLevel::Fastest),
        TimeoutLayer::new(request_timeout),
    ))
}
