//! Hourly forecast handler.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::HeaderValue;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;

use crate::cache::LookupError;
use crate::state::AppState;
use crate::weather::Coordinates;
use crate::web::error::{ApiError, storage_error};
use crate::web::routes::X_CACHE;

#[derive(Debug, Deserialize)]
pub struct HourlyParams {
    lat: f64,
    lon: f64,
}

/// `GET /api/weather/hourly?lat=..&lon=..`
pub(super) async fn hourly_forecast(
    State(state): State<AppState>,
    params: Result<Query<HourlyParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(HourlyParams { lat, lon }) = params.map_err(ApiError::invalid_query)?;
    if !(-90.0..=90.0).contains(&lat) {
        return Err(ApiError::invalid_latitude(lat));
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err(ApiError::invalid_longitude(lon));
    }

    let resolved = state
        .forecasts
        .lookup(&Coordinates { lat, lon })
        .await
        .map_err(|e| match e {
            LookupError::Upstream(e) => {
                ApiError::upstream_error("Unable to load hourly forecast right now.")
                    .with_detail("upstream_status", e.status())
            }
            e => storage_error("Forecast lookup", e),
        })?;

    let mut response = Json(resolved.payload).into_response();
    response
        .headers_mut()
        .insert(X_CACHE, HeaderValue::from_static(resolved.source.as_str()));
    Ok(response)
}
