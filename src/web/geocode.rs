//! ZIP geocode handler.

use axum::extract::{Path, State};
use axum::response::Json;

use crate::cache::LookupError;
use crate::geocode::{ZipCode, ZipGeocode};
use crate::state::AppState;
use crate::web::error::{ApiError, storage_error};

/// `GET /api/geocode/zip/{zip}`
pub(super) async fn zip_geocode(
    State(state): State<AppState>,
    Path(raw_zip): Path<String>,
) -> Result<Json<ZipGeocode>, ApiError> {
    let zip = ZipCode::parse(&raw_zip).ok_or_else(|| ApiError::invalid_zip(&raw_zip))?;

    let resolved = state.geocodes.lookup(&zip).await.map_err(|e| match e {
        LookupError::Upstream(_) => ApiError::upstream_error("Unable to resolve ZIP right now."),
        e => storage_error("ZIP lookup", e),
    })?;

    Ok(Json(resolved.payload))
}
