//! JSON error responses for the lookup API.
//!
//! Every error body has an `error` code and a human `message`; some carry
//! extra context fields (the rejected input, the upstream status).

use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::{Map, Value};
use tracing::error;

use crate::cache::LookupError;

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    details: Map<String, Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            details: Map::new(),
        }
    }

    /// Attach an extra top-level field to the error body.
    pub fn with_detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.details.insert(key.to_owned(), value.into());
        self
    }

    pub fn invalid_latitude(lat: f64) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "invalid_latitude",
            "Latitude must be between -90 and 90.",
        )
        .with_detail("lat", lat)
    }

    pub fn invalid_longitude(lon: f64) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "invalid_longitude",
            "Longitude must be between -180 and 180.",
        )
        .with_detail("lon", lon)
    }

    pub fn invalid_query(rejection: QueryRejection) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "invalid_query",
            rejection.body_text(),
        )
    }

    pub fn invalid_zip(zip: &str) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "invalid_zip",
            "ZIP must be exactly 5 digits.",
        )
        .with_detail("zip", zip)
    }

    pub fn upstream_error(message: &str) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, "upstream_error", message)
    }

    pub fn internal_error(message: &str) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = Map::with_capacity(self.details.len() + 2);
        body.insert("error".to_owned(), Value::from(self.code));
        body.insert("message".to_owned(), Value::from(self.message));
        body.extend(self.details);
        (self.status, Json(Value::Object(body))).into_response()
    }
}

/// Map a storage failure to a 500, logging the cause.
pub fn storage_error(context: &str, e: LookupError) -> ApiError {
    error!(error = ?e, "{context} failed");
    ApiError::internal_error("Internal storage error")
}
