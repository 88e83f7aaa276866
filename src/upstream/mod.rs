//! Upstream provider plumbing shared by the weather and geocode clients.

mod errors;
pub mod json;

pub use errors::UpstreamError;

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::trace;

/// Fetches a normalized value for one lookup input from an external provider.
///
/// Implementations perform one or more HTTP calls and must classify every
/// failure as an [`UpstreamError`]; they never retry.
#[async_trait]
pub trait UpstreamAdapter<I: Sync + ?Sized>: Send + Sync {
    type Output: Send;

    async fn fetch(&self, input: &I) -> Result<Self::Output, UpstreamError>;
}

/// Build an HTTP client bounded by a per-request timeout.
pub fn build_http_client(timeout: Duration, user_agent: &str) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()
}

/// Send a request and decode the body as a JSON object.
///
/// Transport failures (including timeouts), non-success statuses, bodies that
/// are not JSON, and JSON that is not an object are all classified here.
pub async fn get_json_object(
    request: reqwest::RequestBuilder,
    url: &str,
) -> Result<Map<String, Value>, UpstreamError> {
    let transport = |source| UpstreamError::Transport {
        url: url.to_owned(),
        source,
    };

    let response = request.send().await.map_err(transport)?;
    let status = response.status();
    trace!(url, status = status.as_u16(), "upstream response");

    if !status.is_success() {
        return Err(UpstreamError::Status {
            status: status.as_u16(),
            url: url.to_owned(),
        });
    }

    let body = response.text().await.map_err(transport)?;
    match json::decode_body::<Value>(url, &body)? {
        Value::Object(map) => Ok(map),
        other => Err(UpstreamError::InvalidJson {
            url: url.to_owned(),
            detail: format!("expected a JSON object, got {}", json_type_name(&other)),
        }),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
