//! Decoding of provider response bodies.

use serde::de::DeserializeOwned;

use super::UpstreamError;

/// Decode a response body, reporting the serde path and a type summary on failure.
pub fn decode_body<T: DeserializeOwned>(url: &str, body: &str) -> Result<T, UpstreamError> {
    let jd = &mut serde_json::Deserializer::from_str(body);
    serde_path_to_error::deserialize(jd).map_err(|err| {
        let path = err.path().to_string();
        let inner = err.into_inner();
        let (line, column) = (inner.line(), inner.column());

        let msg = inner.to_string();
        let loc = format!(" at line {line} column {column}");
        let summary = describe_mismatch(msg.strip_suffix(&loc).unwrap_or(&msg));

        let detail = if path.is_empty() || path == "." {
            format!("{summary} (line {line} col {column})")
        } else {
            format!("at path '{path}': {summary} (line {line} col {column})")
        };

        UpstreamError::InvalidJson {
            url: url.to_owned(),
            detail,
        }
    })
}

/// Turn serde's "invalid type: X, expected Y" into "expected Y, got X".
fn describe_mismatch(error_msg: &str) -> String {
    if let Some(rest) = error_msg.strip_prefix("invalid type: ")
        && let Some((actual, expected)) = rest.split_once(", expected ")
    {
        return format!("expected {expected}, got {actual}");
    }
    error_msg.to_owned()
}
