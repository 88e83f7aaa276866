//! ZipCodeStack client: resolves a postal code to coordinates, city and state.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::time::Duration;

use super::{ZipCode, ZipGeocode};
use crate::cache::Source;
use crate::upstream::{UpstreamAdapter, UpstreamError, build_http_client, get_json_object};

/// Client for the ZipCodeStack search API.
pub struct ZipCodeStackClient {
    http: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl ZipCodeStackClient {
    pub fn new(
        url: &str,
        api_key: Option<String>,
        timeout: Duration,
        user_agent: &str,
    ) -> reqwest::Result<Self> {
        Ok(Self {
            http: build_http_client(timeout, user_agent)?,
            url: url.to_owned(),
            api_key,
        })
    }

    /// Geocode a single postal code against the US dataset.
    pub async fn geocode(&self, zip: &ZipCode) -> Result<ZipGeocode, UpstreamError> {
        let mut request = self
            .http
            .get(&self.url)
            .query(&[("codes", zip.as_str()), ("country", "us")]);
        if let Some(key) = &self.api_key {
            request = request.query(&[("apikey", key.as_str())]);
        }

        let payload = get_json_object(request, &self.url).await?;
        parse_zip_payload(zip.as_str(), &payload)
    }
}

#[async_trait]
impl UpstreamAdapter<ZipCode> for ZipCodeStackClient {
    type Output = ZipGeocode;

    async fn fetch(&self, input: &ZipCode) -> Result<ZipGeocode, UpstreamError> {
        self.geocode(input).await
    }
}

/// Normalize a search response, taking the first match for `zip`.
///
/// Results are keyed by the submitted code. No matches (including the
/// provider's empty-array `results`) is [`UpstreamError::NoResult`]; a match
/// missing coordinates, city or state is [`UpstreamError::Incomplete`].
pub fn parse_zip_payload(zip: &str, payload: &Map<String, Value>) -> Result<ZipGeocode, UpstreamError> {
    let first = payload
        .get("results")
        .and_then(|results| results.get(zip))
        .and_then(Value::as_array)
        .and_then(|matches| matches.first())
        .ok_or_else(|| UpstreamError::NoResult(zip.to_owned()))?;

    let incomplete = || UpstreamError::Incomplete(zip.to_owned());
    let text = |field: &str| {
        first
            .get(field)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    };

    let lat = coordinate(first.get("latitude")).ok_or_else(incomplete)?;
    let lon = coordinate(first.get("longitude")).ok_or_else(incomplete)?;
    let city = text("city").ok_or_else(incomplete)?;
    let state = text("state_code").or_else(|| text("state")).ok_or_else(incomplete)?;

    Ok(ZipGeocode {
        zip: zip.to_owned(),
        lat,
        lon,
        city: city.to_owned(),
        state: state.to_owned(),
        source: Source::Upstream,
    })
}

/// Coordinates arrive as numbers, occasionally as numeric strings.
fn coordinate(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn golden_match() -> Value {
        json!({
            "postal_code": "80401",
            "country_code": "US",
            "latitude": 39.7555,
            "longitude": -105.2211,
            "city": "Golden",
            "state": "Colorado",
            "state_code": "CO",
            "province": "Jefferson",
            "province_code": "059"
        })
    }

    #[test]
    fn test_parse_first_match() {
        let payload = object(json!({
            "query": {"codes": ["80401"], "country": "us"},
            "results": {"80401": [golden_match(), {"latitude": 0, "longitude": 0, "city": "Other", "state_code": "XX"}]}
        }));

        let geocode = parse_zip_payload("80401", &payload).unwrap();
        assert_eq!(
            geocode,
            ZipGeocode {
                zip: "80401".to_owned(),
                lat: 39.7555,
                lon: -105.2211,
                city: "Golden".to_owned(),
                state: "CO".to_owned(),
                source: Source::Upstream,
            }
        );
    }

    #[test]
    fn test_parse_falls_back_to_state_name() {
        let mut entry = golden_match();
        entry["state_code"] = Value::Null;
        let payload = object(json!({"results": {"80401": [entry]}}));

        assert_eq!(parse_zip_payload("80401", &payload).unwrap().state, "Colorado");
    }

    #[test]
    fn test_parse_accepts_string_coordinates() {
        let mut entry = golden_match();
        entry["latitude"] = json!("39.7555");
        entry["longitude"] = json!("-105.2211");
        let payload = object(json!({"results": {"80401": [entry]}}));

        let geocode = parse_zip_payload("80401", &payload).unwrap();
        assert_eq!((geocode.lat, geocode.lon), (39.7555, -105.2211));
    }

    #[test]
    fn test_parse_empty_match_list_is_no_result() {
        let payload = object(json!({"results": {"80401": []}}));
        let err = parse_zip_payload("80401", &payload).unwrap_err();
        assert!(matches!(err, UpstreamError::NoResult(ref zip) if zip == "80401"));
    }

    #[test]
    fn test_parse_empty_results_array_is_no_result() {
        let payload = object(json!({"query": {"codes": ["00000"]}, "results": []}));
        let err = parse_zip_payload("00000", &payload).unwrap_err();
        assert_eq!(err.kind(), "no_result");
    }

    #[test]
    fn test_parse_other_zip_only_is_no_result() {
        let payload = object(json!({"results": {"80402": [golden_match()]}}));
        assert_eq!(parse_zip_payload("80401", &payload).unwrap_err().kind(), "no_result");
    }

    #[test]
    fn test_parse_missing_required_fields_is_incomplete() {
        for field in ["latitude", "longitude", "city"] {
            let mut entry = golden_match();
            entry[field] = Value::Null;
            let payload = object(json!({"results": {"80401": [entry]}}));
            let err = parse_zip_payload("80401", &payload).unwrap_err();
            assert_eq!(err.kind(), "incomplete", "missing {field}");
        }

        let mut entry = golden_match();
        entry["state_code"] = json!("");
        entry["state"] = Value::Null;
        let payload = object(json!({"results": {"80401": [entry]}}));
        assert_eq!(parse_zip_payload("80401", &payload).unwrap_err().kind(), "incomplete");
    }
}
