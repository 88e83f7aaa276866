//! weather.gov client: resolves a coordinate pair to its hourly forecast.
//!
//! Two chained calls: `/points/{lat},{lon}` yields the grid's
//! `forecastHourly` URL, which is then fetched and normalized.

use async_trait::async_trait;
use regex::Regex;
use serde_json::{Map, Number, Value};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::debug;

use super::{Coordinates, HourlyPeriod};
use crate::upstream::{UpstreamAdapter, UpstreamError, build_http_client, get_json_object};

static WIND_SPEED_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("valid wind speed pattern"));

/// Client for the weather.gov hourly forecast API.
pub struct WeatherGovClient {
    http: reqwest::Client,
    base_url: String,
}

impl WeatherGovClient {
    pub fn new(base_url: &str, timeout: Duration, user_agent: &str) -> reqwest::Result<Self> {
        Ok(Self {
            http: build_http_client(timeout, user_agent)?,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    /// Fetch and normalize the hourly periods for a coordinate pair.
    ///
    /// A points payload without a usable `forecastHourly` URL is an error; an
    /// hourly payload without a period list yields no periods.
    pub async fn fetch_hourly_periods(
        &self,
        coords: Coordinates,
    ) -> Result<Vec<HourlyPeriod>, UpstreamError> {
        let points_url = format!("{}/points/{},{}", self.base_url, coords.lat, coords.lon);
        let points = get_json_object(self.get(&points_url), &points_url).await?;

        let properties = points
            .get("properties")
            .and_then(Value::as_object)
            .ok_or(UpstreamError::MissingField("properties"))?;
        let hourly_url = properties
            .get("forecastHourly")
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty())
            .ok_or(UpstreamError::MissingField("properties.forecastHourly"))?;

        let hourly = get_json_object(self.get(hourly_url), hourly_url).await?;
        let Some(periods) = hourly
            .get("properties")
            .and_then(Value::as_object)
            .and_then(|p| p.get("periods"))
            .and_then(Value::as_array)
        else {
            debug!(url = hourly_url, "Hourly payload has no periods");
            return Ok(Vec::new());
        };

        Ok(periods
            .iter()
            .filter_map(Value::as_object)
            .map(normalize_period)
            .collect())
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.http
            .get(url)
            .header(reqwest::header::ACCEPT, "application/geo+json")
    }
}

#[async_trait]
impl UpstreamAdapter<Coordinates> for WeatherGovClient {
    type Output = Vec<HourlyPeriod>;

    async fn fetch(&self, input: &Coordinates) -> Result<Vec<HourlyPeriod>, UpstreamError> {
        self.fetch_hourly_periods(*input).await
    }
}

/// Normalize one raw `properties.periods[]` entry. Missing or mistyped fields become `None`.
pub fn normalize_period(period: &Map<String, Value>) -> HourlyPeriod {
    let text = |field: &str| period.get(field).and_then(Value::as_str).map(str::to_owned);

    HourlyPeriod {
        start_time: text("startTime"),
        temperature: number(period.get("temperature")),
        temperature_unit: text("temperatureUnit"),
        short_forecast: text("shortForecast"),
        wind_speed_mph: parse_wind_speed_mph(period.get("windSpeed").and_then(Value::as_str)),
        wind_direction: text("windDirection"),
        probability_of_precipitation: measurement(period.get("probabilityOfPrecipitation")),
        relative_humidity: measurement(period.get("relativeHumidity")),
        icon: text("icon"),
    }
}

/// Parse a wind speed like `"5 mph"` or `"5 to 10 mph"` into whole mph.
///
/// A range yields the average of its first two numbers, rounded half to even.
pub fn parse_wind_speed_mph(wind_speed: Option<&str>) -> Option<i64> {
    let mut speeds = WIND_SPEED_PATTERN
        .find_iter(wind_speed?)
        .filter_map(|m| m.as_str().parse::<i64>().ok());

    let first = speeds.next()?;
    let Some(second) = speeds.next() else {
        return Some(first);
    };

    let sum = first + second;
    let half = sum / 2;
    if sum % 2 == 0 || half % 2 == 0 {
        Some(half)
    } else {
        Some(half + 1)
    }
}

/// Read the numeric `value` of a `{"value": ..., "unitCode": ...}` measurement.
fn measurement(value: Option<&Value>) -> Option<Number> {
    number(value?.as_object()?.get("value"))
}

fn number(value: Option<&Value>) -> Option<Number> {
    match value {
        Some(Value::Number(n)) => Some(n.clone()),
        _ => None,
    }
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

    #[test]
    fn test_wind_speed_single_value() {
        assert_eq!(parse_wind_speed_mph(Some("5 mph")), Some(5));
    }

    #[test]
    fn test_wind_speed_range_rounds_half_to_even() {
        assert_eq!(parse_wind_speed_mph(Some("5 to 10 mph")), Some(8));
        assert_eq!(parse_wind_speed_mph(Some("4 to 5 mph")), Some(4));
        assert_eq!(parse_wind_speed_mph(Some("10 to 15 mph")), Some(12));
        assert_eq!(parse_wind_speed_mph(Some("10 to 20 mph")), Some(15));
    }

    #[test]
    fn test_wind_speed_uses_first_two_numbers() {
        assert_eq!(parse_wind_speed_mph(Some("5 to 10 mph, gusts 30")), Some(8));
    }

    #[test]
    fn test_wind_speed_absent() {
        assert_eq!(parse_wind_speed_mph(Some("")), None);
        assert_eq!(parse_wind_speed_mph(Some("calm")), None);
        assert_eq!(parse_wind_speed_mph(None), None);
    }

    #[test]
    fn test_normalize_full_period() {
        let period = object(json!({
            "number": 1,
            "startTime": "2026-02-27T16:00:00-07:00",
            "temperature": 32,
            "temperatureUnit": "F",
            "shortForecast": "Snow Showers Likely",
            "windSpeed": "5 mph",
            "windDirection": "NW",
            "probabilityOfPrecipitation": {"unitCode": "wmoUnit:percent", "value": 70},
            "relativeHumidity": {"unitCode": "wmoUnit:percent", "value": 63},
            "icon": "https://api.weather.gov/icons/land/day/snow,70?size=small"
        }));

        let normalized = normalize_period(&period);
        assert_eq!(
            serde_json::to_value(&normalized).unwrap(),
            json!({
                "startTime": "2026-02-27T16:00:00-07:00",
                "temperature": 32,
                "temperatureUnit": "F",
                "shortForecast": "Snow Showers Likely",
                "windSpeedMph": 5,
                "windDirection": "NW",
                "probabilityOfPrecipitation": 70,
                "relativeHumidity": 63,
                "icon": "https://api.weather.gov/icons/land/day/snow,70?size=small"
            })
        );
    }

    #[test]
    fn test_normalize_missing_fields_are_none() {
        let period = object(json!({
            "startTime": "2026-02-27T18:00:00-07:00",
            "temperature": 28,
            "temperatureUnit": "F",
            "shortForecast": "Mostly Cloudy"
        }));

        let normalized = normalize_period(&period);
        assert_eq!(normalized.start_time.as_deref(), Some("2026-02-27T18:00:00-07:00"));
        assert_eq!(normalized.temperature, Some(Number::from(28)));
        assert_eq!(normalized.wind_speed_mph, None);
        assert_eq!(normalized.probability_of_precipitation, None);
        assert_eq!(normalized.relative_humidity, None);
        assert_eq!(normalized.icon, None);
    }

    #[test]
    fn test_normalize_null_measurement_value() {
        let period = object(json!({
            "probabilityOfPrecipitation": {"unitCode": "wmoUnit:percent", "value": null},
            "relativeHumidity": 63
        }));

        let normalized = normalize_period(&period);
        assert_eq!(normalized.probability_of_precipitation, None);
        assert_eq!(normalized.relative_humidity, None);
    }
}
