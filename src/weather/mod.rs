//! Hourly forecast lookups for a coordinate pair.

pub mod client;

pub use client::{WeatherGovClient, normalize_period, parse_wind_speed_mph};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::cache::{CacheDomain, CacheKey, CacheTable, Column, ColumnValue};

/// A validated latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// One normalized hourly forecast period.
///
/// Every field is always serialized, as `null` when the provider omitted it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyPeriod {
    pub start_time: Option<String>,
    pub temperature: Option<Number>,
    pub temperature_unit: Option<String>,
    pub short_forecast: Option<String>,
    pub wind_speed_mph: Option<i64>,
    pub wind_direction: Option<String>,
    pub probability_of_precipitation: Option<Number>,
    pub relative_humidity: Option<Number>,
    pub icon: Option<String>,
}

/// The stored and returned forecast envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyForecast {
    pub generated_at: DateTime<Utc>,
    pub location: Coordinates,
    pub periods: Vec<HourlyPeriod>,
}

/// Forecast snapshots keyed by rounded coordinates.
pub struct ForecastDomain;

impl CacheDomain for ForecastDomain {
    type Input = Coordinates;
    type Fetched = Vec<HourlyPeriod>;
    type Payload = HourlyForecast;

    const TABLE: CacheTable = CacheTable {
        name: "forecast_snapshots",
        key_column: "location_key",
        columns: &[
            Column {
                name: "lat",
                sql_type: "REAL",
            },
            Column {
                name: "lon",
                sql_type: "REAL",
            },
        ],
    };

    fn derive_key(input: &Coordinates) -> CacheKey {
        CacheKey::coordinates(input.lat, input.lon)
    }

    fn build_payload(
        input: &Coordinates,
        periods: Vec<HourlyPeriod>,
        generated_at: DateTime<Utc>,
    ) -> HourlyForecast {
        HourlyForecast {
            generated_at,
            location: *input,
            periods,
        }
    }

    fn columns(payload: &HourlyForecast) -> Vec<ColumnValue> {
        vec![
            ColumnValue::Real(payload.location.lat),
            ColumnValue::Real(payload.location.lon),
        ]
    }
}
