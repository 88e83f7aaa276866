//! Process configuration, loaded once from the environment.

use figment::Figment;
use figment::providers::Env;
use fundu::DurationParser;
use serde::{Deserialize, Deserializer};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Level for this crate's logs when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// SQLite database file; its parent directory is created at startup.
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    #[serde(default = "default_weather_api_base_url")]
    pub weather_api_base_url: String,
    /// weather.gov rejects requests without an identifying User-Agent.
    #[serde(default = "default_user_agent")]
    pub weather_user_agent: String,
    #[serde(default = "default_forecast_cache_ttl", deserialize_with = "duration")]
    pub forecast_cache_ttl: Duration,
    #[serde(default = "default_forecast_http_timeout", deserialize_with = "duration")]
    pub forecast_http_timeout: Duration,

    #[serde(default = "default_zip_api_url")]
    pub zip_api_url: String,
    #[serde(default)]
    pub zipcodestack_api_key: Option<String>,
    #[serde(default = "default_zip_cache_ttl", deserialize_with = "duration")]
    pub zip_cache_ttl: Duration,
    #[serde(default = "default_zip_http_timeout", deserialize_with = "duration")]
    pub zip_http_timeout: Duration,

    /// Serve a stale record instead of a 502 when its refresh fails.
    #[serde(default)]
    pub serve_stale_on_error: bool,
    #[serde(default = "default_shutdown_timeout", deserialize_with = "duration")]
    pub shutdown_timeout: Duration,
}

impl Config {
    /// Extract configuration from process environment variables.
    pub fn load() -> Result<Self, figment::Error> {
        Self::from_figment(Figment::new().merge(Env::raw()))
    }

    pub fn from_figment(figment: Figment) -> Result<Self, figment::Error> {
        figment.extract()
    }

    /// Bound on a whole HTTP request: the longest upstream chain (two forecast
    /// calls, or one geocode call) plus headroom for storage and serialization.
    pub fn request_timeout(&self) -> Duration {
        let forecast_chain = self.forecast_http_timeout.saturating_mul(2);
        forecast_chain
            .max(self.zip_http_timeout)
            .saturating_add(REQUEST_TIMEOUT_HEADROOM)
    }
}

const REQUEST_TIMEOUT_HEADROOM: Duration = Duration::from_secs(10);

fn default_log_level() -> String {
    "info".to_owned()
}

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

fn default_port() -> u16 {
    8000
}

fn default_database_path() -> PathBuf {
    PathBuf::from(".data/weather.sqlite3")
}

fn default_weather_api_base_url() -> String {
    "https://api.weather.gov".to_owned()
}

fn default_user_agent() -> String {
    format!("geoforecast/{}", env!("CARGO_PKG_VERSION"))
}

fn default_forecast_cache_ttl() -> Duration {
    Duration::from_secs(10 * 60)
}

fn default_forecast_http_timeout() -> Duration {
    Duration::from_secs(15)
}

fn default_zip_api_url() -> String {
    "https://api.zipcodestack.com/v1/search".to_owned()
}

fn default_zip_cache_ttl() -> Duration {
    Duration::from_secs(30 * 24 * 60 * 60)
}

fn default_zip_http_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_shutdown_timeout() -> Duration {
    Duration::from_secs(8)
}

/// Accept plain seconds (`600`) or a unit-suffixed string (`10m`, `30d`).
fn duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Seconds(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Seconds(secs) => Ok(Duration::from_secs(secs)),
        Raw::Text(text) => parse_duration(&text).map_err(serde::de::Error::custom),
    }
}

fn parse_duration(text: &str) -> Result<Duration, String> {
    let parsed = DurationParser::with_all_time_units()
        .parse(text.trim())
        .map_err(|e| format!("invalid duration '{text}': {e}"))?;
    Duration::try_from(parsed).map_err(|e| format!("invalid duration '{text}': {e}"))
}
