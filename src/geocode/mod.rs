//! Postal code → coordinate lookups.

pub mod client;

pub use client::{ZipCodeStackClient, parse_zip_payload};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::{CacheDomain, CacheKey, CacheTable, Column, ColumnValue, Source};

/// A validated 5-digit postal code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipCode(String);

impl ZipCode {
    /// Accept exactly five ASCII digits.
    pub fn parse(raw: &str) -> Option<Self> {
        (raw.len() == 5 && raw.bytes().all(|b| b.is_ascii_digit())).then(|| Self(raw.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Normalized geocode result, as stored and returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZipGeocode {
    pub zip: String,
    pub lat: f64,
    pub lon: f64,
    pub city: String,
    pub state: String,
    pub source: Source,
}

/// Geocodes keyed by the postal code itself.
pub struct ZipDomain;

impl CacheDomain for ZipDomain {
    type Input = ZipCode;
    type Fetched = ZipGeocode;
    type Payload = ZipGeocode;

    const TABLE: CacheTable = CacheTable {
        name: "zip_cache",
        key_column: "zip",
        columns: &[
            Column {
                name: "city",
                sql_type: "TEXT",
            },
            Column {
                name: "state",
                sql_type: "TEXT",
            },
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

    fn derive_key(input: &ZipCode) -> CacheKey {
        CacheKey::zip(input.as_str())
    }

    fn build_payload(_input: &ZipCode, fetched: ZipGeocode, _generated_at: DateTime<Utc>) -> ZipGeocode {
        fetched
    }

    fn columns(payload: &ZipGeocode) -> Vec<ColumnValue> {
        vec![
            ColumnValue::Text(payload.city.clone()),
            ColumnValue::Text(payload.state.clone()),
            ColumnValue::Real(payload.lat),
            ColumnValue::Real(payload.lon),
        ]
    }

    fn tag(payload: ZipGeocode, source: Source) -> ZipGeocode {
        ZipGeocode { source, ..payload }
    }
}
