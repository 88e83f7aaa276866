//! Canonical cache keys.

use std::fmt;

/// A canonical, domain-specific cache key. Unique per table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Key for a coordinate pair: both values rounded to 4 decimal places (~11 m).
    pub fn coordinates(lat: f64, lon: f64) -> Self {
        Self(format!("{lat:.4},{lon:.4}"))
    }

    /// Key for a postal code. Callers validate the 5-digit shape beforehand.
    pub fn zip(zip: &str) -> Self {
        Self(zip.to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
