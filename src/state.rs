//! Application state shared across request handlers.

use sqlx::SqlitePool;
use std::sync::Arc;

use crate::cache::RefreshCoordinator;
use crate::geocode::ZipDomain;
use crate::weather::ForecastDomain;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub forecasts: Arc<RefreshCoordinator<ForecastDomain>>,
    pub geocodes: Arc<RefreshCoordinator<ZipDomain>>,
}

impl AppState {
    pub fn new(
        db_pool: SqlitePool,
        forecasts: RefreshCoordinator<ForecastDomain>,
        geocodes: RefreshCoordinator<ZipDomain>,
    ) -> Self {
        Self {
            db_pool,
            forecasts: Arc::new(forecasts),
            geocodes: Arc::new(geocodes),
        }
    }
}
