//! Health handler.

use axum::extract::State;
use axum::response::Json;
use serde_json::{Value, json};
use tracing::{trace, warn};

use crate::state::AppState;

/// `GET /api/health`
pub(super) async fn health(State(state): State<AppState>) -> Json<Value> {
    trace!("health check requested");

    let database = match sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&state.db_pool)
        .await
    {
        Ok(_) => "ok",
        Err(e) => {
            warn!(error = ?e, "Database ping failed");
            "unavailable"
        }
    };

    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "commit": env!("GIT_COMMIT_HASH"),
        "database": database,
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
