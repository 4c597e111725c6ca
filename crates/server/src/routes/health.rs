use axum::{Json, extract::State, http::StatusCode};

use flashme_api::HealthResponse;

use crate::storage::Db;

/// GET /api/health: liveness plus a trivial SQLite round trip.
pub async fn health(State(db): State<Db>) -> (StatusCode, Json<HealthResponse>) {
    let reachable = db
        .conn()
        .query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
        .inspect_err(|e| tracing::error!("health check query failed: {e}"))
        .is_ok();

    let (status, label) = if reachable {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };
    (
        status,
        Json(HealthResponse {
            status: label.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}
