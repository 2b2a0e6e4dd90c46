use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use serde_json::{json, Value};

use crate::app::AppState;

/// GET /api/v1/health - liveness plus a database round trip
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = Utc::now();

    match state.health.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "timestamp": now,
                "services": { "database": "healthy" }
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "timestamp": now,
                    "services": { "database": "unhealthy" }
                })),
            )
        }
    }
}

/// GET /api/v1/ready
pub async fn ready() -> Json<Value> {
    Json(json!({ "status": "ready" }))
}

/// GET /api/v1/live
pub async fn live() -> Json<Value> {
    Json(json!({ "status": "alive" }))
}
