//! Health check handler

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub database: &'static str,
}

/// Reports 503 when the database cannot be reached
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database_up = sqlx::query("SELECT 1").execute(&state.db).await.is_ok();

    let (code, status, database) = if database_up {
        (StatusCode::OK, "healthy", "connected")
    } else {
        tracing::warn!("Health check could not reach the database");
        (StatusCode::SERVICE_UNAVAILABLE, "degraded", "disconnected")
    };

    (
        code,
        Json(HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION"),
            database,
        }),
    )
}
