use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::app::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub services: ServiceHealth,
}

#[derive(Serialize)]
pub struct ServiceHealth {
    pub database: String,
    pub face_api: String,
}

/// Health check endpoint - public
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<HealthResponse>) {
    let (db_result, face_result) = tokio::join!(
        sqlx::query("SELECT 1").fetch_one(&state.db),
        state.encoder.health_check(),
    );

    let db_status = if db_result.is_ok() { "ok" } else { "error" };
    let face_status = if !state.encoder.is_configured() {
        "unconfigured"
    } else if face_result.is_ok() {
        "ok"
    } else {
        "error"
    };

    // DB is critical, the face provider is degraded-only
    let status = if db_result.is_ok() && face_result.is_ok() {
        "healthy"
    } else if db_result.is_ok() {
        "degraded"
    } else {
        "unhealthy"
    };

    let status_code = if status == "unhealthy" {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (
        status_code,
        Json(HealthResponse {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            services: ServiceHealth {
                database: db_status.to_string(),
                face_api: face_status.to_string(),
            },
        }),
    )
}
