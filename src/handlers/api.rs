use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
}

/// Health check
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "OK" })
}
