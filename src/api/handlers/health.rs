use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;
use crate::AppState;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub allowed_buckets: Vec<String>,
    pub version: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service health status", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let allowed_buckets = state
        .handler
        .config()
        .allowed_buckets
        .iter()
        .map(str::to_string)
        .collect();

    Json(HealthResponse {
        status: "ok".to_string(),
        allowed_buckets,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
