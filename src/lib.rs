pub mod api;
pub mod config;
pub mod infrastructure;
pub mod lambda;
pub mod models;
pub mod services;
pub mod utils;

use crate::services::invocation::PhashHandler;
use axum::{
    Json, Router,
    middleware::from_fn,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;

/// Path the Lambda Runtime Interface Emulator uses for invocations
pub const EMULATOR_INVOKE_PATH: &str = "/2015-03-31/functions/function/invocations";

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::invoke::invoke,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            models::PhashRequest,
            models::PhashResult,
            models::ErrorResponse,
            api::handlers::health::HealthResponse,
        )
    ),
    tags(
        (name = "phash", description = "Perceptual hashing of stored images"),
        (name = "system", description = "Service status")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub handler: Arc<PhashHandler>,
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .route("/health", get(api::handlers::health::health_check))
        .route("/invoke", post(api::handlers::invoke::invoke))
        .route(EMULATOR_INVOKE_PATH, post(api::handlers::invoke::invoke))
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
