use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    response::{IntoResponse, Response},
};

use crate::AppState;
use crate::api::error::PhashError;
use crate::models::{ErrorResponse, PhashRequest, PhashResult};

/// Hash one stored image, mirroring a direct function invocation
#[utoipa::path(
    post,
    path = "/invoke",
    request_body = PhashRequest,
    responses(
        (status = 200, description = "Perceptual hash computed", body = PhashResult),
        (status = 400, description = "Bucket not allowed or key missing", body = ErrorResponse),
        (status = 404, description = "Object not found", body = ErrorResponse),
        (status = 422, description = "Object is not a decodable image", body = ErrorResponse),
        (status = 502, description = "Object store failure", body = ErrorResponse)
    ),
    tag = "phash"
)]
pub async fn invoke(
    State(state): State<AppState>,
    payload: Result<Json<PhashRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(json) => json,
        Err(rejection) => {
            return PhashError::Validation(format!("Invalid request: {}", rejection.body_text()))
                .into_response();
        }
    };

    match state.handler.process(&request).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => e.into_response(),
    }
}
