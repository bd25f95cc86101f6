use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PhashError {
    #[error("{0}")]
    Validation(String),

    #[error("Object {key} not found in bucket {bucket}")]
    NotFound { bucket: String, key: String },

    #[error("Failed to fetch object: {0}")]
    Fetch(String),

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PhashError {
    pub fn bucket_not_allowed(bucket: &str) -> Self {
        PhashError::Validation(format!("Bucket {} is not allowed", bucket))
    }

    pub fn missing_key() -> Self {
        PhashError::Validation("No object/key provided".to_string())
    }

    /// Message returned to the caller in the `error` field
    pub fn message(&self) -> String {
        self.to_string()
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            PhashError::Validation(_) => StatusCode::BAD_REQUEST,
            PhashError::NotFound { .. } => StatusCode::NOT_FOUND,
            PhashError::Fetch(_) => StatusCode::BAD_GATEWAY,
            PhashError::Decode(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PhashError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for PhashError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            PhashError::Internal(msg) => tracing::error!("Internal error: {}", msg),
            PhashError::Fetch(msg) => tracing::warn!("Fetch error: {}", msg),
            _ => {}
        }

        let body = Json(json!({
            "error": self.message()
        }));

        (status, body).into_response()
    }
}
