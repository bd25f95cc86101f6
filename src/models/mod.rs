use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::error::PhashError;

/// Incoming invocation payload. Both fields are optional on the wire so that
/// validation, not deserialization, reports them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct PhashRequest {
    #[serde(default)]
    pub bucket: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
}

impl PhashRequest {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: Some(bucket.into()),
            key: Some(key.into()),
        }
    }

    pub fn bucket(&self) -> &str {
        self.bucket.as_deref().unwrap_or_default()
    }

    pub fn key(&self) -> &str {
        self.key.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PhashResult {
    /// Hex encoded perceptual hash
    pub phash: String,
    /// `[width, height]` in pixels
    #[schema(value_type = Vec<u32>, example = json!([640, 480]))]
    pub image_size: (u32, u32),
    /// CPU seconds spent hashing
    pub time_taken: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// What a single invocation hands back to its caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InvocationResponse {
    Success(PhashResult),
    Error(ErrorResponse),
}

impl InvocationResponse {
    pub fn is_error(&self) -> bool {
        matches!(self, InvocationResponse::Error(_))
    }
}

impl From<Result<PhashResult, PhashError>> for InvocationResponse {
    fn from(res: Result<PhashResult, PhashError>) -> Self {
        match res {
            Ok(result) => InvocationResponse::Success(result),
            Err(e) => InvocationResponse::Error(ErrorResponse { error: e.message() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_missing_fields_default_to_empty() {
        let req: PhashRequest = serde_json::from_value(json!({ "bucket": "photos" })).unwrap();
        assert_eq!(req.bucket(), "photos");
        assert_eq!(req.key(), "");

        let req: PhashRequest =
            serde_json::from_value(json!({ "bucket": null, "key": null })).unwrap();
        assert!(req.bucket().is_empty());
        assert!(req.key().is_empty());
    }

    #[test]
    fn test_success_shape() {
        let res = InvocationResponse::Success(PhashResult {
            phash: "c3c3c3c33c3c3c3c".to_string(),
            image_size: (640, 480),
            time_taken: 0.002,
        });
        let value = serde_json::to_value(&res).unwrap();
        assert_eq!(
            value,
            json!({
                "phash": "c3c3c3c33c3c3c3c",
                "image_size": [640, 480],
                "time_taken": 0.002
            })
        );
    }

    #[test]
    fn test_error_shape() {
        let res = InvocationResponse::from(Err(PhashError::missing_key()));
        assert!(res.is_error());
        assert_eq!(
            serde_json::to_value(&res).unwrap(),
            json!({ "error": "No object/key provided" })
        );
    }
}
