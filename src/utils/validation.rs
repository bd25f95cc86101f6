use crate::api::error::PhashError;
use crate::config::AllowList;
use crate::models::PhashRequest;

/// A request that passed validation; the only way to reach the object store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub bucket: String,
    pub key: String,
}

/// Check a request against the allow-list.
///
/// The bucket is checked before the key, so a request failing both reports
/// the bucket.
pub fn validate_request(
    request: &PhashRequest,
    allowed: &AllowList,
) -> Result<ValidatedRequest, PhashError> {
    let bucket = request.bucket();
    if !allowed.contains(bucket) {
        return Err(PhashError::bucket_not_allowed(bucket));
    }

    let key = request.key();
    if key.is_empty() {
        return Err(PhashError::missing_key());
    }

    Ok(ValidatedRequest {
        bucket: bucket.to_string(),
        key: key.to_string(),
    })
}
