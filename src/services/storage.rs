use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::operation::get_object::GetObjectError;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::io::AsyncRead;

use crate::api::error::PhashError;

/// Readable body of a stored object
pub struct ObjectBody {
    /// Size reported by the store, when it reports one
    pub content_length: Option<u64>,
    pub reader: Box<dyn AsyncRead + Unpin + Send>,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Open the object for reading. Fails with `NotFound` when the key does
    /// not exist and `Fetch` for any other store failure.
    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectBody, PhashError>;
}

pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectBody, PhashError> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| map_get_object_error(e, bucket, key))?;

        let content_length = output
            .content_length()
            .and_then(|len| u64::try_from(len).ok());

        Ok(ObjectBody {
            content_length,
            reader: Box::new(output.body.into_async_read()),
        })
    }
}

fn map_get_object_error(
    err: SdkError<GetObjectError>,
    bucket: &str,
    key: &str,
) -> PhashError {
    match &err {
        SdkError::TimeoutError(_) => {
            tracing::error!("S3 get_object timed out: bucket={}, key={}", bucket, key);
            return PhashError::Fetch("Object store request timed out".to_string());
        }
        SdkError::DispatchFailure(_) => {
            tracing::error!(
                "S3 get_object dispatch failed: bucket={}, key={}, error={}",
                bucket,
                key,
                DisplayErrorContext(&err)
            );
            return PhashError::Fetch(format!(
                "Could not reach object store: {}",
                DisplayErrorContext(&err)
            ));
        }
        _ => {}
    }

    let service_error = err.into_service_error();
    if service_error.is_no_such_key() {
        return PhashError::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        };
    }

    tracing::error!(
        "S3 get_object failed: bucket={}, key={}, code={:?}, error={}",
        bucket,
        key,
        service_error.code(),
        DisplayErrorContext(&service_error)
    );

    match service_error.code() {
        Some("NoSuchBucket") => PhashError::Fetch(format!("Bucket {} does not exist", bucket)),
        Some("AccessDenied") => PhashError::Fetch(format!("Access denied to bucket {}", bucket)),
        _ => PhashError::Fetch(service_error.to_string()),
    }
}

/// Object store backed by a map, for local runs and tests
#[derive(Default)]
pub struct InMemoryObjectStore {
    objects: Mutex<HashMap<(String, String), Vec<u8>>>,
    requests: AtomicUsize,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, bucket: &str, key: &str, data: Vec<u8>) {
        // Plain data; a poisoned map is still consistent.
        self.objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((bucket.to_string(), key.to_string()), data);
    }

    /// Number of `get_object` calls seen so far
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectBody, PhashError> {
        self.requests.fetch_add(1, Ordering::SeqCst);

        let data = self
            .objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| PhashError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })?;

        Ok(ObjectBody {
            content_length: Some(data.len() as u64),
            reader: Box::new(std::io::Cursor::new(data)),
        })
    }
}
