use std::sync::Arc;
use tracing::{Instrument, info, info_span, warn};

use crate::api::error::PhashError;
use crate::config::PhashConfig;
use crate::models::{InvocationResponse, PhashRequest, PhashResult};
use crate::services::fetcher::ObjectFetcher;
use crate::services::phash::PhashService;
use crate::services::storage::ObjectStore;
use crate::utils::validation::validate_request;

/// One invocation: validate, fetch, hash, clean up
pub struct PhashHandler {
    config: PhashConfig,
    fetcher: ObjectFetcher,
    hasher: PhashService,
}

impl PhashHandler {
    pub fn new(config: PhashConfig, store: Arc<dyn ObjectStore>) -> Self {
        let fetcher = ObjectFetcher::new(
            store,
            config.scratch_dir.clone(),
            config.max_object_size,
        );
        Self {
            config,
            fetcher,
            hasher: PhashService::new(),
        }
    }

    pub fn config(&self) -> &PhashConfig {
        &self.config
    }

    /// Run the pipeline and render the outcome as the response record.
    /// Never fails; errors become `{"error": ...}`.
    pub async fn handle(&self, request: PhashRequest) -> InvocationResponse {
        let span = info_span!("invocation", bucket = %request.bucket(), key = %request.key());
        let result = self.process(&request).instrument(span).await;

        if let Err(e) = &result {
            match e {
                PhashError::Validation(msg) => info!("Rejected request: {}", msg),
                other => warn!("Invocation failed: {}", other),
            }
        }

        InvocationResponse::from(result)
    }

    pub async fn process(&self, request: &PhashRequest) -> Result<PhashResult, PhashError> {
        let validated = validate_request(request, &self.config.allowed_buckets)?;
        let scratch = self.fetcher.fetch(&validated).await?;

        // Decoding and hashing are CPU bound; keep them off the runtime
        // threads. The scratch file travels with the job and is removed
        // there whether hashing succeeded or not.
        let hasher = self.hasher;
        let outcome = run_blocking(move || {
            let result = hasher.hash_file(scratch.path());
            let scratch_path = scratch.to_path_buf();
            if let Err(e) = scratch.remove() {
                warn!(
                    "Failed to remove scratch file {}: {}",
                    scratch_path.display(),
                    e
                );
            }
            result
        })
        .await?;

        let result = outcome?;
        info!(
            "pHash {} for {}x{} image in {:.6}s",
            result.phash, result.image_size.0, result.image_size.1, result.time_taken
        );
        Ok(result)
    }
}

/// Run a job on the blocking pool. A job that panics surfaces as
/// `Internal` instead of tearing down the invocation.
async fn run_blocking<F, T>(job: F) -> Result<T, PhashError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|e| PhashError::Internal(format!("Hashing task failed: {}", e)))
}
