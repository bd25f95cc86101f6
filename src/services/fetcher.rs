use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, info};

use crate::api::error::PhashError;
use crate::services::scratch::ScratchFile;
use crate::services::storage::ObjectStore;
use crate::utils::validation::ValidatedRequest;

/// Downloads objects into scratch files
pub struct ObjectFetcher {
    store: Arc<dyn ObjectStore>,
    scratch_dir: PathBuf,
    max_object_size: Option<u64>,
}

impl ObjectFetcher {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        scratch_dir: PathBuf,
        max_object_size: Option<u64>,
    ) -> Self {
        Self {
            store,
            scratch_dir,
            max_object_size,
        }
    }

    /// Stream the object into a new scratch file. On error nothing is left
    /// on disk.
    pub async fn fetch(&self, request: &ValidatedRequest) -> Result<ScratchFile, PhashError> {
        let body = self
            .store
            .get_object(&request.bucket, &request.key)
            .await?;

        if let (Some(limit), Some(len)) = (self.max_object_size, body.content_length) {
            if len > limit {
                return Err(too_large(request, limit));
            }
        }

        let (mut scratch, mut file) = ScratchFile::create_in(&self.scratch_dir)
            .map_err(|e| PhashError::Fetch(format!("Failed to create scratch file: {}", e)))?;
        debug!("Staging {} into {}", request.key, scratch.path().display());

        // Content length is advisory; cap the stream too.
        let written = match self.max_object_size {
            Some(limit) => {
                let mut limited = body.reader.take(limit.saturating_add(1));
                let n = tokio::io::copy(&mut limited, &mut file).await;
                match n {
                    Ok(n) if n > limit => return Err(too_large(request, limit)),
                    other => other,
                }
            }
            None => {
                let mut reader = body.reader;
                tokio::io::copy(&mut reader, &mut file).await
            }
        }
        .map_err(|e| PhashError::Fetch(format!("Transfer of {} interrupted: {}", request.key, e)))?;

        file.flush()
            .await
            .map_err(|e| PhashError::Fetch(format!("Failed to write scratch file: {}", e)))?;
        drop(file);

        scratch.set_size(written);
        info!(
            "Fetched s3://{}/{} ({} bytes)",
            request.bucket, request.key, written
        );
        Ok(scratch)
    }
}

fn too_large(request: &ValidatedRequest, limit: u64) -> PhashError {
    PhashError::Fetch(format!(
        "Object {} exceeds the maximum size of {} bytes",
        request.key, limit
    ))
}
