use crate::config::PhashConfig;
use crate::services::storage::S3ObjectStore;
use std::sync::Arc;
use tracing::info;

/// Build the S3 client from the ambient AWS environment (credential chain,
/// region), applying the endpoint override for S3-compatible stores.
pub async fn setup_storage(config: &PhashConfig) -> Arc<S3ObjectStore> {
    let mut loader = aws_config::from_env();
    if let Some(endpoint_url) = &config.s3_endpoint_url {
        info!("☁️  S3 endpoint override: {}", endpoint_url);
        loader = loader.endpoint_url(endpoint_url);
    }
    let aws_config = loader.load().await;

    let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
        .force_path_style(config.s3_force_path_style)
        .build();

    info!(
        "☁️  S3 client ready (region: {})",
        aws_config
            .region()
            .map(|r| r.as_ref().to_string())
            .unwrap_or_else(|| "unset".to_string())
    );

    let s3_client = aws_sdk_s3::Client::from_conf(s3_config);
    Arc::new(S3ObjectStore::new(s3_client))
}
