//! AWS-backed adapters for the recache ports.

mod s3;
mod secrets;
mod sqs;

pub use s3::S3ArtifactStore;
pub use secrets::SecretsManagerStore;
pub use sqs::SqsRecacheQueue;

use std::sync::Arc;

use aws_config::{BehaviorVersion, Region, SdkConfig};

use crate::application::recache::RecacheService;
use crate::config::{AwsSettings, RecacheSettings};

/// Load the shared SDK configuration from the ambient environment plus explicit overrides.
pub async fn load_sdk_config(settings: &AwsSettings) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = settings.region.as_ref() {
        loader = loader.region(Region::new(region.clone()));
    }
    if let Some(endpoint) = settings.endpoint_url.as_deref() {
        loader = loader.endpoint_url(endpoint);
    }
    loader.load().await
}

/// Build the recache service over S3, SQS and Secrets Manager clients.
///
/// Clients are created once here and shared by every request the service handles.
pub async fn build_recache_service(aws: &AwsSettings, recache: &RecacheSettings) -> RecacheService {
    let sdk_config = load_sdk_config(aws).await;

    let secrets = SecretsManagerStore::new(
        aws_sdk_secretsmanager::Client::new(&sdk_config),
        recache.token_secret_id.clone(),
    );
    let artifacts = S3ArtifactStore::new(s3_client(&sdk_config, aws), recache.bucket.clone());
    let queue = SqsRecacheQueue::new(
        aws_sdk_sqs::Client::new(&sdk_config),
        recache.queue_url.clone(),
    );

    RecacheService::new(Arc::new(secrets), Arc::new(artifacts), Arc::new(queue))
}

/// S3 emulators behind an endpoint override serve buckets by path, not by virtual host.
fn uses_path_style(settings: &AwsSettings) -> bool {
    settings.endpoint_url.is_some()
}

fn s3_client(sdk_config: &SdkConfig, settings: &AwsSettings) -> aws_sdk_s3::Client {
    let config = aws_sdk_s3::config::Builder::from(sdk_config)
        .force_path_style(uses_path_style(settings))
        .build();
    aws_sdk_s3::Client::from_conf(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_override_switches_s3_to_path_style() {
        let emulator = AwsSettings {
            region: Some("us-east-1".to_string()),
            endpoint_url: Some("http://localhost:4566".to_string()),
        };
        assert!(uses_path_style(&emulator));
        assert!(!uses_path_style(&AwsSettings::default()));
    }
}
