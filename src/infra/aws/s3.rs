use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use tracing::instrument;

use crate::application::ports::{ArtifactStore, DeleteReport, KeyFailure, PortError};

const SERVICE: &str = "s3";

/// Prerendered pages stored in one S3 bucket, keyed by URL.
pub struct S3ArtifactStore {
    client: Client,
    bucket: String,
}

impl std::fmt::Debug for S3ArtifactStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3ArtifactStore")
            .field("bucket", &self.bucket)
            .finish_non_exhaustive()
    }
}

impl S3ArtifactStore {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

fn map_sdk_error<E, R>(err: SdkError<E, R>) -> PortError
where
    E: std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug,
{
    PortError::downstream(SERVICE, DisplayErrorContext(&err))
}

#[async_trait]
impl ArtifactStore for S3ArtifactStore {
    #[instrument(skip(self, keys), fields(backend = "s3", bucket = %self.bucket, keys = keys.len()))]
    async fn delete_keys(&self, keys: &[String]) -> Result<DeleteReport, PortError> {
        let objects = keys
            .iter()
            .map(|key| ObjectIdentifier::builder().key(key).build())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| PortError::invalid_request(SERVICE, err))?;

        let delete = Delete::builder()
            .set_objects(Some(objects))
            .quiet(true)
            .build()
            .map_err(|err| PortError::invalid_request(SERVICE, err))?;

        let output = self
            .client
            .delete_objects()
            .bucket(&self.bucket)
            .delete(delete)
            .send()
            .await
            .map_err(map_sdk_error)?;

        let errors = output
            .errors()
            .iter()
            .map(|error| KeyFailure {
                key: error.key().unwrap_or_default().to_string(),
                code: error.code().map(str::to_string),
                message: error.message().map(str::to_string),
            })
            .collect();

        Ok(DeleteReport {
            requested: keys.len(),
            errors,
        })
    }
}
