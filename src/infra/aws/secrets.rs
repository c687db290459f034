use async_trait::async_trait;
use aws_sdk_secretsmanager::Client;
use aws_sdk_secretsmanager::error::DisplayErrorContext;
use tracing::{info, instrument};

use crate::application::ports::{PortError, SecretStore};

const SERVICE: &str = "secretsmanager";

/// The Secrets Manager secret holding the token allow-list.
pub struct SecretsManagerStore {
    client: Client,
    secret_id: String,
}

impl std::fmt::Debug for SecretsManagerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretsManagerStore")
            .field("secret_id", &self.secret_id)
            .finish_non_exhaustive()
    }
}

impl SecretsManagerStore {
    pub fn new(client: Client, secret_id: impl Into<String>) -> Self {
        Self {
            client,
            secret_id: secret_id.into(),
        }
    }
}

#[async_trait]
impl SecretStore for SecretsManagerStore {
    #[instrument(skip(self), fields(backend = "secretsmanager"))]
    async fn fetch_secret(&self) -> Result<Option<String>, PortError> {
        info!(
            target = "prerender_recache::infra::aws::secrets",
            secret_id = %self.secret_id,
            "looking for allowed urls in secrets manager"
        );

        let output = self
            .client
            .get_secret_value()
            .secret_id(&self.secret_id)
            .send()
            .await
            .map_err(|err| PortError::downstream(SERVICE, DisplayErrorContext(&err)))?;

        Ok(output.secret_string().map(str::to_string))
    }
}
