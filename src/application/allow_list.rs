use std::sync::Arc;

use tracing::info;

use crate::application::error::AuthorizationError;
use crate::application::ports::SecretStore;
use crate::domain::allow_list::{AllowList, UrlPrefixes};

/// Resolves a token to its URL prefixes by reading the allow-list secret.
///
/// The secret is fetched and decoded on every call; nothing is cached in-process.
#[derive(Clone)]
pub struct AllowListResolver {
    store: Arc<dyn SecretStore>,
}

impl AllowListResolver {
    pub fn new(store: Arc<dyn SecretStore>) -> Self {
        Self { store }
    }

    pub async fn resolve(&self, token: &str) -> Result<UrlPrefixes, AuthorizationError> {
        let raw = self
            .store
            .fetch_secret()
            .await
            .map_err(AuthorizationError::SecretUnavailable)?
            .ok_or(AuthorizationError::SecretEmpty)?;

        let allow_list = AllowList::from_secret_string(&raw)?;
        let prefixes = allow_list
            .prefixes_for(token)
            .ok_or(AuthorizationError::UnknownToken)?;

        info!(
            target = "prerender_recache::application::allow_list",
            tokens = allow_list.len(),
            prefixes = prefixes.len(),
            "resolved allowed url prefixes for token"
        );

        Ok(prefixes)
    }
}
