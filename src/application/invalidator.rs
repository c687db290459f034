use std::sync::Arc;

use metrics::counter;
use tracing::{info, warn};

use crate::application::ports::{ArtifactStore, DeleteReport, PortError};
use crate::domain::urls::AuthorizedUrls;

const METRIC_URLS_INVALIDATED: &str = "recache_urls_invalidated_total";

/// Removes previously rendered artifacts, using each URL verbatim as the object key.
#[derive(Clone)]
pub struct CacheInvalidator {
    store: Arc<dyn ArtifactStore>,
}

impl CacheInvalidator {
    pub fn new(store: Arc<dyn ArtifactStore>) -> Self {
        Self { store }
    }

    /// Issue one bulk delete for the whole set. Store failures propagate untouched.
    pub async fn invalidate(&self, urls: &AuthorizedUrls) -> Result<DeleteReport, PortError> {
        if urls.is_empty() {
            return Ok(DeleteReport::default());
        }

        info!(
            target = "prerender_recache::application::invalidator",
            objects = urls.len(),
            "deleting cached artifacts"
        );

        let report = self.store.delete_keys(urls.as_slice()).await?;
        counter!(METRIC_URLS_INVALIDATED).increment(report.requested as u64);

        for failure in &report.errors {
            warn!(
                target = "prerender_recache::application::invalidator",
                key = %failure.key,
                code = failure.code.as_deref().unwrap_or(""),
                message = failure.message.as_deref().unwrap_or(""),
                "object store did not delete key"
            );
        }

        Ok(report)
    }
}
