//! Port traits describing the external services the recache pipeline drives.
//!
//! Each adapter is bound to its target (secret id, bucket, queue) when it is built,
//! so the pipeline only sees the operations below.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::jobs::RecacheBatch;

#[derive(Debug, Error)]
pub enum PortError {
    #[error("{service} request failed: {message}")]
    Downstream {
        service: &'static str,
        message: String,
    },
    #[error("{service} request could not be built: {message}")]
    InvalidRequest {
        service: &'static str,
        message: String,
    },
}

impl PortError {
    pub fn downstream(service: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Downstream {
            service,
            message: err.to_string(),
        }
    }

    pub fn invalid_request(service: &'static str, err: impl std::fmt::Display) -> Self {
        Self::InvalidRequest {
            service,
            message: err.to_string(),
        }
    }

    pub fn service(&self) -> &'static str {
        match self {
            Self::Downstream { service, .. } | Self::InvalidRequest { service, .. } => service,
        }
    }
}

#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch the token allow-list secret. `Ok(None)` means the secret exists but holds no string.
    async fn fetch_secret(&self) -> Result<Option<String>, PortError>;
}

/// A key the object store reported as not deleted, even in quiet mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyFailure {
    pub key: String,
    pub code: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteReport {
    pub requested: usize,
    pub errors: Vec<KeyFailure>,
}

#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Delete all keys in one quiet bulk request; missing keys are not errors.
    async fn delete_keys(&self, keys: &[String]) -> Result<DeleteReport, PortError>;
}

/// An entry the queue rejected inside an otherwise successful batch send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryFailure {
    pub job_id: String,
    pub code: String,
    pub message: Option<String>,
    pub sender_fault: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub accepted: usize,
    pub failed: Vec<EntryFailure>,
}

#[async_trait]
pub trait RecacheQueue: Send + Sync {
    /// Send one batch as a single request, each entry delayed by `delay_seconds`.
    async fn send_batch(
        &self,
        batch: &RecacheBatch,
        delay_seconds: i32,
    ) -> Result<BatchReport, PortError>;
}
