#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Mutex;

use prerender_recache::application::ports::{
    ArtifactStore, BatchReport, DeleteReport, EntryFailure, PortError, RecacheQueue, SecretStore,
};
use prerender_recache::application::recache::RecacheService;
use prerender_recache::domain::jobs::RecacheBatch;

pub const TOKEN: &str = "token-1";

/// Allow-list secret in its stored form: a JSON string wrapping a JSON object.
pub fn secret_for(entries: serde_json::Value) -> String {
    serde_json::to_string(&entries.to_string()).expect("encode secret")
}

pub fn default_secret() -> String {
    secret_for(json!({ "token-1": "https://example.com/,https://shop.example.com/" }))
}

/// Side effects in the order the pipeline performed them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    SecretFetched,
    Deleted(Vec<String>),
    Sent { ids: Vec<String>, urls: Vec<String>, delay: i32 },
}

pub type EventLog = Arc<Mutex<Vec<Event>>>;

pub enum SecretResponse {
    Value(String),
    Missing,
    Fail,
}

pub struct StaticSecretStore {
    response: SecretResponse,
    log: EventLog,
    pub calls: AtomicUsize,
}

#[async_trait]
impl SecretStore for StaticSecretStore {
    async fn fetch_secret(&self) -> Result<Option<String>, PortError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.log.lock().await.push(Event::SecretFetched);
        match &self.response {
            SecretResponse::Value(value) => Ok(Some(value.clone())),
            SecretResponse::Missing => Ok(None),
            SecretResponse::Fail => Err(PortError::downstream(
                "secretsmanager",
                "ResourceNotFoundException",
            )),
        }
    }
}

pub struct RecordingArtifactStore {
    fail: bool,
    log: EventLog,
}

#[async_trait]
impl ArtifactStore for RecordingArtifactStore {
    async fn delete_keys(&self, keys: &[String]) -> Result<DeleteReport, PortError> {
        if self.fail {
            return Err(PortError::downstream("s3", "AccessDenied"));
        }
        self.log.lock().await.push(Event::Deleted(keys.to_vec()));
        Ok(DeleteReport {
            requested: keys.len(),
            errors: Vec::new(),
        })
    }
}

pub struct RecordingQueue {
    fail: bool,
    reject_first_entry: bool,
    log: EventLog,
}

#[async_trait]
impl RecacheQueue for RecordingQueue {
    async fn send_batch(
        &self,
        batch: &RecacheBatch,
        delay_seconds: i32,
    ) -> Result<BatchReport, PortError> {
        if self.fail {
            return Err(PortError::downstream("sqs", "QueueDoesNotExist"));
        }
        let ids: Vec<String> = batch.jobs().iter().map(|job| job.job_id.clone()).collect();
        let urls: Vec<String> = batch.urls().map(str::to_string).collect();
        self.log.lock().await.push(Event::Sent {
            ids: ids.clone(),
            urls,
            delay: delay_seconds,
        });

        let mut report = BatchReport {
            accepted: ids.len(),
            failed: Vec::new(),
        };
        if self.reject_first_entry
            && let Some(first) = ids.first()
        {
            report.accepted -= 1;
            report.failed.push(EntryFailure {
                job_id: first.clone(),
                code: "InvalidParameterValue".to_string(),
                message: None,
                sender_fault: true,
            });
        }
        Ok(report)
    }
}

/// Fluent builder wiring fakes into a service that shares one event log.
pub struct Harness {
    secret: SecretResponse,
    fail_delete: bool,
    fail_send: bool,
    reject_first_entry: bool,
}

impl Default for Harness {
    fn default() -> Self {
        Self {
            secret: SecretResponse::Value(default_secret()),
            fail_delete: false,
            fail_send: false,
            reject_first_entry: false,
        }
    }
}

pub struct Built {
    pub service: RecacheService,
    pub log: EventLog,
    pub secrets: Arc<StaticSecretStore>,
}

impl Built {
    pub async fn events(&self) -> Vec<Event> {
        self.log.lock().await.clone()
    }

    pub async fn side_effects(&self) -> Vec<Event> {
        self.events()
            .await
            .into_iter()
            .filter(|event| !matches!(event, Event::SecretFetched))
            .collect()
    }
}

impl Harness {
    pub fn secret(mut self, response: SecretResponse) -> Self {
        self.secret = response;
        self
    }

    pub fn failing_delete(mut self) -> Self {
        self.fail_delete = true;
        self
    }

    pub fn failing_send(mut self) -> Self {
        self.fail_send = true;
        self
    }

    pub fn rejecting_first_entry(mut self) -> Self {
        self.reject_first_entry = true;
        self
    }

    pub fn build(self) -> Built {
        let log: EventLog = Arc::new(Mutex::new(Vec::new()));
        let secrets = Arc::new(StaticSecretStore {
            response: self.secret,
            log: log.clone(),
            calls: AtomicUsize::new(0),
        });
        let artifacts = Arc::new(RecordingArtifactStore {
            fail: self.fail_delete,
            log: log.clone(),
        });
        let queue = Arc::new(RecordingQueue {
            fail: self.fail_send,
            reject_first_entry: self.reject_first_entry,
            log: log.clone(),
        });

        let service = RecacheService::new(secrets.clone(), artifacts, queue);
        Built {
            service,
            log,
            secrets,
        }
    }
}

pub fn body(value: serde_json::Value) -> Vec<u8> {
    serde_json::to_vec(&value).expect("encode body")
}
