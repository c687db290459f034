use async_trait::async_trait;
use aws_sdk_sqs::Client;
use aws_sdk_sqs::error::DisplayErrorContext;
use aws_sdk_sqs::types::SendMessageBatchRequestEntry;
use tracing::instrument;

use crate::application::ports::{BatchReport, EntryFailure, PortError, RecacheQueue};
use crate::domain::jobs::RecacheBatch;

const SERVICE: &str = "sqs";

/// The recache work queue consumed by the prerender workers.
pub struct SqsRecacheQueue {
    client: Client,
    queue_url: String,
}

impl std::fmt::Debug for SqsRecacheQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqsRecacheQueue")
            .field("queue_url", &self.queue_url)
            .finish_non_exhaustive()
    }
}

impl SqsRecacheQueue {
    pub fn new(client: Client, queue_url: impl Into<String>) -> Self {
        Self {
            client,
            queue_url: queue_url.into(),
        }
    }
}

#[async_trait]
impl RecacheQueue for SqsRecacheQueue {
    #[instrument(skip(self, batch), fields(backend = "sqs", entries = batch.len()))]
    async fn send_batch(
        &self,
        batch: &RecacheBatch,
        delay_seconds: i32,
    ) -> Result<BatchReport, PortError> {
        let entries = batch
            .jobs()
            .iter()
            .map(|job| {
                SendMessageBatchRequestEntry::builder()
                    .id(&job.job_id)
                    .message_body(&job.url)
                    .delay_seconds(delay_seconds)
                    .build()
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| PortError::invalid_request(SERVICE, err))?;

        let output = self
            .client
            .send_message_batch()
            .queue_url(&self.queue_url)
            .set_entries(Some(entries))
            .send()
            .await
            .map_err(|err| PortError::downstream(SERVICE, DisplayErrorContext(&err)))?;

        let failed = output
            .failed()
            .iter()
            .map(|entry| EntryFailure {
                job_id: entry.id().to_string(),
                code: entry.code().to_string(),
                message: entry.message().map(str::to_string),
                sender_fault: entry.sender_fault(),
            })
            .collect();

        Ok(BatchReport {
            accepted: output.successful().len(),
            failed,
        })
    }
}
