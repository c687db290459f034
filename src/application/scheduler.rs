use std::sync::Arc;
use std::time::Instant;

use futures::future::try_join_all;
use metrics::{counter, histogram};
use tracing::{info, warn};

use crate::application::ports::{EntryFailure, PortError, RecacheQueue};
use crate::domain::jobs::plan_batches;
use crate::domain::urls::AuthorizedUrls;

/// Seconds a queued job stays invisible, letting the deletion settle before a worker renders.
pub const RECACHE_DELAY_SECONDS: i32 = 1;

const METRIC_BATCHES_DISPATCHED: &str = "recache_batches_dispatched_total";
const METRIC_ENTRIES_FAILED: &str = "recache_entries_failed_total";
const METRIC_DISPATCH_MS: &str = "recache_dispatch_ms";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleReport {
    pub batches: usize,
    pub accepted: usize,
    pub failed: Vec<EntryFailure>,
}

/// Queues regeneration jobs for authorized URLs.
#[derive(Clone)]
pub struct RecacheScheduler {
    queue: Arc<dyn RecacheQueue>,
}

impl RecacheScheduler {
    pub fn new(queue: Arc<dyn RecacheQueue>) -> Self {
        Self { queue }
    }

    /// Send every batch concurrently and wait for all of them.
    ///
    /// The first failed send fails the whole schedule. Entries the queue rejects inside a
    /// successful send are reported and logged but do not fail it.
    pub async fn schedule(&self, urls: &AuthorizedUrls) -> Result<ScheduleReport, PortError> {
        let batches = plan_batches(urls.as_slice());

        info!(
            target = "prerender_recache::application::scheduler",
            batches = batches.len(),
            jobs = urls.len(),
            "sending recaching message batches"
        );

        let started_at = Instant::now();
        let reports = try_join_all(
            batches
                .iter()
                .map(|batch| self.queue.send_batch(batch, RECACHE_DELAY_SECONDS)),
        )
        .await?;
        histogram!(METRIC_DISPATCH_MS).record(started_at.elapsed().as_secs_f64() * 1000.0);
        counter!(METRIC_BATCHES_DISPATCHED).increment(batches.len() as u64);

        let mut summary = ScheduleReport {
            batches: batches.len(),
            ..Default::default()
        };
        for report in reports {
            summary.accepted += report.accepted;
            summary.failed.extend(report.failed);
        }

        if !summary.failed.is_empty() {
            counter!(METRIC_ENTRIES_FAILED).increment(summary.failed.len() as u64);
            for failure in &summary.failed {
                warn!(
                    target = "prerender_recache::application::scheduler",
                    job_id = %failure.job_id,
                    code = %failure.code,
                    message = failure.message.as_deref().unwrap_or(""),
                    sender_fault = failure.sender_fault,
                    "queue rejected recache entry"
                );
            }
        }

        Ok(summary)
    }
}
