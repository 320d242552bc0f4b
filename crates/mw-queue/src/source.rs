//! Collaborator traits for the worker loop.

use async_trait::async_trait;
use std::time::Duration;

use mw_models::{Job, JobId, TaskResult};
use tracing::warn;

use crate::error::QueueResult;

/// Blocking-with-timeout pull of one job at a time.
///
/// A popped job is gone from the queue; there is no redelivery if the
/// worker crashes while processing it.
#[async_trait]
pub trait JobSource: Send + Sync {
    /// Wait up to `timeout` for the next job. `Ok(None)` on timeout.
    async fn poll(&self, timeout: Duration) -> QueueResult<Option<Job>>;
}

/// Keyed write of a job's terminal status.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn write(&self, job_id: &JobId, result: &TaskResult) -> QueueResult<()>;
}

/// Decode a queue payload into a [`Job`].
///
/// Payloads that are not a valid job are logged and dropped.
pub fn decode_job(payload: &str) -> Option<Job> {
    match serde_json::from_str::<Job>(payload) {
        Ok(job) => Some(job),
        Err(e) => {
            warn!(error = %e, "Dropping malformed job payload: {}", truncate(payload, 256));
            None
        }
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
