//! Queue consumption loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, error, info};

use mw_models::Job;
use mw_queue::JobSource;

use crate::config::WorkerConfig;
use crate::coordinator::PipelineCoordinator;
use crate::error::WorkerResult;
use crate::metrics;

/// Poll/dispatch timings.
#[derive(Debug, Clone)]
pub struct LoopSettings {
    pub poll_timeout: Duration,
    pub idle_tick: Duration,
    pub error_backoff: Duration,
    pub heartbeat_interval: Duration,
}

impl From<&WorkerConfig> for LoopSettings {
    fn from(config: &WorkerConfig) -> Self {
        Self {
            poll_timeout: config.poll_timeout,
            idle_tick: config.idle_tick,
            error_backoff: config.error_backoff,
            heartbeat_interval: config.heartbeat_interval,
        }
    }
}

/// Pulls one job at a time and hands it to the coordinator.
///
/// Shutdown is observed only between jobs: a job that has been popped is
/// always processed to completion, including its status write and cleanup.
pub struct WorkerLoop {
    source: Arc<dyn JobSource>,
    coordinator: Arc<PipelineCoordinator>,
    settings: LoopSettings,
    shutdown: watch::Receiver<bool>,
    jobs_processed: u64,
}

impl WorkerLoop {
    pub fn new(
        source: Arc<dyn JobSource>,
        coordinator: Arc<PipelineCoordinator>,
        settings: LoopSettings,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            source,
            coordinator,
            settings,
            shutdown,
            jobs_processed: 0,
        }
    }

    pub fn jobs_processed(&self) -> u64 {
        self.jobs_processed
    }

    /// Run until shutdown is requested and the in-flight job has finished.
    pub async fn run(&mut self) {
        info!(
            "Worker loop started (poll timeout {:?}, backoff {:?})",
            self.settings.poll_timeout, self.settings.error_backoff
        );
        let mut last_heartbeat = Instant::now();

        while !self.shutdown_requested() {
            match self.poll().await {
                Ok(Some(job)) => {
                    self.dispatch(job).await;
                    last_heartbeat = Instant::now();
                }
                Ok(None) => {
                    if last_heartbeat.elapsed() >= self.settings.heartbeat_interval {
                        info!("Waiting for jobs ({} processed so far)", self.jobs_processed);
                        last_heartbeat = Instant::now();
                    }
                }
                Err(e) => {
                    metrics::record_poll_error();
                    error!("Error polling job queue: {}", e);
                    self.pause(self.settings.error_backoff).await;
                    continue;
                }
            }

            self.pause(self.settings.idle_tick).await;
        }

        info!("Worker loop stopped after {} jobs", self.jobs_processed);
    }

    /// Wait up to the poll timeout for the next job.
    pub async fn poll(&self) -> WorkerResult<Option<Job>> {
        Ok(self.source.poll(self.settings.poll_timeout).await?)
    }

    /// Process one job. Returns whether it completed; never fails.
    pub async fn dispatch(&mut self, job: Job) -> bool {
        debug!("Dispatching job {}", job.id);
        let result = self.coordinator.process(&job).await;
        self.jobs_processed += 1;
        result.is_completed()
    }

    fn shutdown_requested(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Sleep, waking early on shutdown.
    async fn pause(&mut self, duration: Duration) {
        if self.shutdown_requested() {
            return;
        }
        let sleep = tokio::time::sleep(duration);
        tokio::pin!(sleep);
        tokio::select! {
            _ = &mut sleep => {}
            changed = self.shutdown.changed() => {
                // Sender gone: nobody can request shutdown any more.
                if changed.is_err() {
                    sleep.await;
                }
            }
        }
    }
}
