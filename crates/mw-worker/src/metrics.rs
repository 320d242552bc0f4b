//! Worker metrics.
//!
//! - Job counters by terminal status and failure kind
//! - Stage and job duration histograms
//! - Queue and status-store error counters

use std::net::SocketAddr;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::{WorkerError, WorkerResult};

/// Metric name constants for consistency.
pub mod names {
    /// Jobs finished, by status (`completed` / `failed`) and failure kind.
    pub const JOBS_TOTAL: &str = "media_worker_jobs_total";

    /// Wall time of one job in seconds.
    pub const JOB_DURATION_SECONDS: &str = "media_worker_job_duration_seconds";

    /// Wall time of one stage in seconds, by stage and outcome.
    pub const STAGE_DURATION_SECONDS: &str = "media_worker_stage_duration_seconds";

    /// Queue poll errors.
    pub const POLL_ERRORS_TOTAL: &str = "media_worker_poll_errors_total";

    /// Status records that could not be written.
    pub const SINK_FAILURES_TOTAL: &str = "media_worker_sink_failures_total";
}

/// Serve Prometheus metrics on `0.0.0.0:{port}`.
pub fn install_prometheus(port: u16) -> WorkerResult<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| WorkerError::Metrics(e.to_string()))
}

/// Install the exporter when `METRICS_PORT` is set.
pub fn install_from_env() -> WorkerResult<Option<u16>> {
    let Ok(raw) = std::env::var("METRICS_PORT") else {
        return Ok(None);
    };
    let port: u16 = raw
        .trim()
        .parse()
        .map_err(|_| WorkerError::config_error(format!("invalid METRICS_PORT: {}", raw)))?;
    install_prometheus(port)?;
    Ok(Some(port))
}

pub fn record_job(status: &str, kind: Option<&str>, duration_secs: f64) {
    counter!(
        names::JOBS_TOTAL,
        "status" => status.to_string(),
        "kind" => kind.unwrap_or("none").to_string()
    )
    .increment(1);

    histogram!(names::JOB_DURATION_SECONDS, "status" => status.to_string()).record(duration_secs);
}

pub fn record_stage(stage: &str, success: bool, duration_secs: f64) {
    histogram!(
        names::STAGE_DURATION_SECONDS,
        "stage" => stage.to_string(),
        "outcome" => if success { "ok" } else { "error" }
    )
    .record(duration_secs);
}

pub fn record_poll_error() {
    counter!(names::POLL_ERRORS_TOTAL).increment(1);
}

pub fn record_sink_failure() {
    counter!(names::SINK_FAILURES_TOTAL).increment(1);
}
