//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

use mw_media::MediaTools;
use mw_models::encoding::DEFAULT_THUMBNAIL_WIDTH;
use mw_models::HlsEncoding;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Scratch directory; each job gets `{work_dir}/{job_id}`
    pub work_dir: PathBuf,
    /// Thumbnail width in pixels (height follows the aspect ratio)
    pub thumbnail_width: u32,
    /// How long one queue poll may block
    pub poll_timeout: Duration,
    /// Pause between polls
    pub idle_tick: Duration,
    /// Pause after a queue error
    pub error_backoff: Duration,
    /// Interval of the "waiting for jobs" log while idle
    pub heartbeat_interval: Duration,
    /// Budget for one job, from fetch to publish
    pub max_processing_time: Duration,
    /// External tool locations
    pub tools: MediaTools,
    /// HLS encoder settings
    pub encoding: HlsEncoding,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("/var/lib/media-worker/tmp"),
            thumbnail_width: DEFAULT_THUMBNAIL_WIDTH,
            poll_timeout: Duration::from_secs(1),
            idle_tick: Duration::from_millis(100),
            error_backoff: Duration::from_secs(5),
            heartbeat_interval: Duration::from_secs(60),
            max_processing_time: Duration::from_secs(3600), // 1 hour
            tools: MediaTools::default(),
            encoding: HlsEncoding::default(),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            work_dir: std::env::var("WORKER_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            thumbnail_width: env_parse("WORKER_THUMBNAIL_WIDTH")
                .filter(|w| *w > 0)
                .unwrap_or(defaults.thumbnail_width),
            poll_timeout: env_parse("WORKER_POLL_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.poll_timeout),
            idle_tick: env_parse("WORKER_IDLE_TICK_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.idle_tick),
            error_backoff: env_parse("WORKER_ERROR_BACKOFF_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.error_backoff),
            heartbeat_interval: defaults.heartbeat_interval,
            max_processing_time: env_parse("WORKER_MAX_PROCESSING_TIME")
                .map(Duration::from_secs)
                .unwrap_or(defaults.max_processing_time),
            tools: MediaTools::from_env(),
            encoding: defaults.encoding,
        }
    }

    /// Scratch directory for one job.
    pub fn job_dir(&self, job_id: &str) -> PathBuf {
        self.work_dir.join(job_id)
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse().ok())
}
