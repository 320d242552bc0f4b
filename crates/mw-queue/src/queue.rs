//! Job queue on a Redis list.

use async_trait::async_trait;
use std::time::Duration;

use mw_models::Job;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tracing::{debug, info};

use crate::error::{QueueError, QueueResult};
use crate::source::{decode_job, JobSource};

/// Smallest BLPOP timeout sent to Redis; zero would block forever.
const MIN_BLOCK_SECS: f64 = 0.01;

/// Queue configuration.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Redis URL
    pub redis_url: String,
    /// List the jobs are pushed to
    pub queue_name: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_string(),
            queue_name: "media_tasks".to_string(),
        }
    }
}

impl QueueConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            redis_url: std::env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            queue_name: std::env::var("REDIS_QUEUE_NAME").unwrap_or(defaults.queue_name),
        }
    }
}

/// Open a multiplexed connection and check it answers PING.
pub(crate) async fn connect(redis_url: &str) -> QueueResult<MultiplexedConnection> {
    let client = redis::Client::open(redis_url)?;
    let mut conn = client
        .get_multiplexed_async_connection()
        .await
        .map_err(|e| QueueError::connection_failed(format!("{}: {}", redis_url, e)))?;

    redis::cmd("PING")
        .query_async::<String>(&mut conn)
        .await
        .map_err(|e| QueueError::connection_failed(format!("PING {}: {}", redis_url, e)))?;

    Ok(conn)
}

/// Job queue client (BLPOP consumer, RPUSH producer).
#[derive(Clone)]
pub struct RedisJobQueue {
    conn: MultiplexedConnection,
    queue_name: String,
}

impl RedisJobQueue {
    /// Connect to Redis.
    pub async fn connect(config: &QueueConfig) -> QueueResult<Self> {
        let conn = connect(&config.redis_url).await?;
        info!("Connected to job queue {}", config.queue_name);
        Ok(Self {
            conn,
            queue_name: config.queue_name.clone(),
        })
    }

    /// Push a job to the tail of the queue.
    pub async fn enqueue(&self, job: &Job) -> QueueResult<()> {
        let payload = serde_json::to_string(job)?;
        let mut conn = self.conn.clone();
        conn.rpush::<_, _, ()>(&self.queue_name, payload)
            .await
            .map_err(|e| QueueError::enqueue_failed(e.to_string()))?;

        info!("Enqueued job {}", job.id);
        Ok(())
    }
}

#[async_trait]
impl JobSource for RedisJobQueue {
    async fn poll(&self, timeout: Duration) -> QueueResult<Option<Job>> {
        let mut conn = self.conn.clone();
        let block = timeout.as_secs_f64().max(MIN_BLOCK_SECS);

        let popped: Option<(String, String)> = conn.blpop(&self.queue_name, block).await?;

        Ok(popped.and_then(|(_, payload)| {
            debug!("Popped payload from {}", self.queue_name);
            decode_job(&payload)
        }))
    }
}
