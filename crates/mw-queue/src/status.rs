//! Terminal status records in Redis hashes.

use async_trait::async_trait;

use mw_models::{JobId, TaskResult};
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tracing::debug;

use crate::error::{QueueError, QueueResult};
use crate::queue::{connect, QueueConfig};
use crate::source::ResultSink;

/// Hash key of a job's status record.
pub fn status_key(job_id: &JobId) -> String {
    format!("task:{}", job_id)
}

/// Writes [`TaskResult`]s to `task:{id}` hashes.
#[derive(Clone)]
pub struct RedisStatusSink {
    conn: MultiplexedConnection,
}

impl RedisStatusSink {
    pub async fn connect(config: &QueueConfig) -> QueueResult<Self> {
        Ok(Self {
            conn: connect(&config.redis_url).await?,
        })
    }

    /// Read back a status record as field/value pairs.
    pub async fn read(&self, job_id: &JobId) -> QueueResult<Vec<(String, String)>> {
        let mut conn = self.conn.clone();
        let fields: Vec<(String, String)> = conn.hgetall(status_key(job_id)).await?;
        Ok(fields)
    }
}

#[async_trait]
impl ResultSink for RedisStatusSink {
    async fn write(&self, job_id: &JobId, result: &TaskResult) -> QueueResult<()> {
        let fields = result
            .status_fields()
            .map_err(|e| QueueError::sink_write_failure(job_id.as_str(), e))?;
        let key = status_key(job_id);

        let mut conn = self.conn.clone();
        conn.hset_multiple::<_, _, _, ()>(&key, &fields)
            .await
            .map_err(|e| QueueError::sink_write_failure(job_id.as_str(), e))?;

        debug!("Wrote {} fields to {}", fields.len(), key);
        Ok(())
    }
}
