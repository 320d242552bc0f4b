//! Terminal task results written to the status store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::metadata::VideoMetadata;

/// Format of every timestamp in a status record.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format a timestamp the way status records expect it.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Terminal status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classification of a job failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Source asset missing from the store
    NotFound,
    /// Job asked for something the worker is not configured to do
    ConfigurationError,
    /// External tool exited non-zero, or the pipeline hit an unexpected error
    ExternalToolFailure,
    /// Tool succeeded but its output is missing or unparsable
    MalformedOutput,
    /// Job exceeded its processing budget
    Timeout,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::NotFound => "not_found",
            FailureKind::ConfigurationError => "configuration_error",
            FailureKind::ExternalToolFailure => "external_tool_failure",
            FailureKind::MalformedOutput => "malformed_output",
            FailureKind::Timeout => "timeout",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payload of a successful run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedTask {
    pub thumbnail_url: String,
    pub master_playlist_url: String,
    pub hls_segments_count: usize,
    /// Thumbnail plus bundle size in MB
    pub total_size_mb: f64,
    pub metadata: VideoMetadata,
    pub processing_time_sec: f64,
    pub completed_at: String,
}

/// Payload of a failed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedTask {
    /// Short, human-readable error
    pub error: String,
    pub error_kind: FailureKind,
    /// Full diagnostic output (tool stderr), when available
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
    pub error_time: String,
    /// Local paths staged before the failure
    pub attempted_files: Vec<String>,
}

/// Terminal outcome of one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskResult {
    Completed(CompletedTask),
    Failed(FailedTask),
}

impl TaskResult {
    pub fn status(&self) -> TaskStatus {
        match self {
            TaskResult::Completed(_) => TaskStatus::Completed,
            TaskResult::Failed(_) => TaskStatus::Failed,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, TaskResult::Completed(_))
    }

    pub fn as_completed(&self) -> Option<&CompletedTask> {
        match self {
            TaskResult::Completed(c) => Some(c),
            TaskResult::Failed(_) => None,
        }
    }

    pub fn as_failed(&self) -> Option<&FailedTask> {
        match self {
            TaskResult::Completed(_) => None,
            TaskResult::Failed(f) => Some(f),
        }
    }

    /// Flatten into `field -> value` pairs for a hash-shaped status record.
    ///
    /// Nested values (metadata, attempted files) are encoded as JSON.
    pub fn status_fields(&self) -> Result<Vec<(String, String)>, serde_json::Error> {
        let mut fields = vec![("status".to_string(), self.status().to_string())];

        match self {
            TaskResult::Completed(c) => {
                fields.push(("thumbnail_url".to_string(), c.thumbnail_url.clone()));
                fields.push((
                    "master_playlist_url".to_string(),
                    c.master_playlist_url.clone(),
                ));
                fields.push((
                    "hls_segments_count".to_string(),
                    c.hls_segments_count.to_string(),
                ));
                fields.push(("total_size_mb".to_string(), c.total_size_mb.to_string()));
                fields.push(("metadata".to_string(), serde_json::to_string(&c.metadata)?));
                fields.push((
                    "processing_time_sec".to_string(),
                    c.processing_time_sec.to_string(),
                ));
                fields.push(("completed_at".to_string(), c.completed_at.clone()));
            }
            TaskResult::Failed(f) => {
                fields.push(("error".to_string(), f.error.clone()));
                fields.push(("error_kind".to_string(), f.error_kind.to_string()));
                if let Some(detail) = &f.error_detail {
                    fields.push(("error_detail".to_string(), detail.clone()));
                }
                fields.push(("error_time".to_string(), f.error_time.clone()));
                fields.push((
                    "attempted_files".to_string(),
                    serde_json::to_string(&f.attempted_files)?,
                ));
            }
        }

        Ok(fields)
    }
}
