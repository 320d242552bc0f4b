//! Worker error types.

use std::fmt;

use thiserror::Error;

use mw_media::MediaError;
use mw_models::FailureKind;
use mw_storage::StorageError;

pub type WorkerResult<T> = Result<T, WorkerError>;

/// Errors surfacing outside a job: metrics setup and queue polling.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Queue error: {0}")]
    Queue(#[from] mw_queue::QueueError),

    #[error("Metrics error: {0}")]
    Metrics(String),
}

impl WorkerError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}

pub type StageResult<T> = Result<T, StageError>;

/// Failure of one pipeline stage.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    ConfigurationError(String),

    #[error("{tool} error: {summary}")]
    ExternalToolFailure {
        tool: String,
        summary: String,
        stderr: String,
        exit_code: Option<i32>,
    },

    #[error("{0}")]
    MalformedOutput(String),

    #[error("timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Storage(StorageError),
}

impl StageError {
    pub fn kind(&self) -> FailureKind {
        match self {
            StageError::NotFound(_) => FailureKind::NotFound,
            StageError::ConfigurationError(_) => FailureKind::ConfigurationError,
            StageError::ExternalToolFailure { .. }
            | StageError::Io(_)
            | StageError::Storage(_) => FailureKind::ExternalToolFailure,
            StageError::MalformedOutput(_) => FailureKind::MalformedOutput,
            StageError::Timeout(_) => FailureKind::Timeout,
        }
    }

    /// Full tool diagnostics, when the failure carries them.
    pub fn detail(&self) -> Option<&str> {
        match self {
            StageError::ExternalToolFailure { stderr, .. } if !stderr.is_empty() => Some(stderr),
            _ => None,
        }
    }
}

impl From<MediaError> for StageError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::ToolFailed {
                tool,
                summary,
                stderr,
                exit_code,
            } => StageError::ExternalToolFailure {
                tool,
                summary,
                stderr,
                exit_code,
            },
            MediaError::ToolNotFound(_)
            | MediaError::InvalidTimestamp(_)
            | MediaError::InvalidArgument(_)
            | MediaError::UnsupportedQuality(_) => StageError::ConfigurationError(err.to_string()),
            MediaError::FileNotFound(_) => StageError::NotFound(err.to_string()),
            MediaError::MalformedOutput(_)
            | MediaError::InvalidVideo(_)
            | MediaError::JsonParse(_) => StageError::MalformedOutput(err.to_string()),
            MediaError::Timeout(secs) => StageError::Timeout(secs),
            MediaError::Io(e) => StageError::Io(e),
        }
    }
}

impl From<StorageError> for StageError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(_) => StageError::NotFound(err.to_string()),
            StorageError::InvalidKey(_) | StorageError::ConfigError(_) => {
                StageError::ConfigurationError(err.to_string())
            }
            other => StageError::Storage(other),
        }
    }
}

/// The pipeline steps a job can fail in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageName {
    Fetch,
    Thumbnail,
    Transcode,
    Probe,
    Verify,
    Publish,
    QualityScore,
}

impl StageName {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageName::Fetch => "fetch",
            StageName::Thumbnail => "thumbnail",
            StageName::Transcode => "transcode",
            StageName::Probe => "probe",
            StageName::Verify => "verify",
            StageName::Publish => "publish",
            StageName::QualityScore => "quality_score",
        }
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A stage failure tagged with the step it happened in.
#[derive(Debug, Error)]
#[error("{stage} failed: {error}")]
pub struct PipelineFailure {
    pub stage: StageName,
    #[source]
    pub error: StageError,
}

impl PipelineFailure {
    pub fn new(stage: StageName, error: impl Into<StageError>) -> Self {
        Self {
            stage,
            error: error.into(),
        }
    }

    pub fn kind(&self) -> FailureKind {
        self.error.kind()
    }
}
