//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

use mw_models::UnknownQuality;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during media processing.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("{0} not found")]
    ToolNotFound(String),

    /// Tool exited with a non-zero status. `summary` is the last diagnostic
    /// line; `stderr` holds everything the tool printed.
    #[error("{tool} error: {summary}")]
    ToolFailed {
        tool: String,
        summary: String,
        stderr: String,
        exit_code: Option<i32>,
    },

    #[error("Invalid timestamp format: {0} (expected HH:MM:SS)")]
    InvalidTimestamp(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    UnsupportedQuality(#[from] UnknownQuality),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Tool exited cleanly but the expected output is missing or unreadable.
    #[error("Malformed output: {0}")]
    MalformedOutput(String),

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid video file: {0}")]
    InvalidVideo(String),
}

impl MediaError {
    /// Create a tool failure from captured stderr.
    pub fn tool_failed(tool: impl Into<String>, stderr: impl Into<String>, exit_code: Option<i32>) -> Self {
        let stderr = stderr.into();
        let summary = last_line(&stderr).map(str::to_string).unwrap_or_else(|| match exit_code {
            Some(code) => format!("exited with status {}", code),
            None => "terminated by signal".to_string(),
        });

        Self::ToolFailed {
            tool: tool.into(),
            summary,
            stderr,
            exit_code,
        }
    }

    /// Create a malformed output error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedOutput(message.into())
    }

    /// Full diagnostic output, when the error carries one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            MediaError::ToolFailed { stderr, .. } if !stderr.trim().is_empty() => Some(stderr),
            _ => None,
        }
    }
}

/// Last non-empty line of a tool's diagnostic output.
pub fn last_line(output: &str) -> Option<&str> {
    output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .last()
}
