//! Job descriptors consumed from the queue.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Identifier of a job; correlation key for every status write.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A video processing job as popped from the queue.
///
/// Jobs are immutable: the worker never writes back to the descriptor, only
/// to the status record keyed by [`Job::id`].
///
/// `quality` is kept as the raw label so that an unsupported value is
/// reported by the transcode stage with the list of valid labels instead of
/// being rejected as an unparsable payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Unique job ID
    pub id: JobId,
    /// Object key of the source video in the artifact store
    pub source_path: String,
    /// Position of the thumbnail frame, `HH:MM:SS`
    pub thumbnail_time: String,
    /// Quality label (`480p`, `720p`, `1080p`)
    pub quality: String,
    /// Prefix for every published object key
    pub output_prefix: String,
}

impl Job {
    pub fn new(
        id: impl Into<JobId>,
        source_path: impl Into<String>,
        thumbnail_time: impl Into<String>,
        quality: impl Into<String>,
        output_prefix: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source_path: source_path.into(),
            thumbnail_time: thumbnail_time.into(),
            quality: quality.into(),
            output_prefix: output_prefix.into(),
        }
    }

    /// File extension of the source object, falling back to `mp4`.
    pub fn source_extension(&self) -> &str {
        Path::new(&self.source_path)
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty())
            .unwrap_or("mp4")
    }

    /// Object key of the published thumbnail.
    pub fn thumbnail_key(&self) -> String {
        format!("{}_thumbnail.jpg", self.output_prefix)
    }

    /// Object key of a published HLS bundle file.
    pub fn hls_key(&self, file_name: &str) -> String {
        format!("{}_hls/{}", self.output_prefix, file_name)
    }
}
