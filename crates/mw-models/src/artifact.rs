//! Artifacts staged on local disk while a job runs.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Attribute key: artifact size in bytes
pub const ATTR_SIZE_BYTES: &str = "size_bytes";
/// Attribute key: wall-clock time spent producing the artifact
pub const ATTR_PROCESSING_TIME_SEC: &str = "processing_time_sec";
/// Attribute key: media duration in seconds
pub const ATTR_DURATION_SEC: &str = "duration_sec";
/// Attribute key: number of HLS segments
pub const ATTR_SEGMENTS_COUNT: &str = "segments_count";

/// Kind of a staged artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    SourceVideo,
    Thumbnail,
    HlsBundle,
    Metadata,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::SourceVideo => "source_video",
            ArtifactKind::Thumbnail => "thumbnail",
            ArtifactKind::HlsBundle => "hls_bundle",
            ArtifactKind::Metadata => "metadata",
        }
    }
}

/// A file or directory produced by a stage for the current job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedArtifact {
    pub kind: ArtifactKind,
    pub local_path: PathBuf,
    /// Stage-specific measurements
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

impl StagedArtifact {
    pub fn new(kind: ArtifactKind, local_path: impl AsRef<Path>) -> Self {
        Self {
            kind,
            local_path: local_path.as_ref().to_path_buf(),
            attributes: BTreeMap::new(),
        }
    }

    /// Attach a measurement.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Size in bytes, if the stage recorded one.
    pub fn size_bytes(&self) -> Option<u64> {
        self.attribute(ATTR_SIZE_BYTES).and_then(Value::as_u64)
    }

    /// Processing time in seconds, if the stage recorded one.
    pub fn processing_time_sec(&self) -> Option<f64> {
        self.attribute(ATTR_PROCESSING_TIME_SEC).and_then(Value::as_f64)
    }
}

/// Convert bytes to megabytes rounded to two decimals.
pub fn megabytes(bytes: u64) -> f64 {
    round2(bytes as f64 / (1024.0 * 1024.0))
}

/// Round to two decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
