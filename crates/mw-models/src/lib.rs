//! Shared data models for the media worker.
//!
//! This crate provides Serde-serializable types for:
//! - Queue job descriptors
//! - Quality profiles and HLS encoding settings
//! - Staged artifacts produced by pipeline stages
//! - Probe metadata
//! - Terminal task results and quality-score reports

pub mod artifact;
pub mod encoding;
pub mod job;
pub mod metadata;
pub mod quality;
pub mod quality_score;
pub mod result;

// Re-export common types
pub use artifact::{megabytes, round2, ArtifactKind, StagedArtifact};
pub use encoding::HlsEncoding;
pub use job::{Job, JobId};
pub use metadata::{AudioTrack, VideoMetadata, VideoTrack};
pub use quality::{QualityProfile, UnknownQuality, QUALITY_PROFILES};
pub use quality_score::{QualityScore, QualityScoreOutcome};
pub use result::{
    format_timestamp, CompletedTask, FailedTask, FailureKind, TaskResult, TaskStatus,
    TIMESTAMP_FORMAT,
};
