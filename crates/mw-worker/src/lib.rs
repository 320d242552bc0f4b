//! Media processing worker.
//!
//! This crate provides:
//! - The queue consumption loop with backoff and graceful shutdown
//! - The per-job pipeline (fetch, thumbnail, transcode, probe, publish)
//! - Temporary resource tracking with guaranteed cleanup
//! - Job logging and metrics

pub mod config;
pub mod coordinator;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod stages;
pub mod tracker;
pub mod worker;

pub use config::WorkerConfig;
pub use coordinator::PipelineCoordinator;
pub use error::{PipelineFailure, StageError, StageName, StageResult, WorkerError, WorkerResult};
pub use logging::{init_tracing, JobLogger};
pub use stages::{
    BoxedStage, FetchStage, ProbeStage, QualityScoreRequest, QualityScoreStage, Stage,
    StageContext, Stages, ThumbnailRequest, ThumbnailStage, TranscodeRequest, TranscodeStage,
};
pub use tracker::{CleanupReport, TempResourceTracker};
pub use worker::{LoopSettings, WorkerLoop};
