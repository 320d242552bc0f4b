//! Per-job pipeline: fetch, thumbnail, transcode, probe, then publish.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::FutureExt;
use tokio::time::Instant;
use tracing::Instrument;

use mw_media::fs_utils::total_size;
use mw_media::HlsBundle;
use mw_models::{
    format_timestamp, megabytes, round2, CompletedTask, FailedTask, FailureKind, Job, JobId,
    StagedArtifact, TaskResult,
};
use mw_queue::ResultSink;
use mw_storage::ArtifactStore;

use crate::config::WorkerConfig;
use crate::error::{PipelineFailure, StageError, StageName, StageResult};
use crate::logging::JobLogger;
use crate::metrics;
use crate::stages::{Stage, StageContext, Stages, ThumbnailRequest, TranscodeRequest};
use crate::tracker::TempResourceTracker;

const OPERATION: &str = "media_pipeline";

/// URLs of the published outputs.
struct Published {
    thumbnail_url: String,
    master_playlist_url: String,
    total_size_bytes: u64,
}

/// Runs one job end to end and records its terminal status.
pub struct PipelineCoordinator {
    stages: Stages,
    store: Arc<dyn ArtifactStore>,
    sink: Arc<dyn ResultSink>,
    work_dir: PathBuf,
    max_processing_time: Duration,
}

impl PipelineCoordinator {
    pub fn new(
        stages: Stages,
        store: Arc<dyn ArtifactStore>,
        sink: Arc<dyn ResultSink>,
        work_dir: impl Into<PathBuf>,
        max_processing_time: Duration,
    ) -> Self {
        Self {
            stages,
            store,
            sink,
            work_dir: work_dir.into(),
            max_processing_time,
        }
    }

    /// Coordinator with the tool-backed stages.
    pub fn from_config(
        config: &WorkerConfig,
        store: Arc<dyn ArtifactStore>,
        sink: Arc<dyn ResultSink>,
    ) -> Self {
        Self::new(
            Stages::media(config, Arc::clone(&store)),
            store,
            sink,
            config.work_dir.clone(),
            config.max_processing_time,
        )
    }

    /// Process `job`, write its status exactly once and remove every local
    /// file it staged. Never fails; failures are part of the result.
    pub async fn process(&self, job: &Job) -> TaskResult {
        let logger = JobLogger::new(&job.id, OPERATION);
        let span = logger.create_span();
        self.process_logged(job, &logger).instrument(span).await
    }

    async fn process_logged(&self, job: &Job, logger: &JobLogger) -> TaskResult {
        let started = Instant::now();
        logger.log_start(&format!(
            "source={} quality={} thumbnail_time={}",
            job.source_path, job.quality, job.thumbnail_time
        ));

        let (mut tracker, job_dir) = match self.job_dir(&job.id) {
            Ok(dir) => (TempResourceTracker::new(&dir), Ok(dir)),
            Err(failure) => (TempResourceTracker::detached(), Err(failure)),
        };

        let outcome = match job_dir {
            Ok(dir) => {
                let ctx = StageContext::new(dir, self.max_processing_time);
                AssertUnwindSafe(self.run_pipeline(job, &ctx, &mut tracker, logger, started))
                    .catch_unwind()
                    .await
            }
            Err(failure) => Ok(Err(failure)),
        };

        let result = match outcome {
            Ok(Ok(completed)) => TaskResult::Completed(completed),
            Ok(Err(failure)) => {
                logger.log_error(&failure.to_string());
                TaskResult::Failed(FailedTask {
                    error: failure.to_string(),
                    error_kind: failure.kind(),
                    error_detail: failure.error.detail().map(str::to_string),
                    error_time: format_timestamp(Utc::now()),
                    attempted_files: tracker.attempted_files(),
                })
            }
            Err(panic) => {
                let message = format!("internal error: {}", panic_message(&*panic));
                logger.log_error(&message);
                TaskResult::Failed(FailedTask {
                    error: message,
                    error_kind: FailureKind::ExternalToolFailure,
                    error_detail: None,
                    error_time: format_timestamp(Utc::now()),
                    attempted_files: tracker.attempted_files(),
                })
            }
        };

        if let Err(e) = self.sink.write(&job.id, &result).await {
            metrics::record_sink_failure();
            logger.log_error(&format!("Failed to write status: {}", e));
        }

        let report = tracker.cleanup();
        if report.failed > 0 {
            logger.log_warning(&format!("{} staged paths could not be removed", report.failed));
        }

        let elapsed = started.elapsed().as_secs_f64();
        match &result {
            TaskResult::Completed(c) => {
                metrics::record_job("completed", None, elapsed);
                logger.log_completion(&format!(
                    "{} segments, {} MB in {:.2}s",
                    c.hls_segments_count, c.total_size_mb, c.processing_time_sec
                ));
            }
            TaskResult::Failed(f) => {
                metrics::record_job("failed", Some(f.error_kind.as_str()), elapsed);
            }
        }

        result
    }

    /// Scratch directory for a job, refusing ids that would escape it.
    fn job_dir(&self, id: &JobId) -> Result<PathBuf, PipelineFailure> {
        let raw = id.as_str();
        if raw.is_empty() || raw == "." || raw == ".." || raw.contains(['/', '\\']) {
            return Err(PipelineFailure::new(
                StageName::Fetch,
                StageError::ConfigurationError(format!(
                    "job id {:?} cannot be used as a directory name",
                    raw
                )),
            ));
        }
        Ok(self.work_dir.join(raw))
    }

    async fn run_pipeline(
        &self,
        job: &Job,
        ctx: &StageContext,
        tracker: &mut TempResourceTracker,
        logger: &JobLogger,
        started: Instant,
    ) -> Result<CompletedTask, PipelineFailure> {
        let source = self.run_stage(self.stages.fetch.as_ref(), job, ctx, logger).await?;
        tracker.track(&source.local_path);
        let video = source.local_path.clone();

        let thumbnail_req = ThumbnailRequest {
            video: video.clone(),
            timestamp: job.thumbnail_time.clone(),
        };
        let thumbnail = self
            .run_stage(self.stages.thumbnail.as_ref(), &thumbnail_req, ctx, logger)
            .await?;
        tracker.track(&thumbnail.local_path);

        let transcode_req = TranscodeRequest {
            video: video.clone(),
            quality: job.quality.clone(),
        };
        let hls = self
            .run_stage(self.stages.transcode.as_ref(), &transcode_req, ctx, logger)
            .await?;
        tracker.track(&hls.local_path);

        let metadata = self
            .run_stage(self.stages.probe.as_ref(), &video, ctx, logger)
            .await?;

        let bundle = ctx
            .within_budget(verify_bundle(&hls))
            .await
            .map_err(|e| PipelineFailure::new(StageName::Verify, e))?;

        let published = ctx
            .within_budget(self.publish(job, &thumbnail, &bundle))
            .await
            .map_err(|e| PipelineFailure::new(StageName::Publish, e))?;
        logger.log_stage(StageName::Publish.as_str(), "Outputs published");

        Ok(CompletedTask {
            thumbnail_url: published.thumbnail_url,
            master_playlist_url: published.master_playlist_url,
            hls_segments_count: bundle.segments_count(),
            total_size_mb: megabytes(published.total_size_bytes),
            metadata,
            processing_time_sec: round2(started.elapsed().as_secs_f64()),
            completed_at: format_timestamp(Utc::now()),
        })
    }

    async fn run_stage<S>(
        &self,
        stage: &S,
        input: &S::Input,
        ctx: &StageContext,
        logger: &JobLogger,
    ) -> Result<S::Output, PipelineFailure>
    where
        S: Stage + ?Sized,
    {
        let name = stage.name();
        logger.log_stage(name.as_str(), "Stage started");

        let started = Instant::now();
        let result = ctx.within_budget(stage.run(input, ctx)).await;
        let elapsed = started.elapsed().as_secs_f64();
        metrics::record_stage(name.as_str(), result.is_ok(), elapsed);

        match result {
            Ok(output) => {
                logger.log_stage(name.as_str(), &format!("Stage finished in {:.2}s", elapsed));
                Ok(output)
            }
            Err(e) => Err(PipelineFailure::new(name, e)),
        }
    }

    /// Upload the thumbnail, then every bundle file with the playlist last.
    async fn publish(
        &self,
        job: &Job,
        thumbnail: &StagedArtifact,
        bundle: &HlsBundle,
    ) -> StageResult<Published> {
        let thumbnail_url = self
            .store
            .upload(&thumbnail.local_path, &job.thumbnail_key())
            .await?;

        let files = bundle.files();
        let mut master_playlist_url = String::new();
        for file in &files {
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .ok_or_else(|| {
                    StageError::MalformedOutput(format!("bad bundle path {}", file.display()))
                })?;
            let url = self.store.upload(file, &job.hls_key(&name)).await?;
            if *file == bundle.master_playlist {
                master_playlist_url = url;
            }
        }

        let thumbnail_size = match thumbnail.size_bytes() {
            Some(size) => size,
            None => tokio::fs::metadata(&thumbnail.local_path).await?.len(),
        };
        let bundle_size = total_size(&files).await?;

        Ok(Published {
            thumbnail_url,
            master_playlist_url,
            total_size_bytes: thumbnail_size + bundle_size,
        })
    }
}

/// Rescan the bundle directory and check every playlist entry exists.
async fn verify_bundle(hls: &StagedArtifact) -> StageResult<HlsBundle> {
    let bundle = HlsBundle::scan(&hls.local_path).await?;
    bundle.verify().await?;
    Ok(bundle)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}
