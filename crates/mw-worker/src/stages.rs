//! Pipeline stages.
//!
//! Each stage turns a typed input into a typed output or a [`StageError`].
//! The coordinator owns sequencing and tracking; stages only produce files
//! under the job's scratch directory.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use mw_media::{vmaf, MediaTools, ToolRunner};
use mw_models::artifact::{
    ATTR_PROCESSING_TIME_SEC, ATTR_SEGMENTS_COUNT, ATTR_SIZE_BYTES,
};
use mw_models::{
    round2, ArtifactKind, HlsEncoding, Job, QualityScoreOutcome, StagedArtifact, VideoMetadata,
};
use mw_storage::ArtifactStore;

use crate::config::WorkerConfig;
use crate::error::{StageError, StageName, StageResult};

/// Per-job state shared by every stage: scratch directory and deadline.
#[derive(Debug, Clone)]
pub struct StageContext {
    pub job_dir: PathBuf,
    budget: Duration,
    deadline: Instant,
}

impl StageContext {
    pub fn new(job_dir: impl Into<PathBuf>, budget: Duration) -> Self {
        Self {
            job_dir: job_dir.into(),
            budget,
            deadline: Instant::now() + budget,
        }
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Time left before the job deadline.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// A tool runner whose kill deadline is the job's remaining budget.
    pub fn runner(&self) -> ToolRunner {
        ToolRunner::new().with_timeout(self.remaining())
    }

    /// Run `fut`, failing with [`StageError::Timeout`] once the job budget
    /// is spent. Dropping the future kills any tool it spawned.
    pub async fn within_budget<T, F>(&self, fut: F) -> StageResult<T>
    where
        F: std::future::Future<Output = StageResult<T>>,
    {
        let remaining = self.remaining();
        if remaining.is_zero() {
            return Err(StageError::Timeout(self.budget.as_secs()));
        }
        match tokio::time::timeout(remaining, fut).await {
            Ok(result) => result,
            Err(_) => Err(StageError::Timeout(self.budget.as_secs())),
        }
    }
}

/// One step of the pipeline.
#[async_trait]
pub trait Stage: Send + Sync {
    type Input: Send + Sync;
    type Output: Send;

    fn name(&self) -> StageName;

    async fn run(&self, input: &Self::Input, ctx: &StageContext) -> StageResult<Self::Output>;
}

pub type BoxedStage<I, O> = Box<dyn Stage<Input = I, Output = O>>;

/// Thumbnail input: the fetched video and a `HH:MM:SS` position.
#[derive(Debug, Clone)]
pub struct ThumbnailRequest {
    pub video: PathBuf,
    pub timestamp: String,
}

/// Transcode input: the fetched video and a quality label.
#[derive(Debug, Clone)]
pub struct TranscodeRequest {
    pub video: PathBuf,
    pub quality: String,
}

/// The four mandatory stages, in pipeline order.
pub struct Stages {
    pub fetch: BoxedStage<Job, StagedArtifact>,
    pub thumbnail: BoxedStage<ThumbnailRequest, StagedArtifact>,
    pub transcode: BoxedStage<TranscodeRequest, StagedArtifact>,
    pub probe: BoxedStage<PathBuf, VideoMetadata>,
}

impl Stages {
    /// Stages backed by the artifact store and the external tools.
    pub fn media(config: &WorkerConfig, store: Arc<dyn ArtifactStore>) -> Self {
        Self {
            fetch: Box::new(FetchStage::new(store)),
            thumbnail: Box::new(ThumbnailStage::new(
                config.tools.clone(),
                config.thumbnail_width,
            )),
            transcode: Box::new(TranscodeStage::new(
                config.tools.clone(),
                config.encoding.clone(),
            )),
            probe: Box::new(ProbeStage::new(config.tools.clone())),
        }
    }
}

/// Local path of the fetched source: `{job_dir}/input_{id}.{ext}`.
pub fn source_path(ctx: &StageContext, job: &Job) -> PathBuf {
    ctx.job_dir
        .join(format!("input_{}.{}", job.id, job.source_extension()))
}

/// Downloads the job's source object.
pub struct FetchStage {
    store: Arc<dyn ArtifactStore>,
}

impl FetchStage {
    pub fn new(store: Arc<dyn ArtifactStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Stage for FetchStage {
    type Input = Job;
    type Output = StagedArtifact;

    fn name(&self) -> StageName {
        StageName::Fetch
    }

    async fn run(&self, job: &Job, ctx: &StageContext) -> StageResult<StagedArtifact> {
        let started = Instant::now();
        let local = source_path(ctx, job);
        self.store.download(&job.source_path, &local).await?;

        let size = tokio::fs::metadata(&local).await?.len();
        Ok(StagedArtifact::new(ArtifactKind::SourceVideo, &local)
            .with_attribute(ATTR_SIZE_BYTES, size)
            .with_attribute(
                ATTR_PROCESSING_TIME_SEC,
                round2(started.elapsed().as_secs_f64()),
            ))
    }
}

/// Extracts one scaled JPEG frame.
pub struct ThumbnailStage {
    tools: MediaTools,
    width: u32,
}

impl ThumbnailStage {
    pub fn new(tools: MediaTools, width: u32) -> Self {
        Self { tools, width }
    }
}

#[async_trait]
impl Stage for ThumbnailStage {
    type Input = ThumbnailRequest;
    type Output = StagedArtifact;

    fn name(&self) -> StageName {
        StageName::Thumbnail
    }

    async fn run(&self, req: &ThumbnailRequest, ctx: &StageContext) -> StageResult<StagedArtifact> {
        let output = mw_media::thumbnail_path(&req.video, &req.timestamp);
        let thumb = mw_media::generate_thumbnail(
            &self.tools,
            &ctx.runner(),
            &req.video,
            &req.timestamp,
            self.width,
            &output,
        )
        .await?;

        Ok(StagedArtifact::new(ArtifactKind::Thumbnail, &thumb.path)
            .with_attribute(ATTR_SIZE_BYTES, thumb.size_bytes)
            .with_attribute(ATTR_PROCESSING_TIME_SEC, round2(thumb.processing_time_sec)))
    }
}

/// Encodes an HLS bundle into `{job_dir}/hls_{quality}`.
pub struct TranscodeStage {
    tools: MediaTools,
    encoding: HlsEncoding,
}

impl TranscodeStage {
    pub fn new(tools: MediaTools, encoding: HlsEncoding) -> Self {
        Self { tools, encoding }
    }
}

#[async_trait]
impl Stage for TranscodeStage {
    type Input = TranscodeRequest;
    type Output = StagedArtifact;

    fn name(&self) -> StageName {
        StageName::Transcode
    }

    async fn run(&self, req: &TranscodeRequest, ctx: &StageContext) -> StageResult<StagedArtifact> {
        let started = Instant::now();
        let output_dir = ctx.job_dir.join(format!("hls_{}", req.quality));
        let bundle = mw_media::transcode_to_hls(
            &self.tools,
            &ctx.runner(),
            &self.encoding,
            &req.video,
            &req.quality,
            &output_dir,
        )
        .await?;

        Ok(StagedArtifact::new(ArtifactKind::HlsBundle, &bundle.dir)
            .with_attribute(ATTR_SEGMENTS_COUNT, bundle.segments_count())
            .with_attribute(ATTR_SIZE_BYTES, bundle.total_size_bytes)
            .with_attribute(
                ATTR_PROCESSING_TIME_SEC,
                round2(started.elapsed().as_secs_f64()),
            ))
    }
}

/// Reads container and track metadata with MediaInfo.
pub struct ProbeStage {
    tools: MediaTools,
}

impl ProbeStage {
    pub fn new(tools: MediaTools) -> Self {
        Self { tools }
    }
}

#[async_trait]
impl Stage for ProbeStage {
    type Input = PathBuf;
    type Output = VideoMetadata;

    fn name(&self) -> StageName {
        StageName::Probe
    }

    async fn run(&self, video: &PathBuf, ctx: &StageContext) -> StageResult<VideoMetadata> {
        Ok(mw_media::probe_metadata(&self.tools, &ctx.runner(), video).await?)
    }
}

/// Quality-score input: the original and the encode to compare.
#[derive(Debug, Clone)]
pub struct QualityScoreRequest {
    pub reference: PathBuf,
    pub encoded: PathBuf,
}

/// VMAF/PSNR/SSIM comparison. Not part of the mandatory pipeline; failures
/// are reported in the outcome, never as a stage error.
pub struct QualityScoreStage {
    tools: MediaTools,
}

impl QualityScoreStage {
    pub fn new(tools: MediaTools) -> Self {
        Self { tools }
    }
}

#[async_trait]
impl Stage for QualityScoreStage {
    type Input = QualityScoreRequest;
    type Output = QualityScoreOutcome;

    fn name(&self) -> StageName {
        StageName::QualityScore
    }

    async fn run(
        &self,
        req: &QualityScoreRequest,
        ctx: &StageContext,
    ) -> StageResult<QualityScoreOutcome> {
        let report = vmaf::report_path(&ctx.job_dir, &req.reference);
        Ok(vmaf::score(&self.tools, &ctx.runner(), &req.reference, &req.encoded, &report).await)
    }
}
