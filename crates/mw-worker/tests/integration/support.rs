//! Fake collaborators and stages.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::sync::watch;

use mw_media::MediaError;
use mw_models::artifact::{ATTR_SEGMENTS_COUNT, ATTR_SIZE_BYTES};
use mw_models::{
    ArtifactKind, Job, JobId, QualityProfile, StagedArtifact, TaskResult, VideoMetadata,
    VideoTrack,
};
use mw_queue::{JobSource, QueueError, QueueResult, ResultSink};
use mw_storage::{ArtifactStore, LocalStore};
use mw_worker::{
    FetchStage, PipelineCoordinator, Stage, StageContext, StageError, StageName, StageResult,
    Stages, ThumbnailRequest, TranscodeRequest,
};

pub const SEGMENTS: usize = 3;

/// Records every status write.
#[derive(Default)]
pub struct RecordingSink {
    pub writes: Mutex<Vec<(JobId, TaskResult)>>,
    pub fail: bool,
}

impl RecordingSink {
    pub fn failing() -> Self {
        Self {
            writes: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn writes(&self) -> Vec<(JobId, TaskResult)> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResultSink for RecordingSink {
    async fn write(&self, job_id: &JobId, result: &TaskResult) -> QueueResult<()> {
        self.writes
            .lock()
            .unwrap()
            .push((job_id.clone(), result.clone()));
        if self.fail {
            return Err(QueueError::sink_write_failure(job_id.as_str(), "redis down"));
        }
        Ok(())
    }
}

/// Writes a small JPEG-named file next to the video.
pub struct FakeThumbnail;

#[async_trait]
impl Stage for FakeThumbnail {
    type Input = ThumbnailRequest;
    type Output = StagedArtifact;

    fn name(&self) -> StageName {
        StageName::Thumbnail
    }

    async fn run(&self, req: &ThumbnailRequest, _ctx: &StageContext) -> StageResult<StagedArtifact> {
        let path = mw_media::thumbnail_path(&req.video, &req.timestamp);
        tokio::fs::write(&path, vec![0xFFu8; 1024]).await?;
        Ok(StagedArtifact::new(ArtifactKind::Thumbnail, &path).with_attribute(ATTR_SIZE_BYTES, 1024u64))
    }
}

/// Resolves the quality like the real stage, then writes a playlist and
/// [`SEGMENTS`] segments.
pub struct FakeTranscode {
    pub spawned: Arc<AtomicUsize>,
    pub drop_segment: bool,
}

impl FakeTranscode {
    pub fn new() -> Self {
        Self {
            spawned: Arc::new(AtomicUsize::new(0)),
            drop_segment: false,
        }
    }
}

#[async_trait]
impl Stage for FakeTranscode {
    type Input = TranscodeRequest;
    type Output = StagedArtifact;

    fn name(&self) -> StageName {
        StageName::Transcode
    }

    async fn run(&self, req: &TranscodeRequest, ctx: &StageContext) -> StageResult<StagedArtifact> {
        QualityProfile::lookup(&req.quality).map_err(MediaError::from)?;
        self.spawned.fetch_add(1, Ordering::SeqCst);

        let dir = ctx.job_dir.join(format!("hls_{}", req.quality));
        tokio::fs::create_dir_all(&dir).await?;

        let mut playlist = String::from("#EXTM3U\n#EXT-X-TARGETDURATION:10\n");
        for i in 0..SEGMENTS {
            let name = format!("master{}.ts", i);
            playlist.push_str(&format!("#EXTINF:10.0,\n{}\n", name));
            if !(self.drop_segment && i == SEGMENTS - 1) {
                tokio::fs::write(dir.join(&name), vec![0u8; 4096]).await?;
            }
        }
        playlist.push_str("#EXT-X-ENDLIST\n");
        tokio::fs::write(dir.join("master.m3u8"), playlist).await?;

        Ok(StagedArtifact::new(ArtifactKind::HlsBundle, &dir)
            .with_attribute(ATTR_SEGMENTS_COUNT, SEGMENTS))
    }
}

pub fn sample_metadata(filename: &str) -> VideoMetadata {
    VideoMetadata {
        filename: filename.to_string(),
        filesize_bytes: 2048,
        duration_sec: 30.0,
        video: VideoTrack {
            codec: "AVC".to_string(),
            width: 1920,
            height: 1080,
            frame_rate: 25.0,
            bit_rate: 4_000_000,
        },
        audio: None,
    }
}

pub struct FakeProbe;

#[async_trait]
impl Stage for FakeProbe {
    type Input = PathBuf;
    type Output = VideoMetadata;

    fn name(&self) -> StageName {
        StageName::Probe
    }

    async fn run(&self, video: &PathBuf, _ctx: &StageContext) -> StageResult<VideoMetadata> {
        let name = video
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Ok(sample_metadata(&name))
    }
}

/// Probe that requests shutdown while its job is still in flight.
pub struct ShutdownProbe {
    pub shutdown: watch::Sender<bool>,
}

#[async_trait]
impl Stage for ShutdownProbe {
    type Input = PathBuf;
    type Output = VideoMetadata;

    fn name(&self) -> StageName {
        StageName::Probe
    }

    async fn run(&self, video: &PathBuf, ctx: &StageContext) -> StageResult<VideoMetadata> {
        let _ = self.shutdown.send(true);
        tokio::task::yield_now().await;
        FakeProbe.run(video, ctx).await
    }
}

/// Probe that panics, to exercise the dispatch boundary.
pub struct PanickingProbe;

#[async_trait]
impl Stage for PanickingProbe {
    type Input = PathBuf;
    type Output = VideoMetadata;

    fn name(&self) -> StageName {
        StageName::Probe
    }

    async fn run(&self, _video: &PathBuf, _ctx: &StageContext) -> StageResult<VideoMetadata> {
        panic!("probe exploded");
    }
}

/// Probe that fails the way a broken mediainfo would.
pub struct FailingProbe;

#[async_trait]
impl Stage for FailingProbe {
    type Input = PathBuf;
    type Output = VideoMetadata;

    fn name(&self) -> StageName {
        StageName::Probe
    }

    async fn run(&self, _video: &PathBuf, _ctx: &StageContext) -> StageResult<VideoMetadata> {
        Err(MediaError::tool_failed("MediaInfo", "Unable to open file\nE: corrupt header", Some(1)).into())
    }
}

/// Probe that never finishes on its own.
pub struct HangingProbe;

#[async_trait]
impl Stage for HangingProbe {
    type Input = PathBuf;
    type Output = VideoMetadata;

    fn name(&self) -> StageName {
        StageName::Probe
    }

    async fn run(&self, _video: &PathBuf, _ctx: &StageContext) -> StageResult<VideoMetadata> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Err(StageError::MalformedOutput("unreachable".to_string()))
    }
}

/// A scratch area with a local object store and a work directory.
pub struct Harness {
    pub tmp: TempDir,
    pub store: Arc<LocalStore>,
    pub sink: Arc<RecordingSink>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_sink(RecordingSink::default())
    }

    pub fn with_sink(sink: RecordingSink) -> Self {
        let tmp = TempDir::new().unwrap();
        let store = Arc::new(LocalStore::new(
            tmp.path().join("objects"),
            "media",
            "http://minio:9000",
        ));
        Self {
            tmp,
            store,
            sink: Arc::new(sink),
        }
    }

    pub fn work_dir(&self) -> PathBuf {
        self.tmp.path().join("work")
    }

    pub fn object(&self, key: &str) -> PathBuf {
        self.tmp.path().join("objects/media").join(key)
    }

    /// Put a fake source video into the store.
    pub async fn seed_source(&self, key: &str) {
        let src = self.tmp.path().join("seed.bin");
        tokio::fs::write(&src, vec![7u8; 2048]).await.unwrap();
        self.store.upload(&src, key).await.unwrap();
        tokio::fs::remove_file(&src).await.unwrap();
    }

    pub fn stages_with(
        &self,
        transcode: FakeTranscode,
        probe: Box<dyn Stage<Input = PathBuf, Output = VideoMetadata>>,
    ) -> Stages {
        let store: Arc<dyn ArtifactStore> = self.store.clone();
        Stages {
            fetch: Box::new(FetchStage::new(store)),
            thumbnail: Box::new(FakeThumbnail),
            transcode: Box::new(transcode),
            probe,
        }
    }

    pub fn coordinator(&self, stages: Stages) -> PipelineCoordinator {
        self.coordinator_with_budget(stages, Duration::from_secs(60))
    }

    pub fn coordinator_with_budget(&self, stages: Stages, budget: Duration) -> PipelineCoordinator {
        PipelineCoordinator::new(
            stages,
            self.store.clone(),
            self.sink.clone(),
            self.work_dir(),
            budget,
        )
    }

    pub fn fake_coordinator(&self) -> PipelineCoordinator {
        self.coordinator(self.stages_with(FakeTranscode::new(), Box::new(FakeProbe)))
    }
}

pub fn job(id: &str, source: &str, quality: &str) -> Job {
    Job::new(id, source, "00:00:05", quality, format!("processed/{}", id))
}

/// Files left under `dir`, recursively.
pub fn leftover_files(dir: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                out.extend(leftover_files(&path));
            } else {
                out.push(path);
            }
        }
    }
    out
}

/// Job source that replays a script, then requests shutdown.
pub struct ScriptedSource {
    script: Mutex<VecDeque<QueueResult<Option<Job>>>>,
    shutdown: watch::Sender<bool>,
    pub polls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(script: Vec<QueueResult<Option<Job>>>, shutdown: watch::Sender<bool>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            shutdown,
            polls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl JobSource for ScriptedSource {
    async fn poll(&self, _timeout: Duration) -> QueueResult<Option<Job>> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(item) => item,
            None => {
                let _ = self.shutdown.send(true);
                Ok(None)
            }
        }
    }
}
