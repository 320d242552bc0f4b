//! End-to-end runs against the real tools.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::process::Command;

use mw_storage::ArtifactStore;
use mw_worker::{
    PipelineCoordinator, QualityScoreRequest, QualityScoreStage, Stage, StageContext, Stages,
    WorkerConfig,
};

use super::support::{job, Harness};

/// Render a synthetic clip with ffmpeg's test sources.
async fn render_clip(path: &Path, seconds: u32, with_audio: bool) {
    let mut cmd = Command::new("ffmpeg");
    cmd.args(["-hide_banner", "-loglevel", "error", "-f", "lavfi", "-i"])
        .arg(format!("testsrc=duration={}:size=1280x720:rate=25", seconds));
    if with_audio {
        cmd.args(["-f", "lavfi", "-i"])
            .arg(format!("sine=frequency=440:duration={}", seconds))
            .args(["-c:a", "aac"]);
    }
    cmd.args(["-c:v", "libx264", "-pix_fmt", "yuv420p", "-shortest", "-y"])
        .arg(path);

    let status = cmd.status().await.expect("ffmpeg should run");
    assert!(status.success());
}

fn config_for(h: &Harness) -> WorkerConfig {
    WorkerConfig {
        work_dir: h.work_dir(),
        max_processing_time: Duration::from_secs(300),
        ..WorkerConfig::from_env()
    }
}

async fn seed_rendered(h: &Harness, key: &str, with_audio: bool) -> PathBuf {
    let clip = h.tmp.path().join("render.mp4");
    render_clip(&clip, 12, with_audio).await;
    h.store.upload(&clip, key).await.unwrap();
    clip
}

#[tokio::test]
#[ignore = "requires ffmpeg and mediainfo"]
async fn test_real_pipeline_completes() {
    let h = Harness::new();
    seed_rendered(&h, "videos/input.mp4", true).await;

    let config = config_for(&h);
    let coordinator = PipelineCoordinator::new(
        Stages::media(&config, h.store.clone()),
        h.store.clone(),
        h.sink.clone(),
        h.work_dir(),
        config.max_processing_time,
    );

    let result = coordinator.process(&job("t1", "videos/input.mp4", "720p")).await;

    let completed = result.as_completed().expect("pipeline should complete");
    assert!(completed.hls_segments_count > 0);
    assert!(!completed.thumbnail_url.is_empty());
    assert!(!completed.master_playlist_url.is_empty());
    assert_eq!(completed.metadata.video.width, 1280);
    assert!(completed.metadata.has_audio());
    assert!(h.object("processed/t1_hls/master.m3u8").exists());
    assert!(!h.work_dir().join("t1").exists());
}

#[tokio::test]
#[ignore = "requires ffmpeg and mediainfo"]
async fn test_silent_source_has_no_audio_metadata() {
    let h = Harness::new();
    seed_rendered(&h, "videos/silent.mp4", false).await;

    let config = config_for(&h);
    let coordinator = PipelineCoordinator::from_config(&config, h.store.clone(), h.sink.clone());

    let result = coordinator.process(&job("s1", "videos/silent.mp4", "480p")).await;

    let completed = result.as_completed().expect("pipeline should complete");
    assert!(!completed.metadata.has_audio());
    let json = serde_json::to_value(&completed.metadata).unwrap();
    assert!(json.get("audio").is_none());
}

#[tokio::test]
#[ignore = "requires ffmpeg built with libvmaf"]
async fn test_quality_score_of_reencode() {
    let h = Harness::new();
    let reference = h.tmp.path().join("reference.mp4");
    let encoded = h.tmp.path().join("encoded.mp4");
    render_clip(&reference, 3, false).await;

    let status = Command::new("ffmpeg")
        .args(["-hide_banner", "-loglevel", "error", "-i"])
        .arg(&reference)
        .args(["-c:v", "libx264", "-b:v", "1000k", "-y"])
        .arg(&encoded)
        .status()
        .await
        .unwrap();
    assert!(status.success());

    let stage = QualityScoreStage::new(WorkerConfig::from_env().tools);
    let ctx = StageContext::new(h.tmp.path().join("reports"), Duration::from_secs(300));
    let outcome = stage
        .run(&QualityScoreRequest { reference, encoded }, &ctx)
        .await
        .unwrap();

    let score = outcome.score().expect("scoring should succeed");
    assert!(score.vmaf_score > 50.0);
    assert!(score.frames_processed > 0);
    assert!(Path::new(&score.json_report).exists());
}
