//! Coordinator behaviour: terminal status, publishing and cleanup.

use std::sync::atomic::Ordering;
use std::time::Duration;

use mw_models::{FailureKind, TaskResult};

use super::support::{
    job, leftover_files, FailingProbe, FakeProbe, FakeTranscode, HangingProbe, Harness,
    PanickingProbe, RecordingSink, SEGMENTS,
};

#[tokio::test]
async fn test_valid_job_completes_and_publishes() {
    let h = Harness::new();
    h.seed_source("videos/input.mp4").await;
    let coordinator = h.fake_coordinator();

    let result = coordinator.process(&job("t1", "videos/input.mp4", "720p")).await;

    let completed = result.as_completed().expect("job should complete");
    assert_eq!(completed.hls_segments_count, SEGMENTS);
    assert_eq!(
        completed.thumbnail_url,
        "http://minio:9000/media/processed/t1_thumbnail.jpg"
    );
    assert_eq!(
        completed.master_playlist_url,
        "http://minio:9000/media/processed/t1_hls/master.m3u8"
    );
    assert!(completed.total_size_mb > 0.0);
    assert_eq!(completed.metadata.filename, "input_t1.mp4");

    assert!(h.object("processed/t1_thumbnail.jpg").exists());
    assert!(h.object("processed/t1_hls/master.m3u8").exists());
    for i in 0..SEGMENTS {
        assert!(h.object(&format!("processed/t1_hls/master{}.ts", i)).exists());
    }

    let writes = h.sink.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].0.as_str(), "t1");
    assert!(writes[0].1.is_completed());

    assert!(!h.work_dir().join("t1").exists());
}

#[tokio::test]
async fn test_unknown_quality_fails_with_all_labels() {
    let h = Harness::new();
    h.seed_source("videos/input.mp4").await;
    let transcode = FakeTranscode::new();
    let spawned = transcode.spawned.clone();
    let coordinator = h.coordinator(h.stages_with(transcode, Box::new(FakeProbe)));

    let result = coordinator.process(&job("t2", "videos/input.mp4", "4k")).await;

    let failed = result.as_failed().expect("job should fail");
    assert_eq!(failed.error_kind, FailureKind::ConfigurationError);
    for label in ["480p", "720p", "1080p"] {
        assert!(failed.error.contains(label), "{}", failed.error);
    }
    assert_eq!(spawned.load(Ordering::SeqCst), 0);

    // Fetch and thumbnail outputs were staged before the failure.
    assert_eq!(failed.attempted_files.len(), 2);
    assert!(!h.work_dir().join("t2").exists());
    assert_eq!(h.sink.writes().len(), 1);
}

#[tokio::test]
async fn test_missing_source_is_not_found() {
    let h = Harness::new();
    let coordinator = h.fake_coordinator();

    let result = coordinator.process(&job("t3", "videos/missing.mp4", "720p")).await;

    let failed = result.as_failed().expect("job should fail");
    assert_eq!(failed.error_kind, FailureKind::NotFound);
    assert!(failed.error.contains("videos/missing.mp4"));
    let local_video = h.work_dir().join("t3/input_t3.mp4");
    assert!(!failed
        .attempted_files
        .contains(&local_video.display().to_string()));
    assert!(failed.attempted_files.is_empty());
    assert_eq!(h.sink.writes().len(), 1);
}

#[tokio::test]
async fn test_stage_failure_keeps_tool_stderr() {
    let h = Harness::new();
    h.seed_source("videos/input.mp4").await;
    let coordinator = h.coordinator(h.stages_with(FakeTranscode::new(), Box::new(FailingProbe)));

    let result = coordinator.process(&job("t4", "videos/input.mp4", "480p")).await;

    let failed = result.as_failed().expect("job should fail");
    assert_eq!(failed.error_kind, FailureKind::ExternalToolFailure);
    assert_eq!(failed.error, "probe failed: MediaInfo error: E: corrupt header");
    assert_eq!(
        failed.error_detail.as_deref(),
        Some("Unable to open file\nE: corrupt header")
    );
    assert_eq!(failed.attempted_files.len(), 3);
    assert!(leftover_files(&h.work_dir()).is_empty());
}

#[tokio::test]
async fn test_missing_segment_fails_verification_and_publishes_nothing() {
    let h = Harness::new();
    h.seed_source("videos/input.mp4").await;
    let transcode = FakeTranscode {
        drop_segment: true,
        ..FakeTranscode::new()
    };
    let coordinator = h.coordinator(h.stages_with(transcode, Box::new(FakeProbe)));

    let result = coordinator.process(&job("t5", "videos/input.mp4", "720p")).await;

    let failed = result.as_failed().expect("job should fail");
    assert_eq!(failed.error_kind, FailureKind::MalformedOutput);
    assert!(failed.error.starts_with("verify failed"));
    assert!(!h.object("processed/t5_thumbnail.jpg").exists());
    assert!(!h.work_dir().join("t5").exists());
}

#[tokio::test]
async fn test_panic_is_reported_and_cleaned_up() {
    let h = Harness::new();
    h.seed_source("videos/input.mp4").await;
    let coordinator = h.coordinator(h.stages_with(FakeTranscode::new(), Box::new(PanickingProbe)));

    let result = coordinator.process(&job("t6", "videos/input.mp4", "720p")).await;

    let failed = result.as_failed().expect("job should fail");
    assert_eq!(failed.error_kind, FailureKind::ExternalToolFailure);
    assert_eq!(failed.error, "internal error: probe exploded");
    assert!(failed.error_detail.is_none());
    assert_eq!(h.sink.writes().len(), 1);
    assert!(!h.work_dir().join("t6").exists());
}

#[tokio::test(start_paused = true)]
async fn test_job_budget_times_out() {
    let h = Harness::new();
    h.seed_source("videos/input.mp4").await;
    let coordinator = h.coordinator_with_budget(
        h.stages_with(FakeTranscode::new(), Box::new(HangingProbe)),
        Duration::from_secs(30),
    );

    let result = coordinator.process(&job("t7", "videos/input.mp4", "720p")).await;

    let failed = result.as_failed().expect("job should fail");
    assert_eq!(failed.error_kind, FailureKind::Timeout);
    assert!(!h.work_dir().join("t7").exists());
}

#[tokio::test]
async fn test_sink_failure_does_not_change_outcome() {
    let h = Harness::with_sink(RecordingSink::failing());
    h.seed_source("videos/input.mp4").await;
    let coordinator = h.fake_coordinator();

    let result = coordinator.process(&job("t8", "videos/input.mp4", "1080p")).await;

    assert!(result.is_completed());
    assert_eq!(h.sink.writes().len(), 1);
    assert!(!h.work_dir().join("t8").exists());
}

#[tokio::test]
async fn test_path_like_job_id_is_rejected() {
    let h = Harness::new();
    h.seed_source("videos/input.mp4").await;
    let coordinator = h.fake_coordinator();

    let result = coordinator
        .process(&job("../escape", "videos/input.mp4", "720p"))
        .await;

    let failed = result.as_failed().expect("job should fail");
    assert_eq!(failed.error_kind, FailureKind::ConfigurationError);
    assert!(failed.attempted_files.is_empty());
    assert_eq!(h.sink.writes().len(), 1);
}

#[tokio::test]
async fn test_status_fields_for_failed_job() {
    let h = Harness::new();
    let coordinator = h.fake_coordinator();

    let result = coordinator.process(&job("t9", "videos/missing.mp4", "720p")).await;
    let fields = result.status_fields().unwrap();
    let get = |name: &str| fields.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str());

    assert!(matches!(result, TaskResult::Failed(_)));
    assert_eq!(get("status"), Some("failed"));
    assert_eq!(get("error_kind"), Some("not_found"));
    assert_eq!(get("attempted_files"), Some("[]"));
    assert!(get("error_time").is_some());
}
