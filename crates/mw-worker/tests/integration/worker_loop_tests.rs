//! Worker loop: sequencing, backoff and shutdown.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use mw_queue::QueueError;
use mw_worker::{LoopSettings, WorkerLoop};

use super::support::{job, FakeTranscode, Harness, ScriptedSource, ShutdownProbe};

fn fast_settings() -> LoopSettings {
    LoopSettings {
        poll_timeout: Duration::from_millis(10),
        idle_tick: Duration::from_millis(1),
        error_backoff: Duration::from_secs(5),
        heartbeat_interval: Duration::from_secs(60),
    }
}

#[tokio::test]
async fn test_processes_jobs_in_order_then_stops() {
    let h = Harness::new();
    h.seed_source("videos/a.mp4").await;
    let (tx, rx) = watch::channel(false);

    let source = Arc::new(ScriptedSource::new(
        vec![
            Ok(Some(job("a", "videos/a.mp4", "720p"))),
            Ok(None),
            Ok(Some(job("b", "videos/missing.mp4", "720p"))),
        ],
        tx,
    ));
    let coordinator = Arc::new(h.fake_coordinator());
    let mut worker = WorkerLoop::new(source.clone(), coordinator, fast_settings(), rx);

    worker.run().await;

    assert_eq!(worker.jobs_processed(), 2);
    let writes = h.sink.writes();
    let ids: Vec<&str> = writes.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
    assert!(writes[0].1.is_completed());
    assert!(!writes[1].1.is_completed());
    assert_eq!(source.polls.load(Ordering::SeqCst), 4);
}

#[tokio::test(start_paused = true)]
async fn test_poll_error_backs_off_and_continues() {
    let h = Harness::new();
    let (tx, rx) = watch::channel(false);

    let source = Arc::new(ScriptedSource::new(
        vec![
            Err(QueueError::connection_failed("connection reset")),
            Ok(Some(job("c", "videos/missing.mp4", "480p"))),
        ],
        tx,
    ));
    let coordinator = Arc::new(h.fake_coordinator());
    let mut worker = WorkerLoop::new(source, coordinator, fast_settings(), rx);

    let started = tokio::time::Instant::now();
    worker.run().await;

    assert!(started.elapsed() >= Duration::from_secs(5));
    assert_eq!(worker.jobs_processed(), 1);
    assert_eq!(h.sink.writes().len(), 1);
}

#[tokio::test]
async fn test_shutdown_mid_job_finishes_job_then_stops() {
    let h = Harness::new();
    h.seed_source("videos/a.mp4").await;
    let (tx, rx) = watch::channel(false);

    let (script_tx, _script_rx) = watch::channel(false);
    let source = Arc::new(ScriptedSource::new(
        vec![
            Ok(Some(job("g", "videos/a.mp4", "720p"))),
            Ok(Some(job("h", "videos/a.mp4", "720p"))),
        ],
        script_tx,
    ));
    let stages = h.stages_with(FakeTranscode::new(), Box::new(ShutdownProbe { shutdown: tx }));
    let coordinator = Arc::new(h.coordinator(stages));
    let mut worker = WorkerLoop::new(source.clone(), coordinator, fast_settings(), rx);

    worker.run().await;

    assert_eq!(worker.jobs_processed(), 1);
    assert_eq!(source.polls.load(Ordering::SeqCst), 1);
    let writes = h.sink.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].0.as_str(), "g");
    assert!(writes[0].1.is_completed());
    assert!(!h.work_dir().join("g").exists());
}

#[tokio::test]
async fn test_shutdown_before_start_polls_nothing() {
    let h = Harness::new();
    let (tx, rx) = watch::channel(false);
    tx.send(true).unwrap();

    let (script_tx, _script_rx) = watch::channel(false);
    let source = Arc::new(ScriptedSource::new(
        vec![Ok(Some(job("d", "videos/a.mp4", "720p")))],
        script_tx,
    ));
    let coordinator = Arc::new(h.fake_coordinator());
    let mut worker = WorkerLoop::new(source.clone(), coordinator, fast_settings(), rx);

    worker.run().await;

    assert_eq!(source.polls.load(Ordering::SeqCst), 0);
    assert!(h.sink.writes().is_empty());
}

#[tokio::test]
async fn test_dispatch_reports_success_flag() {
    let h = Harness::new();
    h.seed_source("videos/a.mp4").await;
    let (_tx, rx) = watch::channel(false);
    let (script_tx, _script_rx) = watch::channel(false);
    let source = Arc::new(ScriptedSource::new(Vec::new(), script_tx));
    let mut worker = WorkerLoop::new(source, Arc::new(h.fake_coordinator()), fast_settings(), rx);

    assert!(worker.dispatch(job("e", "videos/a.mp4", "720p")).await);
    assert!(!worker.dispatch(job("f", "videos/a.mp4", "8k")).await);
    assert_eq!(worker.jobs_processed(), 2);
}
