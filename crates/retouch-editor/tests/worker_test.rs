//! Worker client protocol tests: supersession, timeouts, throttling, panics.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use retouch_core::Raster;
use retouch_editor::{EditorError, PipelineWorkerClient, WorkerConfig};
use retouch_ops::{EffectParams, PixelPipeline};

fn config(timeout_ms: u64, throttle_ms: u64) -> WorkerConfig {
    WorkerConfig {
        timeout_ms,
        throttle_ms,
        thread_name: "test-pipeline".into(),
    }
}

/// Pipeline that sleeps for the current value of `delay_ms` before running.
fn delayed(delay_ms: Arc<AtomicU64>) -> impl Fn(Raster, &EffectParams) -> Raster + Send + 'static {
    move |mut raster, params| {
        thread::sleep(Duration::from_millis(delay_ms.load(Ordering::SeqCst)));
        if params.blur == 99 {
            panic!("simulated stage failure");
        }
        PixelPipeline::apply_in_place(&mut raster, params);
        raster
    }
}

fn source() -> Raster {
    Raster::filled(16, 16, [90, 120, 150, 255])
}

fn bright(v: f64) -> EffectParams {
    EffectParams {
        brightness: v,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_request_round_trip() {
    let client = PipelineWorkerClient::spawn(config(5000, 0)).unwrap();
    let out = client.request(source(), bright(30.0)).await.unwrap();
    assert_eq!(out, PixelPipeline::run(&source(), &bright(30.0)));
    assert_eq!(client.pending_count(), 0);
}

#[tokio::test]
async fn test_newer_submit_supersedes_pending() {
    let delay = Arc::new(AtomicU64::new(100));
    let client = PipelineWorkerClient::spawn_with(config(5000, 0), delayed(delay)).unwrap();

    let first = client.submit(source(), bright(10.0)).unwrap();
    let second = client.submit(source(), bright(20.0)).unwrap();
    let first_id = first.id();
    assert!(second.id() > first_id);
    assert_eq!(client.pending_count(), 1);

    let err = first.wait().await.unwrap_err();
    assert_eq!(err, EditorError::RequestSuperseded { id: first_id });
    assert!(err.is_benign());

    let out = second.wait().await.unwrap();
    assert_eq!(out, PixelPipeline::run(&source(), &bright(20.0)));
}

#[tokio::test]
async fn test_burst_resolves_only_last() {
    let delay = Arc::new(AtomicU64::new(30));
    let client = PipelineWorkerClient::spawn_with(config(5000, 0), delayed(delay)).unwrap();

    let mut handles = Vec::new();
    for v in 1..=5 {
        handles.push(client.submit(source(), bright(v as f64)).unwrap());
    }
    let last = handles.pop().unwrap();
    for h in handles {
        assert!(h.wait().await.unwrap_err().is_benign());
    }
    let out = last.wait().await.unwrap();
    assert_eq!(out.pixel(0, 0), [95, 125, 155, 255]);
}

#[tokio::test]
async fn test_timeout_and_late_response() {
    let delay = Arc::new(AtomicU64::new(100));
    let client =
        PipelineWorkerClient::spawn_with(config(20, 0), delayed(Arc::clone(&delay))).unwrap();

    let pending = client.submit(source(), bright(5.0)).unwrap();
    let id = pending.id();
    let err = pending.wait().await.unwrap_err();
    assert_eq!(
        err,
        EditorError::RequestTimeout {
            id,
            timeout: Duration::from_millis(20)
        }
    );
    assert!(err.is_retryable());
    assert_eq!(client.pending_count(), 0);

    // Let the late response arrive; it must be dropped without effect.
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(client.pending_count(), 0);

    delay.store(0, Ordering::SeqCst);
    let out = client.submit(source(), bright(7.0)).unwrap().wait().await.unwrap();
    assert_eq!(out.pixel(3, 3), [97, 127, 157, 255]);
}

#[tokio::test]
async fn test_panic_becomes_failure() {
    let delay = Arc::new(AtomicU64::new(0));
    let client = PipelineWorkerClient::spawn_with(config(5000, 0), delayed(delay)).unwrap();

    let broken = EffectParams {
        blur: 99,
        ..Default::default()
    };
    let err = client.request(source(), broken).await.unwrap_err();
    match err {
        EditorError::PipelineFailed { reason, .. } => {
            assert!(reason.contains("simulated stage failure"))
        }
        other => panic!("unexpected {other:?}"),
    }

    // Worker survives the panic.
    let out = client.request(source(), bright(1.0)).await.unwrap();
    assert_eq!(out.pixel(0, 0), [91, 121, 151, 255]);
}

#[tokio::test]
async fn test_throttle_spaces_dispatches() {
    let client = PipelineWorkerClient::spawn(config(5000, 80)).unwrap();
    let start = Instant::now();
    client.request(source(), bright(1.0)).await.unwrap();
    client.request(source(), bright(2.0)).await.unwrap();
    assert!(start.elapsed() >= Duration::from_millis(75));
}

#[tokio::test]
async fn test_shutdown_fails_fast() {
    let mut client = PipelineWorkerClient::spawn(config(5000, 0)).unwrap();
    client.shutdown();
    assert!(!client.is_running());
    let err = client.request(source(), bright(1.0)).await.unwrap_err();
    assert!(matches!(err, EditorError::WorkerUnavailable(_)));
}

#[tokio::test]
async fn test_concurrent_requests_keep_throttle_and_order() {
    let starts: Arc<Mutex<Vec<(f64, Instant)>>> = Arc::default();
    let log = Arc::clone(&starts);
    let client = PipelineWorkerClient::spawn_with(config(5000, 100), move |mut raster, params| {
        log.lock().unwrap().push((params.brightness, Instant::now()));
        PixelPipeline::apply_in_place(&mut raster, params);
        raster
    })
    .unwrap();

    client.request(source(), bright(1.0)).await.unwrap();
    let (_, last) = tokio::join!(
        client.request(source(), bright(2.0)),
        client.request(source(), bright(3.0))
    );
    assert_eq!(last.unwrap().pixel(0, 0), [93, 123, 153, 255]);

    let starts = starts.lock().unwrap();
    let order: Vec<f64> = starts.iter().map(|(b, _)| *b).collect();
    assert_eq!(order, [1.0, 2.0, 3.0]);
    for pair in starts.windows(2) {
        assert!(pair[1].1 - pair[0].1 >= Duration::from_millis(80));
    }
}

#[tokio::test]
async fn test_drop_does_not_wait_for_render() {
    let delay = Arc::new(AtomicU64::new(400));
    let client = PipelineWorkerClient::spawn_with(config(5000, 0), delayed(delay)).unwrap();
    let pending = client.submit(source(), bright(1.0)).unwrap();

    // Give the worker time to pick the job up.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let start = Instant::now();
    drop(client);
    assert!(start.elapsed() < Duration::from_millis(200));
    drop(pending);
}
