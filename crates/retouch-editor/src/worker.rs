//! Off-thread pipeline execution with explicit request ids.
//!
//! # Threads
//!
//! ```text
//!  caller ──submit──> [request channel] ──> worker thread (runs pipeline)
//!    ^                                          │
//!    │ oneshot                                  v
//!  pending table <──── router thread <── [response channel]
//! ```
//!
//! - The **worker** is stateless between jobs: it receives
//!   `{id, raster, params}` and answers `{id, success, raster?, error?}`.
//!   A panic inside the pipeline becomes `success = false`.
//! - The **router** matches each response to the pending table by id.
//!   Responses with no entry (superseded or timed out) are dropped.
//!
//! # Supersession
//!
//! Submitting a request rejects every request still pending with
//! [`EditorError::RequestSuperseded`]. Only the newest request can resolve
//! with a raster. Jobs already queued behind a newer one are skipped by the
//! worker instead of rendered.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use retouch_core::Raster;
use retouch_ops::{EffectParams, PixelPipeline};
use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

use crate::config::WorkerConfig;
use crate::messages::{RequestId, WorkerMsg, WorkerRequest, WorkerResponse};
use crate::{EditorError, EditorResult};

type Reply = oneshot::Sender<EditorResult<Raster>>;
type PendingTable = Arc<Mutex<HashMap<RequestId, Reply>>>;
type RenderFn = Box<dyn Fn(Raster, &EffectParams) -> Raster + Send>;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// Worker thread
// =============================================================================

struct PipelineHandler {
    rx: Receiver<WorkerMsg>,
    tx: Sender<WorkerResponse>,
    render: RenderFn,
}

impl PipelineHandler {
    fn run(self) {
        while let Ok(msg) = self.rx.recv() {
            let WorkerMsg::Render(mut req) = msg else {
                break;
            };

            // Skip anything already replaced by a newer queued job.
            let mut shutdown = false;
            while let Ok(next) = self.rx.try_recv() {
                match next {
                    WorkerMsg::Render(newer) => {
                        trace!(id = req.id, by = newer.id, "Skipping queued render");
                        let stale = WorkerResponse::failed(req.id, "superseded before start");
                        if self.tx.send(stale).is_err() {
                            return;
                        }
                        req = newer;
                    }
                    WorkerMsg::Shutdown => {
                        shutdown = true;
                        break;
                    }
                }
            }

            if self.tx.send(self.execute(req)).is_err() || shutdown {
                break;
            }
        }
        debug!("Pipeline worker shutdown");
    }

    fn execute(&self, req: WorkerRequest) -> WorkerResponse {
        let WorkerRequest { id, raster, params } = req;
        trace!(id, width = raster.width(), height = raster.height(), "Rendering");
        let render = &self.render;
        match panic::catch_unwind(AssertUnwindSafe(|| render(raster, &params))) {
            Ok(out) => WorkerResponse::ok(id, out),
            Err(payload) => {
                let reason = panic_message(&*payload);
                warn!(id, %reason, "Pipeline panicked");
                WorkerResponse::failed(id, reason)
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "pipeline panicked".to_string()
    }
}

fn route_responses(rx: Receiver<WorkerResponse>, pending: PendingTable) {
    while let Ok(resp) = rx.recv() {
        let waiter = lock(&pending).remove(&resp.id);
        match waiter {
            Some(tx) => {
                let _ = tx.send(resp.into_result());
            }
            None => trace!(id = resp.id, "Dropping response with no pending request"),
        }
    }

    // Worker gone: nobody will answer what is still pending.
    for (id, tx) in lock(&pending).drain() {
        trace!(id, "Failing pending request, worker exited");
        let _ = tx.send(Err(EditorError::WorkerUnavailable("worker exited".into())));
    }
}

// =============================================================================
// Client
// =============================================================================

/// Handle to a dispatched request.
///
/// Dropping it abandons the request; the eventual response is discarded.
#[derive(Debug)]
pub struct PendingRender {
    id: RequestId,
    rx: oneshot::Receiver<EditorResult<Raster>>,
    timeout: Duration,
    pending: PendingTable,
}

impl PendingRender {
    /// Id assigned at dispatch.
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Waits for the response, up to the configured timeout.
    ///
    /// On timeout the request is removed from the pending table, so a late
    /// response for it is a no-op.
    pub async fn wait(self) -> EditorResult<Raster> {
        let Self {
            id,
            rx,
            timeout,
            pending,
        } = self;

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(EditorError::WorkerUnavailable(
                "response channel closed".into(),
            )),
            Err(_) => {
                lock(&pending).remove(&id);
                warn!(id, ?timeout, "Render timed out");
                Err(EditorError::RequestTimeout { id, timeout })
            }
        }
    }
}

/// Client side of the pipeline worker.
///
/// # Example
///
/// ```rust,no_run
/// use retouch_core::Raster;
/// use retouch_editor::{PipelineWorkerClient, WorkerConfig};
/// use retouch_ops::EffectParams;
///
/// # async fn demo() -> retouch_editor::EditorResult<()> {
/// let client = PipelineWorkerClient::spawn(WorkerConfig::default())?;
/// let out = client
///     .request(Raster::filled(64, 64, [90, 90, 90, 255]), EffectParams::default())
///     .await?;
/// assert_eq!(out.dimensions(), (64, 64));
/// # Ok(())
/// # }
/// ```
pub struct PipelineWorkerClient {
    config: WorkerConfig,
    requests: Option<Sender<WorkerMsg>>,
    pending: PendingTable,
    next_id: AtomicU64,
    last_dispatch: Mutex<Option<Instant>>,
    worker: Option<JoinHandle<()>>,
    router: Option<JoinHandle<()>>,
}

impl PipelineWorkerClient {
    /// Starts a worker running [`PixelPipeline`].
    pub fn spawn(config: WorkerConfig) -> EditorResult<Self> {
        Self::spawn_with(config, |mut raster, params| {
            PixelPipeline::apply_in_place(&mut raster, params);
            raster
        })
    }

    /// Starts a worker running a custom render function.
    pub fn spawn_with<F>(config: WorkerConfig, render: F) -> EditorResult<Self>
    where
        F: Fn(Raster, &EffectParams) -> Raster + Send + 'static,
    {
        let (req_tx, req_rx) = mpsc::channel();
        let (resp_tx, resp_rx) = mpsc::channel();
        let pending: PendingTable = Arc::default();

        let handler = PipelineHandler {
            rx: req_rx,
            tx: resp_tx,
            render: Box::new(render),
        };
        let worker = thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || handler.run())
            .map_err(|e| EditorError::WorkerUnavailable(format!("spawn worker: {e}")))?;

        let router_pending = Arc::clone(&pending);
        let router = thread::Builder::new()
            .name(format!("{}-router", config.thread_name))
            .spawn(move || route_responses(resp_rx, router_pending))
            .map_err(|e| EditorError::WorkerUnavailable(format!("spawn router: {e}")))?;

        debug!(thread = %config.thread_name, "Pipeline worker started");
        Ok(Self {
            config,
            requests: Some(req_tx),
            pending,
            next_id: AtomicU64::new(0),
            last_dispatch: Mutex::new(None),
            worker: Some(worker),
            router: Some(router),
        })
    }

    /// Client settings.
    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Dispatches a render, superseding every request still pending.
    pub fn submit(&self, raster: Raster, params: EffectParams) -> EditorResult<PendingRender> {
        let requests = self
            .requests
            .as_ref()
            .ok_or_else(|| EditorError::WorkerUnavailable("worker shut down".into()))?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let (tx, rx) = oneshot::channel();
        {
            let mut pending = lock(&self.pending);
            for (old, waiter) in pending.drain() {
                debug!(id = old, by = id, "Request superseded");
                let _ = waiter.send(Err(EditorError::RequestSuperseded { id: old }));
            }
            pending.insert(id, tx);
        }
        {
            let now = Instant::now();
            let mut last = lock(&self.last_dispatch);
            // Keep any slot a throttled request has already reserved.
            *last = Some(last.map_or(now, |at| at.max(now)));
        }

        let msg = WorkerMsg::Render(WorkerRequest { id, raster, params });
        if requests.send(msg).is_err() {
            lock(&self.pending).remove(&id);
            return Err(EditorError::WorkerUnavailable("worker thread exited".into()));
        }
        trace!(id, "Render dispatched");

        Ok(PendingRender {
            id,
            rx,
            timeout: self.config.timeout(),
            pending: Arc::clone(&self.pending),
        })
    }

    /// Throttled dispatch-and-wait.
    ///
    /// Reserves the next dispatch slot, at least `throttle_ms` after the
    /// previous one, sleeps until it and then [`submit`](Self::submit)s and
    /// waits. Concurrent callers get consecutive slots in call order.
    pub async fn request(&self, raster: Raster, params: EffectParams) -> EditorResult<Raster> {
        let slot = self.reserve_slot();
        let now = Instant::now();
        if slot > now {
            trace!(delay = ?(slot - now), "Throttling dispatch");
            tokio::time::sleep_until(tokio::time::Instant::from_std(slot)).await;
        }
        self.submit(raster, params)?.wait().await
    }

    fn reserve_slot(&self) -> Instant {
        let now = Instant::now();
        let mut last = lock(&self.last_dispatch);
        let slot = match *last {
            Some(at) => now.max(at + self.config.throttle()),
            None => now,
        };
        *last = Some(slot);
        slot
    }

    /// Time left before the next dispatch is allowed.
    pub fn throttle_delay(&self) -> Duration {
        match *lock(&self.last_dispatch) {
            Some(at) => (at + self.config.throttle()).saturating_duration_since(Instant::now()),
            None => Duration::ZERO,
        }
    }

    /// Number of requests awaiting a response.
    pub fn pending_count(&self) -> usize {
        lock(&self.pending).len()
    }

    /// Returns `true` until [`Self::shutdown`] is called.
    pub fn is_running(&self) -> bool {
        self.requests.is_some()
    }

    /// Stops the worker and waits for both threads to exit. Later submits
    /// fail with [`EditorError::WorkerUnavailable`].
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.requests.take() {
            let _ = tx.send(WorkerMsg::Shutdown);
        }
        if let Some(h) = self.worker.take() {
            let _ = h.join();
        }
        if let Some(h) = self.router.take() {
            let _ = h.join();
        }
    }
}

/// Dropping asks the worker to stop but does not join it, so a drop inside
/// an async task never blocks on a render in progress. Both threads exit
/// once the current render finishes. Call [`PipelineWorkerClient::shutdown`]
/// to wait for them.
impl Drop for PipelineWorkerClient {
    fn drop(&mut self) {
        if let Some(tx) = self.requests.take() {
            let _ = tx.send(WorkerMsg::Shutdown);
        }
    }
}

impl std::fmt::Debug for PipelineWorkerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineWorkerClient")
            .field("thread", &self.config.thread_name)
            .field("running", &self.is_running())
            .field("pending", &self.pending_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("bad kernel");
        assert_eq!(panic_message(&*payload), "bad kernel");
        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(&*payload), "owned");
        let payload: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(&*payload), "pipeline panicked");
    }

    #[test]
    fn test_throttle_delay_starts_at_zero() {
        let client = PipelineWorkerClient::spawn(WorkerConfig::default()).unwrap();
        assert_eq!(client.throttle_delay(), Duration::ZERO);
        assert_eq!(client.pending_count(), 0);
        assert!(client.is_running());
    }

    #[test]
    fn test_submit_after_shutdown() {
        let mut client = PipelineWorkerClient::spawn(WorkerConfig::default()).unwrap();
        client.shutdown();
        let err = client
            .submit(Raster::new(1, 1), EffectParams::default())
            .unwrap_err();
        assert!(matches!(err, EditorError::WorkerUnavailable(_)));
    }
}
