//! Glue between editor state and the pipeline.
//!
//! [`EffectsOrchestrator`] owns everything the editor needs to turn a
//! parameter change into a displayed result:
//!
//! - the pristine source of the loaded image, shared read-only as
//!   `Arc<Raster>` and cloned per render
//! - the last committed [`EffectParams`], used to diff each new apply
//! - the checkpoint [`History`]
//! - the latest rendered raster and its [`Histogram`]
//!
//! Renders go through the [`PipelineWorkerClient`] when one is running and
//! run inline otherwise. Internal state sits behind a mutex that is never
//! held across an `.await`, so overlapping applies are safe; the older one
//! comes back as [`ApplyOutcome::Superseded`].

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use retouch_core::Raster;
use retouch_ops::{EffectParams, Histogram, PixelPipeline};
use tracing::{debug, info, trace, warn};

use crate::config::EditorConfig;
use crate::history::{Checkpoint, History};
use crate::worker::PipelineWorkerClient;
use crate::{EditorError, EditorResult};

/// What happened to an apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The render finished and its result is now current.
    Applied {
        /// `true` if the params differed from the last commit and a
        /// checkpoint was added.
        checkpoint_recorded: bool,
    },
    /// A newer apply (or a new image) replaced this one before it finished.
    Superseded,
}

impl ApplyOutcome {
    /// Returns `true` for [`ApplyOutcome::Applied`].
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

#[derive(Debug)]
struct State {
    pristine: Option<Arc<Raster>>,
    last_committed: EffectParams,
    history: History,
    result: Option<Raster>,
    histogram: Option<Histogram>,
    /// Bumped on every image load.
    image_generation: u64,
    /// Ticket of the newest render whose result was stored.
    committed_ticket: u64,
}

/// How a finished render updates history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Commit {
    /// Diff against the last commit and checkpoint on change.
    Record,
    /// Step history back once the render lands.
    Undo,
    /// Step history forward once the render lands.
    Redo,
}

impl Commit {
    /// Params a history step would land on.
    fn target(self, history: &History) -> Option<EffectParams> {
        match self {
            Self::Record => None,
            Self::Undo => history.peek_undo(),
            Self::Redo => history.peek_redo(),
        }
    }
}

/// Editor-side owner of pipeline state.
#[derive(Debug)]
pub struct EffectsOrchestrator {
    config: EditorConfig,
    worker: Option<PipelineWorkerClient>,
    worker_down: AtomicBool,
    next_ticket: AtomicU64,
    state: Mutex<State>,
}

impl EffectsOrchestrator {
    /// Creates an orchestrator, starting a worker if the config asks for one.
    ///
    /// A worker that fails to start is logged and replaced by inline
    /// rendering.
    pub fn new(config: EditorConfig) -> EditorResult<Self> {
        config.validate()?;
        let worker = if config.use_worker {
            match PipelineWorkerClient::spawn(config.worker.clone()) {
                Ok(client) => Some(client),
                Err(e) => {
                    warn!(error = %e, "Falling back to inline rendering");
                    None
                }
            }
        } else {
            None
        };
        Ok(Self::assemble(config, worker))
    }

    /// Creates an orchestrator around an existing worker client.
    pub fn with_worker(config: EditorConfig, worker: PipelineWorkerClient) -> EditorResult<Self> {
        config.validate()?;
        Ok(Self::assemble(config, Some(worker)))
    }

    /// Creates an orchestrator that always renders inline.
    pub fn inline(config: EditorConfig) -> EditorResult<Self> {
        config.validate()?;
        Ok(Self::assemble(config, None))
    }

    fn assemble(config: EditorConfig, worker: Option<PipelineWorkerClient>) -> Self {
        let history = History::new(config.history_limit);
        Self {
            config,
            worker,
            worker_down: AtomicBool::new(false),
            next_ticket: AtomicU64::new(0),
            state: Mutex::new(State {
                pristine: None,
                last_committed: EffectParams::default(),
                history,
                result: None,
                histogram: None,
                image_generation: 0,
                committed_ticket: 0,
            }),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Active configuration.
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Returns `true` if renders currently go through the worker thread.
    pub fn uses_worker(&self) -> bool {
        self.worker.is_some() && !self.worker_down.load(Ordering::Relaxed)
    }

    /// Installs a new pristine source.
    ///
    /// Resets the committed params and history. Renders still in flight for
    /// the previous image are discarded when they finish.
    pub fn load_image(&self, raster: Raster) {
        let mut state = self.lock_state();
        info!(width = raster.width(), height = raster.height(), "Image loaded");
        state.histogram = Some(Histogram::from_raster(&raster));
        state.result = Some(raster.clone());
        state.pristine = Some(Arc::new(raster));
        state.last_committed = EffectParams::default();
        state.history.clear();
        state.image_generation += 1;
    }

    /// Renders `params` against the pristine source and commits the result.
    ///
    /// Records one checkpoint when `params` differ from the last commit.
    ///
    /// # Errors
    ///
    /// [`EditorError::NoImageLoaded`] without a source; worker failures
    /// other than supersession and unavailability are passed through.
    pub async fn apply(&self, params: EffectParams) -> EditorResult<ApplyOutcome> {
        self.render_and_commit(params, Commit::Record).await
    }

    /// Reverts to the previous checkpoint. `Ok(None)` if there is none.
    ///
    /// History only moves once the re-render is committed; a failed render
    /// leaves history, params and result as they were.
    pub async fn undo(&self) -> EditorResult<Option<ApplyOutcome>> {
        self.step(Commit::Undo).await
    }

    /// Re-applies the last undone checkpoint. `Ok(None)` if there is none.
    pub async fn redo(&self) -> EditorResult<Option<ApplyOutcome>> {
        self.step(Commit::Redo).await
    }

    async fn step(&self, commit: Commit) -> EditorResult<Option<ApplyOutcome>> {
        let target = {
            let state = self.lock_state();
            if state.pristine.is_none() {
                return Err(EditorError::NoImageLoaded);
            }
            commit.target(&state.history)
        };
        let Some(target) = target else {
            return Ok(None);
        };
        debug!(?commit, "History step");
        self.render_and_commit(target, commit).await.map(Some)
    }

    async fn render_and_commit(
        &self,
        params: EffectParams,
        commit: Commit,
    ) -> EditorResult<ApplyOutcome> {
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed) + 1;
        let (source, generation) = {
            let state = self.lock_state();
            let source = state.pristine.clone().ok_or(EditorError::NoImageLoaded)?;
            (source, state.image_generation)
        };

        let rendered = match self.render(&source, &params).await {
            Ok(r) => r,
            Err(e) if e.is_benign() => {
                debug!(ticket, error = %e, "Apply superseded");
                return Ok(ApplyOutcome::Superseded);
            }
            Err(e) => return Err(e),
        };

        let mut state = self.lock_state();
        if state.image_generation != generation || state.committed_ticket > ticket {
            debug!(ticket, "Discarding stale render");
            return Ok(ApplyOutcome::Superseded);
        }

        let mut recorded = false;
        match commit {
            Commit::Record => {
                let changes = state.last_committed.diff(&params);
                if !changes.is_empty() {
                    let checkpoint = Checkpoint::new(params.clone(), changes);
                    debug!(label = %checkpoint.label, "Checkpoint");
                    state.history.push(checkpoint);
                    state.last_committed = params;
                    recorded = true;
                }
            }
            Commit::Undo | Commit::Redo => {
                // History moved under us while rendering.
                if commit.target(&state.history).as_ref() != Some(&params) {
                    debug!(ticket, "Discarding stale history step");
                    return Ok(ApplyOutcome::Superseded);
                }
                if commit == Commit::Undo {
                    state.history.undo();
                } else {
                    state.history.redo();
                }
                state.last_committed = params;
            }
        }

        state.committed_ticket = ticket;
        state.histogram = Some(Histogram::from_raster(&rendered));
        state.result = Some(rendered);
        Ok(ApplyOutcome::Applied {
            checkpoint_recorded: recorded,
        })
    }

    async fn render(&self, source: &Arc<Raster>, params: &EffectParams) -> EditorResult<Raster> {
        if let Some(worker) = self.worker.as_ref().filter(|_| self.uses_worker()) {
            match worker.request(Raster::clone(source), params.clone()).await {
                Err(EditorError::WorkerUnavailable(reason)) => {
                    warn!(%reason, "Pipeline worker unavailable, rendering inline");
                    self.worker_down.store(true, Ordering::Relaxed);
                }
                other => return other,
            }
        }
        trace!("Inline render");
        Ok(PixelPipeline::run(source, params))
    }

    /// Returns `true` once an image is loaded.
    pub fn has_image(&self) -> bool {
        self.lock_state().pristine.is_some()
    }

    /// The unmodified source of the loaded image.
    pub fn pristine(&self) -> Option<Arc<Raster>> {
        self.lock_state().pristine.clone()
    }

    /// Latest rendered raster (the source itself right after a load).
    pub fn result(&self) -> Option<Raster> {
        self.lock_state().result.clone()
    }

    /// Histogram of [`Self::result`].
    pub fn histogram(&self) -> Option<Histogram> {
        self.lock_state().histogram.clone()
    }

    /// Params of the last recorded or restored checkpoint.
    pub fn last_committed(&self) -> EffectParams {
        self.lock_state().last_committed.clone()
    }

    /// Snapshot of retained checkpoints, oldest first.
    pub fn checkpoints(&self) -> Vec<Checkpoint> {
        self.lock_state().history.checkpoints().cloned().collect()
    }

    /// Returns `true` if [`Self::undo`] would do something.
    pub fn can_undo(&self) -> bool {
        self.lock_state().history.can_undo()
    }

    /// Returns `true` if [`Self::redo`] would do something.
    pub fn can_redo(&self) -> bool {
        self.lock_state().history.can_redo()
    }
}
