//! # retouch-editor
//!
//! Editor-side orchestration for the retouch pipeline: everything between a
//! slider moving and a new raster being shown.
//!
//! # Modules
//!
//! - [`orchestrator`] - [`EffectsOrchestrator`]: pristine source, diffing,
//!   checkpoints, histogram
//! - [`worker`] - [`PipelineWorkerClient`]: worker thread, request ids,
//!   supersession, timeouts, throttling
//! - [`messages`] - Worker protocol types
//! - [`history`] - Undo/redo checkpoints
//! - [`config`] - [`EditorConfig`]
//!
//! # Example
//!
//! ```rust,no_run
//! use retouch_core::Raster;
//! use retouch_editor::{EditorConfig, EffectsOrchestrator};
//! use retouch_ops::EffectParams;
//!
//! # async fn demo() -> retouch_editor::EditorResult<()> {
//! let editor = EffectsOrchestrator::new(EditorConfig::default())?;
//! editor.load_image(Raster::filled(256, 256, [120, 100, 80, 255]));
//!
//! let mut params = EffectParams::default();
//! params.tone.vibrance = 0.4;
//! editor.apply(params).await?;
//!
//! let preview = editor.result();
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
pub mod config;
pub mod history;
pub mod messages;
pub mod orchestrator;
pub mod worker;

pub use config::{EditorConfig, WorkerConfig};
pub use error::{EditorError, EditorResult};
pub use history::{Checkpoint, History};
pub use messages::{RequestId, WorkerRequest, WorkerResponse};
pub use orchestrator::{ApplyOutcome, EffectsOrchestrator};
pub use worker::{PendingRender, PipelineWorkerClient};
