//! Message types for client <-> worker communication.
//!
//! Every render request carries an explicit [`RequestId`]; the worker answers
//! each request exactly once with a [`WorkerResponse`] echoing that id.

use retouch_core::Raster;
use retouch_ops::EffectParams;

use crate::{EditorError, EditorResult};

/// Monotonic id assigned by the client at dispatch time.
pub type RequestId = u64;

/// One render job.
#[derive(Debug, Clone)]
pub struct WorkerRequest {
    /// Id echoed back in the response.
    pub id: RequestId,
    /// Owned copy of the pristine source.
    pub raster: Raster,
    /// Parameters snapshot.
    pub params: EffectParams,
}

/// Result of one render job.
#[derive(Debug, Clone)]
pub struct WorkerResponse {
    /// Id of the request this answers.
    pub id: RequestId,
    /// `false` if the pipeline failed or the job was dropped.
    pub success: bool,
    /// Rendered raster, present iff `success`.
    pub raster: Option<Raster>,
    /// Failure description, present iff `!success`.
    pub error: Option<String>,
}

impl WorkerResponse {
    /// Successful response.
    pub fn ok(id: RequestId, raster: Raster) -> Self {
        Self {
            id,
            success: true,
            raster: Some(raster),
            error: None,
        }
    }

    /// Failed response.
    pub fn failed(id: RequestId, error: impl Into<String>) -> Self {
        Self {
            id,
            success: false,
            raster: None,
            error: Some(error.into()),
        }
    }

    /// Converts to the value handed to the waiting caller.
    pub fn into_result(self) -> EditorResult<Raster> {
        match (self.success, self.raster) {
            (true, Some(raster)) => Ok(raster),
            _ => Err(EditorError::PipelineFailed {
                id: self.id,
                reason: self.error.unwrap_or_else(|| "no raster returned".into()),
            }),
        }
    }
}

/// Messages from the client to the worker thread.
#[derive(Debug)]
pub enum WorkerMsg {
    /// Render a request.
    Render(WorkerRequest),
    /// Stop the worker loop.
    Shutdown,
}
