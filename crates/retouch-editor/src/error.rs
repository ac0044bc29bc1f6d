//! Error types for editor-side orchestration.
//!
//! Failures split three ways:
//! - **Benign**: a newer request replaced this one. Callers drop it silently.
//! - **Retryable**: the worker did not answer in time.
//! - **Hard**: no image, bad config, pipeline panic.

use std::time::Duration;

use retouch_ops::OpsError;
use thiserror::Error;

use crate::messages::RequestId;

/// Result type for editor operations.
pub type EditorResult<T> = Result<T, EditorError>;

/// Errors surfaced by the worker client and the orchestrator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditorError {
    /// The worker thread could not be started or has exited.
    #[error("pipeline worker unavailable: {0}")]
    WorkerUnavailable(String),

    /// A newer request was dispatched before this one completed.
    #[error("request {id} superseded by a newer request")]
    RequestSuperseded {
        /// Id of the dropped request.
        id: RequestId,
    },

    /// No response arrived within the configured timeout.
    #[error("request {id} timed out after {timeout:?}")]
    RequestTimeout {
        /// Id of the abandoned request.
        id: RequestId,
        /// Timeout that elapsed.
        timeout: Duration,
    },

    /// The worker reported a failed render.
    #[error("render {id} failed: {reason}")]
    PipelineFailed {
        /// Id of the failed request.
        id: RequestId,
        /// Worker-side description.
        reason: String,
    },

    /// An operation needs a source image and none is loaded.
    #[error("no image loaded")]
    NoImageLoaded,

    /// Pipeline stage error.
    #[error(transparent)]
    Ops(#[from] OpsError),

    /// Invalid editor configuration.
    #[error("invalid config: {0}")]
    Config(String),
}

impl EditorError {
    /// Creates a [`EditorError::Config`] error.
    #[inline]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Returns `true` for outcomes that are expected during normal
    /// interaction and should not be reported.
    pub fn is_benign(&self) -> bool {
        matches!(self, Self::RequestSuperseded { .. })
    }

    /// Returns `true` if repeating the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RequestTimeout { .. } | Self::WorkerUnavailable(_))
    }

    /// Short message suitable for an end user.
    pub fn user_message(&self) -> String {
        match self {
            Self::RequestTimeout { .. } => {
                "Rendering took too long. The image may be too large or the effect combination too heavy.".into()
            }
            Self::WorkerUnavailable(_) => "Background rendering is unavailable; rendering inline.".into(),
            Self::NoImageLoaded => "Open an image first.".into(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(EditorError::RequestSuperseded { id: 1 }.is_benign());
        assert!(!EditorError::NoImageLoaded.is_benign());

        let timeout = EditorError::RequestTimeout {
            id: 2,
            timeout: Duration::from_millis(20),
        };
        assert!(timeout.is_retryable());
        assert!(timeout.user_message().contains("too heavy"));
        assert!(!EditorError::config("x").is_retryable());
    }

    #[test]
    fn test_display() {
        let err = EditorError::RequestSuperseded { id: 42 };
        assert!(err.to_string().contains("42"));
        let err: EditorError = OpsError::InvalidKernel("even".into()).into();
        assert!(err.to_string().contains("even"));
    }
}
