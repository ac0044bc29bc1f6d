//! Error types for pipeline stages.

use thiserror::Error;

/// Error type for pipeline operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OpsError {
    /// Curve control points cannot form a curve: fewer than two points or
    /// a non-finite coordinate. Stages recover by using the identity curve.
    #[error("invalid curve spec: {0}")]
    InvalidCurveSpec(String),

    /// Kernel data does not describe an odd, square kernel.
    #[error("invalid kernel: {0}")]
    InvalidKernel(String),

    /// Buffer-level failure, including mask/raster dimension mismatches.
    #[error(transparent)]
    Core(#[from] retouch_core::Error),
}

impl OpsError {
    /// Returns `true` if two buffers disagreed on size.
    pub fn is_dimension_mismatch(&self) -> bool {
        matches!(self, Self::Core(e) if e.is_dimension_mismatch())
    }
}

/// Result type for pipeline operations.
pub type OpsResult<T> = Result<T, OpsError>;
