//! Error types for retouch-core buffer operations.
//!
//! The [`Error`] enum covers the failure modes of raster construction and
//! raster-to-raster operations:
//! - Constructing a [`crate::Raster`] from a byte buffer of the wrong length
//! - Pairing two buffers (raster/raster or raster/mask) of different sizes
//! - Addressing a pixel outside the raster
//!
//! Stage-level numeric problems (division by zero, degenerate kernels) are
//! never reported through this type; stages guard them locally.
//!
//! # Usage
//!
//! ```rust
//! use retouch_core::{Error, Result};
//!
//! fn same_size(a: (u32, u32), b: (u32, u32)) -> Result<()> {
//!     if a != b {
//!         return Err(Error::dimension_mismatch(a, b));
//!     }
//!     Ok(())
//! }
//!
//! assert!(same_size((4, 4), (4, 4)).is_ok());
//! assert!(same_size((4, 4), (8, 4)).is_err());
//! ```

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or pairing rasters.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Pixel coordinates are outside raster bounds.
    #[error("pixel ({x}, {y}) out of bounds for raster {width}x{height}")]
    OutOfBounds {
        /// X coordinate that was out of bounds
        x: u32,
        /// Y coordinate that was out of bounds
        y: u32,
        /// Raster width
        width: u32,
        /// Raster height
        height: u32,
    },

    /// Two buffers that must share dimensions do not.
    ///
    /// This is a call-site programming error. Operations fail fast instead
    /// of resampling one side to fit.
    #[error("dimension mismatch: {a_width}x{a_height} vs {b_width}x{b_height}")]
    DimensionMismatch {
        /// First buffer width
        a_width: u32,
        /// First buffer height
        a_height: u32,
        /// Second buffer width
        b_width: u32,
        /// Second buffer height
        b_height: u32,
    },

    /// Buffer length does not match the declared dimensions, or the
    /// dimensions overflow.
    #[error("invalid dimensions: {width}x{height} ({reason})")]
    InvalidDimensions {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
        /// Reason why dimensions are invalid
        reason: String,
    },
}

impl Error {
    /// Creates an [`Error::OutOfBounds`] error.
    #[inline]
    pub fn out_of_bounds(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self::OutOfBounds {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates an [`Error::DimensionMismatch`] error.
    #[inline]
    pub fn dimension_mismatch(a: (u32, u32), b: (u32, u32)) -> Self {
        Self::DimensionMismatch {
            a_width: a.0,
            a_height: a.1,
            b_width: b.0,
            b_height: b.1,
        }
    }

    /// Creates an [`Error::InvalidDimensions`] error.
    #[inline]
    pub fn invalid_dimensions(width: u32, height: u32, reason: impl Into<String>) -> Self {
        Self::InvalidDimensions {
            width,
            height,
            reason: reason.into(),
        }
    }

    /// Returns `true` if two buffers disagreed on size.
    #[inline]
    pub fn is_dimension_mismatch(&self) -> bool {
        matches!(self, Self::DimensionMismatch { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_bounds() {
        let err = Error::out_of_bounds(100, 50, 80, 60);
        let msg = err.to_string();
        assert!(msg.contains("100"));
        assert!(msg.contains("80x60"));
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = Error::dimension_mismatch((100, 100), (200, 200));
        let msg = err.to_string();
        assert!(msg.contains("100x100"));
        assert!(msg.contains("200x200"));
        assert!(err.is_dimension_mismatch());
    }

    #[test]
    fn test_invalid_dimensions() {
        let err = Error::invalid_dimensions(3, 3, "expected 36 bytes, got 12");
        assert!(err.to_string().contains("expected 36 bytes"));
        assert!(!err.is_dimension_mismatch());
    }
}
