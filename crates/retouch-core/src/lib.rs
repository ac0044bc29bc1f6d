//! # retouch-core
//!
//! Core types for the retouch non-destructive adjustment pipeline.
//!
//! This crate provides the foundational types used by every other retouch crate:
//!
//! - [`Raster`] - Owned 8-bit RGBA buffer with explicit width and height
//! - [`color`] - RGB <-> HSL conversion and luma helpers
//! - [`Error`] / [`Result`] - Buffer-level failures (bad dimensions, mismatches)
//!
//! ## Crate Structure
//!
//! `retouch-core` has no internal dependencies. The rest of the workspace
//! builds on top of it:
//!
//! ```text
//! retouch-core (this crate)
//!    ^
//!    |
//!    +-- retouch-ops (pipeline stages, PixelPipeline)
//!    |      ^
//!    |      +-- retouch-editor (orchestrator, worker client)
//!    |             ^
//!    +-------------+-- retouch-cli (headless front end)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use retouch_core::{Raster, color};
//!
//! let mut raster = Raster::filled(4, 4, [200, 40, 40, 255]);
//! let [r, g, b, _] = raster.pixel(0, 0);
//! let (h, s, l) = color::rgb_to_hsl(r, g, b);
//! assert!(h < 0.05 && s > 0.5 && l > 0.3);
//!
//! raster.set_pixel(1, 1, [0, 0, 0, 0]);
//! assert_eq!(raster.pixel(1, 1)[3], 0);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod color;
pub mod error;
pub mod raster;

pub use error::{Error, Result};
pub use raster::{Raster, CHANNELS};

/// Prelude module for convenient imports.
///
/// ```
/// use retouch_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::color::{hsl_to_rgb, luma, rgb_to_hsl};
    pub use crate::error::{Error, Result};
    pub use crate::raster::{Raster, CHANNELS};
}
