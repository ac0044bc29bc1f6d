//! # retouch-ops
//!
//! Pixel adjustment stages and the fixed-order [`PixelPipeline`].
//!
//! Every stage works on an owned 8-bit RGBA [`retouch_core::Raster`] and is
//! deterministic: equal inputs give identical bytes.
//!
//! # Modules
//!
//! - [`convolve`] - Box blur, Gaussian blur, sharpen, texture, clarity
//! - [`threshold`] - Alpha knock-out of near-white / near-black pixels
//! - [`levels`] - Brightness and contrast
//! - [`curves`] - Monotone tone curves baked to LUTs
//! - [`tone`] - Highlights, shadows, whites, blacks, vibrance, dehaze
//! - [`selective`] - Per-hue-band HSL offsets
//! - [`grading`] - Shadow/midtone/highlight tints, temperature, tint
//! - [`params`] - [`EffectParams`] and field diffing
//! - [`mask`] - Coverage masks for local adjustments
//! - [`histogram`] - Channel and luma histograms
//! - [`pipeline`] - Stage ordering and execution
//!
//! # Example
//!
//! ```rust
//! use retouch_core::Raster;
//! use retouch_ops::{EffectParams, PixelPipeline};
//!
//! let src = Raster::filled(64, 64, [180, 90, 60, 255]);
//! let mut params = EffectParams::default();
//! params.gaussian = 2;
//! params.tone.vibrance = 0.3;
//!
//! let out = PixelPipeline::run(&src, &params);
//! assert_eq!(out.dimensions(), src.dimensions());
//! ```
//!
//! # Features
//!
//! - `parallel` (default) - process rows on the rayon thread pool

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
pub mod convolve;
pub mod curves;
pub mod grading;
pub mod histogram;
pub mod levels;
pub mod mask;
pub mod parallel;
pub mod params;
pub mod pipeline;
pub mod selective;
pub mod threshold;
pub mod tone;

pub use error::{OpsError, OpsResult};
pub use histogram::Histogram;
pub use mask::Mask;
pub use params::{EffectParams, ParamChange};
pub use pipeline::{PipelineReport, PixelPipeline, Stage};
