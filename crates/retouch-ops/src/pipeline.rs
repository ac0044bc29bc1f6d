//! Fixed-order composition of every adjustment stage.
//!
//! # Stage order
//!
//! ```text
//! box blur -> gaussian -> sharpen -> texture -> clarity
//!   -> threshold white -> threshold black
//!   -> brightness/contrast -> curves -> tone -> selective color -> grading
//! ```
//!
//! Spatial filters run first so tonal stages see the final structure.
//! Thresholds come before tonal remaps so they key on source brightness.
//!
//! The order is part of the output contract: two runs with equal inputs
//! produce identical bytes, and a stage whose parameters are neutral is
//! skipped entirely.
//!
//! # Example
//!
//! ```rust
//! use retouch_core::Raster;
//! use retouch_ops::{EffectParams, PixelPipeline};
//!
//! let src = Raster::filled(32, 32, [120, 80, 40, 255]);
//! let mut params = EffectParams::default();
//! params.brightness = 10.0;
//! let (out, report) = PixelPipeline::run_with_report(&src, &params);
//! assert_eq!(report.stages.len(), 1);
//! assert_eq!(out.pixel(0, 0), [130, 90, 50, 255]);
//! ```

use crate::convolve::{apply_convolution, apply_sharpen, Kernel};
use crate::curves::CurveLuts;
use crate::grading::apply_grading;
use crate::levels::apply_brightness_contrast;
use crate::mask::{blend, Mask};
use crate::params::EffectParams;
use crate::selective::apply_selective_color;
use crate::threshold::{threshold_black, threshold_white, BLACK_OFF, WHITE_OFF};
use crate::tone::apply_tone;
use crate::OpsResult;
use retouch_core::Raster;
use std::fmt;
use tracing::{debug, trace};

/// A pipeline stage, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    /// Uniform box blur.
    BoxBlur,
    /// Gaussian blur.
    GaussianBlur,
    /// Laplacian sharpen.
    Sharpen,
    /// Fine local contrast.
    Texture,
    /// Mid-frequency local contrast.
    Clarity,
    /// Bright-pixel alpha knock-out.
    ThresholdWhite,
    /// Dark-pixel alpha knock-out.
    ThresholdBlack,
    /// Brightness and contrast.
    BrightnessContrast,
    /// Tone curves.
    Curves,
    /// Luma-zone tone controls.
    Tone,
    /// Per-hue-band HSL offsets.
    SelectiveColor,
    /// Three-way grading and white balance.
    Grading,
}

impl Stage {
    /// Every stage in execution order.
    pub const ORDER: [Stage; 12] = [
        Stage::BoxBlur,
        Stage::GaussianBlur,
        Stage::Sharpen,
        Stage::Texture,
        Stage::Clarity,
        Stage::ThresholdWhite,
        Stage::ThresholdBlack,
        Stage::BrightnessContrast,
        Stage::Curves,
        Stage::Tone,
        Stage::SelectiveColor,
        Stage::Grading,
    ];

    /// Short kebab-case name.
    pub fn name(self) -> &'static str {
        match self {
            Stage::BoxBlur => "box-blur",
            Stage::GaussianBlur => "gaussian-blur",
            Stage::Sharpen => "sharpen",
            Stage::Texture => "texture",
            Stage::Clarity => "clarity",
            Stage::ThresholdWhite => "threshold-white",
            Stage::ThresholdBlack => "threshold-black",
            Stage::BrightnessContrast => "brightness-contrast",
            Stage::Curves => "curves",
            Stage::Tone => "tone",
            Stage::SelectiveColor => "selective-color",
            Stage::Grading => "grading",
        }
    }

    /// Returns `true` if this stage would change some pixel for `params`.
    pub fn is_active(self, params: &EffectParams) -> bool {
        let nonzero = |v: f64| v != 0.0 && v.is_finite();
        match self {
            Stage::BoxBlur => params.blur > 0,
            Stage::GaussianBlur => params.gaussian > 0,
            Stage::Sharpen => nonzero(params.sharpen),
            Stage::Texture => nonzero(params.texture),
            Stage::Clarity => nonzero(params.clarity),
            Stage::ThresholdWhite => params.threshold_white != WHITE_OFF,
            Stage::ThresholdBlack => params.threshold_black != BLACK_OFF,
            Stage::BrightnessContrast => params.brightness != 0.0 || params.contrast != 0.0,
            Stage::Curves => !params.curves.is_identity(),
            Stage::Tone => !params.tone.is_identity(),
            Stage::SelectiveColor => !params.selective.is_identity(),
            Stage::Grading => !params.grading.is_identity(),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which stages a run executed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    /// Stages that ran, in order.
    pub stages: Vec<Stage>,
}

impl PipelineReport {
    /// Returns `true` if no stage ran and the output is a plain copy.
    pub fn is_passthrough(&self) -> bool {
        self.stages.is_empty()
    }
}

/// Stateless runner for the full stage chain.
#[derive(Debug, Clone, Copy, Default)]
pub struct PixelPipeline;

impl PixelPipeline {
    /// Stages that `params` would run, in order.
    pub fn active_stages(params: &EffectParams) -> Vec<Stage> {
        Stage::ORDER
            .into_iter()
            .filter(|s| s.is_active(params))
            .collect()
    }

    /// Runs all active stages on a copy of `source`.
    pub fn run(source: &Raster, params: &EffectParams) -> Raster {
        Self::run_with_report(source, params).0
    }

    /// Like [`Self::run`], also reporting which stages executed.
    pub fn run_with_report(source: &Raster, params: &EffectParams) -> (Raster, PipelineReport) {
        let mut out = source.clone();
        let report = Self::apply_in_place(&mut out, params);
        (out, report)
    }

    /// Runs active stages directly on `raster`.
    pub fn apply_in_place(raster: &mut Raster, params: &EffectParams) -> PipelineReport {
        let stages = Self::active_stages(params);
        trace!(
            width = raster.width(),
            height = raster.height(),
            stages = stages.len(),
            "pipeline"
        );
        if stages.is_empty() {
            debug!("No active stages, passthrough");
            return PipelineReport::default();
        }

        for &stage in &stages {
            debug!(stage = stage.name(), "Running stage");
            Self::run_stage(stage, raster, params);
        }
        PipelineReport { stages }
    }

    /// Runs the pipeline and mixes the result over `source` by `mask`.
    ///
    /// # Errors
    ///
    /// `DimensionMismatch` if the mask size differs from the raster size.
    pub fn run_masked(source: &Raster, params: &EffectParams, mask: &Mask) -> OpsResult<Raster> {
        source.ensure_same_dimensions(mask.dimensions())?;
        if mask.is_empty() {
            debug!("Empty mask, passthrough");
            return Ok(source.clone());
        }
        let adjusted = Self::run(source, params);
        if mask.is_full() {
            return Ok(adjusted);
        }
        blend(source, &adjusted, mask)
    }

    fn run_stage(stage: Stage, raster: &mut Raster, params: &EffectParams) {
        match stage {
            Stage::BoxBlur => apply_convolution(raster, &Kernel::box_blur_radius(params.blur)),
            Stage::GaussianBlur => apply_convolution(raster, &Kernel::gaussian(params.gaussian)),
            Stage::Sharpen => apply_sharpen(raster, params.sharpen),
            Stage::Texture => apply_convolution(raster, &Kernel::texture(params.texture)),
            Stage::Clarity => apply_convolution(raster, &Kernel::clarity(params.clarity)),
            Stage::ThresholdWhite => threshold_white(raster, params.threshold_white),
            Stage::ThresholdBlack => threshold_black(raster, params.threshold_black),
            Stage::BrightnessContrast => {
                apply_brightness_contrast(raster, params.brightness, params.contrast)
            }
            Stage::Curves => CurveLuts::from_spec(&params.curves).apply(raster),
            Stage::Tone => apply_tone(raster, &params.tone),
            Stage::SelectiveColor => apply_selective_color(raster, &params.selective),
            Stage::Grading => apply_grading(raster, &params.grading),
        }
    }
}
