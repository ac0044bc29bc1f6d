//! Three-way color grading with luma-zone weighting plus global white
//! balance.
//!
//! Each pixel's luma selects a blend of shadow, midtone and highlight tints:
//!
//! ```text
//! weight
//!   1 |\        /\        /|
//!     | \      /  \      / |
//!     |  \    /    \    /  |
//!     |   \  /      \  /   |
//!   0 +----\/--------\/----+ luma
//!     0   shadow  mid  highlight  1
//! ```
//!
//! Shadow and highlight weights are disjoint ramps, midtone is a tent
//! peaking at 0.5. All three scale with `blending`.

use crate::parallel::map_pixels;
use retouch_core::color::{hsl_to_rgb, luma, to_byte};
use retouch_core::Raster;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;

/// Scale applied to zone tints before adding them.
pub const ZONE_INTENSITY: f64 = 0.5;

/// Level shift per unit of temperature (red up, blue down).
pub const TEMPERATURE_SCALE: f64 = 30.0;

/// Level shift per unit of tint (green).
pub const TINT_SCALE: f64 = 20.0;

/// Tint for one luma zone.
///
/// `h` is in degrees, `s` in `[0, 1]`. `l` is carried for round-tripping
/// editor state but does not influence the tint, which is always derived at
/// lightness 0.5.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GradingZone {
    /// Hue in degrees.
    pub h: f64,
    /// Tint strength.
    pub s: f64,
    /// Lightness (unused by the tint).
    pub l: f64,
}

impl GradingZone {
    /// Creates a zone.
    pub const fn new(h: f64, s: f64, l: f64) -> Self {
        Self { h, s, l }
    }

    /// A zone only tints when its saturation is positive.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.s > 0.0
    }

    /// Signed per-channel tint: `hsl_to_rgb(h, s, 0.5) - 128`.
    pub fn tint(&self) -> [f64; 3] {
        let (r, g, b) = hsl_to_rgb(self.h / 360.0, self.s, 0.5);
        [r as f64 - 128.0, g as f64 - 128.0, b as f64 - 128.0]
    }
}

impl fmt::Display for GradingZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "h{}/s{}/l{}", self.h, self.s, self.l)
    }
}

/// Grading parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradingSpec {
    /// Dark-zone tint.
    pub shadows: GradingZone,
    /// Mid-zone tint.
    pub midtones: GradingZone,
    /// Bright-zone tint.
    pub highlights: GradingZone,
    /// Overall zone weight, `0..=1`.
    pub blending: f64,
    /// Pivot shift, `-1..=1`. Positive values push pixels toward the
    /// highlight zone.
    pub balance: f64,
    /// Warm (+) / cool (-) shift.
    pub temperature: f64,
    /// Green (+) / magenta (-) shift.
    pub tint: f64,
}

impl Default for GradingSpec {
    fn default() -> Self {
        Self {
            shadows: GradingZone::default(),
            midtones: GradingZone::default(),
            highlights: GradingZone::default(),
            blending: 1.0,
            balance: 0.0,
            temperature: 0.0,
            tint: 0.0,
        }
    }
}

impl GradingSpec {
    /// Returns `true` if no zone is active and there is no global shift.
    pub fn is_identity(&self) -> bool {
        !self.shadows.is_active()
            && !self.midtones.is_active()
            && !self.highlights.is_active()
            && self.temperature == 0.0
            && self.tint == 0.0
    }
}

/// Per-zone blend weights for one luma value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneWeights {
    /// Shadow weight.
    pub shadow: f64,
    /// Midtone weight.
    pub midtone: f64,
    /// Highlight weight.
    pub highlight: f64,
}

/// Computes zone weights for `luma` in `[0, 1]`.
///
/// ```rust
/// use retouch_ops::grading::zone_weights;
///
/// let w = zone_weights(0.5, 1.0, 0.0);
/// assert_eq!((w.shadow, w.midtone, w.highlight), (0.0, 1.0, 0.0));
/// ```
pub fn zone_weights(luma: f64, blending: f64, balance: f64) -> ZoneWeights {
    let l = (luma + 0.5 * balance).clamp(0.0, 1.0);
    ZoneWeights {
        shadow: (1.0 - 2.0 * l).max(0.0) * blending,
        midtone: (1.0 - 2.0 * (l - 0.5).abs()) * blending,
        highlight: (2.0 * (l - 0.5)).max(0.0) * blending,
    }
}

struct ActiveTints {
    shadows: Option<[f64; 3]>,
    midtones: Option<[f64; 3]>,
    highlights: Option<[f64; 3]>,
}

impl ActiveTints {
    fn new(spec: &GradingSpec) -> Self {
        let pick = |z: &GradingZone| z.is_active().then(|| z.tint());
        Self {
            shadows: pick(&spec.shadows),
            midtones: pick(&spec.midtones),
            highlights: pick(&spec.highlights),
        }
    }
}

fn grade_with(px: [u8; 4], spec: &GradingSpec, tints: &ActiveTints) -> [u8; 4] {
    let mut c = [px[0] as f64, px[1] as f64, px[2] as f64];

    let y = luma(c[0], c[1], c[2]) / 255.0;
    let w = zone_weights(y, spec.blending, spec.balance);
    for (tint, weight) in [
        (tints.shadows, w.shadow),
        (tints.midtones, w.midtone),
        (tints.highlights, w.highlight),
    ] {
        if let Some(t) = tint {
            for (v, d) in c.iter_mut().zip(t) {
                *v += d * weight * ZONE_INTENSITY;
            }
        }
    }

    c[0] += spec.temperature * TEMPERATURE_SCALE;
    c[2] -= spec.temperature * TEMPERATURE_SCALE;
    c[1] += spec.tint * TINT_SCALE;

    [to_byte(c[0]), to_byte(c[1]), to_byte(c[2]), px[3]]
}

/// Grades one pixel.
pub fn grade_pixel(px: [u8; 4], spec: &GradingSpec) -> [u8; 4] {
    grade_with(px, spec, &ActiveTints::new(spec))
}

/// Applies grading in place.
pub fn apply_grading(raster: &mut Raster, spec: &GradingSpec) {
    trace!(width = raster.width(), height = raster.height(), "grading");
    if spec.is_identity() {
        return;
    }
    let tints = ActiveTints::new(spec);
    map_pixels(raster, |px| grade_with(px, spec, &tints));
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_weight_partition() {
        for blending in [0.0, 0.4, 1.0] {
            for i in 0..=100 {
                let l = i as f64 / 100.0;
                let w = zone_weights(l, blending, 0.0);
                assert!(w.shadow + w.highlight <= 2.0 * blending + 1e-12);
                assert!((0.0..=1.0).contains(&w.midtone));
                assert!(w.shadow == 0.0 || w.highlight == 0.0);
            }
        }
        assert_abs_diff_eq!(zone_weights(0.0, 1.0, 0.0).shadow, 1.0);
        assert_abs_diff_eq!(zone_weights(1.0, 1.0, 0.0).highlight, 1.0);
    }

    #[test]
    fn test_balance_shifts_pivot() {
        let w = zone_weights(0.5, 1.0, 0.5);
        assert_abs_diff_eq!(w.highlight, 0.5);
        assert_eq!(w.shadow, 0.0);
        let w = zone_weights(0.5, 1.0, -1.0);
        assert_abs_diff_eq!(w.shadow, 1.0);
    }

    #[test]
    fn test_zone_tint() {
        assert_eq!(GradingZone::new(0.0, 1.0, 0.5).tint(), [127.0, -128.0, -128.0]);
        assert_eq!(GradingZone::new(200.0, 0.0, 0.9).tint(), [0.0, 0.0, 0.0]);
        assert!(!GradingZone::new(200.0, 0.0, 0.9).is_active());
    }

    #[test]
    fn test_identity() {
        let spec = GradingSpec::default();
        assert!(spec.is_identity());
        assert_eq!(grade_pixel([12, 34, 56, 78], &spec), [12, 34, 56, 78]);
    }

    #[test]
    fn test_temperature_and_tint() {
        let spec = GradingSpec {
            temperature: 1.0,
            tint: -0.5,
            ..Default::default()
        };
        assert_eq!(grade_pixel([100, 100, 100, 255], &spec), [130, 90, 70, 255]);
    }

    #[test]
    fn test_shadow_tint_only_in_shadows() {
        let spec = GradingSpec {
            shadows: GradingZone::new(240.0, 1.0, 0.5),
            ..Default::default()
        };
        // Black has full shadow weight: blue +127 * 0.5.
        assert_eq!(grade_pixel([0, 0, 0, 255], &spec), [0, 0, 64, 255]);
        // White has none.
        assert_eq!(grade_pixel([255, 255, 255, 255], &spec), [255, 255, 255, 255]);
    }
}
