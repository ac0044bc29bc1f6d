//! Luma-zone tone adjustments: highlights, shadows, whites, blacks,
//! saturation, vibrance and dehaze.
//!
//! All steps run per pixel in `f64`, clamping to `[0, 255]` after each one
//! and rounding once at the end. Alpha is untouched.

use crate::parallel::map_pixels;
use retouch_core::color::{luma, to_byte};
use retouch_core::Raster;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Luma above which `highlights` applies.
pub const HIGHLIGHT_LUMA: f64 = 192.0;

/// Luma below which `shadows` applies.
pub const SHADOW_LUMA: f64 = 64.0;

/// Tone parameters. Every field defaults to 0 (no-op).
///
/// `highlights`, `shadows`, `whites` and `blacks` are additive level
/// offsets. `saturation` and `vibrance` are fractions (`0.25` = +25%).
/// `dehaze` is a percentage.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToneSpec {
    /// Offset added to pixels with luma above [`HIGHLIGHT_LUMA`].
    pub highlights: f64,
    /// Offset added to pixels with luma below [`SHADOW_LUMA`].
    pub shadows: f64,
    /// Global lift.
    pub whites: f64,
    /// Global drop.
    pub blacks: f64,
    /// Saturation boost weighted by how saturated the pixel already is.
    pub vibrance: f64,
    /// Uniform saturation change.
    pub saturation: f64,
    /// Warm-haze removal: boosts red, cuts green and blue.
    pub dehaze: f64,
}

impl ToneSpec {
    /// Returns `true` if every field is zero.
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }
}

#[inline]
fn clamp255(c: &mut [f64; 3]) {
    for v in c.iter_mut() {
        *v = v.clamp(0.0, 255.0);
    }
}

#[inline]
fn add_all(c: &mut [f64; 3], d: f64) {
    for v in c.iter_mut() {
        *v += d;
    }
    clamp255(c);
}

/// Tone-adjusts one pixel.
///
/// ```rust
/// use retouch_ops::tone::{tone_pixel, ToneSpec};
///
/// let spec = ToneSpec { highlights: 20.0, ..Default::default() };
/// assert_eq!(tone_pixel([220, 220, 220, 255], &spec), [240, 240, 240, 255]);
/// assert_eq!(tone_pixel([100, 100, 100, 255], &spec), [100, 100, 100, 255]);
/// ```
pub fn tone_pixel(px: [u8; 4], spec: &ToneSpec) -> [u8; 4] {
    let mut c = [px[0] as f64, px[1] as f64, px[2] as f64];

    let y = luma(c[0], c[1], c[2]);
    if y > HIGHLIGHT_LUMA {
        if spec.highlights != 0.0 {
            add_all(&mut c, spec.highlights);
        }
    } else if y < SHADOW_LUMA && spec.shadows != 0.0 {
        add_all(&mut c, spec.shadows);
    }

    let lift = spec.whites - spec.blacks;
    if lift != 0.0 {
        add_all(&mut c, lift);
    }

    if spec.saturation != 0.0 {
        let avg = (c[0] + c[1] + c[2]) / 3.0;
        for v in c.iter_mut() {
            *v += (*v - avg) * spec.saturation;
        }
        clamp255(&mut c);
    }

    if spec.vibrance != 0.0 {
        let avg = (c[0] + c[1] + c[2]) / 3.0;
        let max = c[0].max(c[1]).max(c[2]);
        if max > avg {
            let k = spec.vibrance * (max - avg) / 255.0;
            for v in c.iter_mut() {
                *v += (*v - avg) * k;
            }
            clamp255(&mut c);
        }
    }

    if spec.dehaze != 0.0 {
        c[0] *= 1.0 + spec.dehaze / 100.0;
        c[1] *= 1.0 - spec.dehaze / 200.0;
        c[2] *= 1.0 - spec.dehaze / 200.0;
        clamp255(&mut c);
    }

    [to_byte(c[0]), to_byte(c[1]), to_byte(c[2]), px[3]]
}

/// Applies tone adjustments in place.
pub fn apply_tone(raster: &mut Raster, spec: &ToneSpec) {
    trace!(width = raster.width(), height = raster.height(), "tone");
    if spec.is_identity() {
        return;
    }
    map_pixels(raster, |px| tone_pixel(px, spec));
}
