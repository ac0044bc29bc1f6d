//! Brightness and contrast.
//!
//! Uses the classic 8-bit contrast correction factor
//! `f = 259(c + 255) / (255(259 - c))`, so `c = 0` gives exactly `f = 1`.
//! Both inputs are in `-100..=100`; only R, G and B are affected.

use crate::curves::Lut;
use crate::parallel::map_pixels;
use retouch_core::color::to_byte;
use retouch_core::Raster;
use tracing::trace;

/// Contrast correction factor for `contrast` in `-255..=255`.
///
/// ```rust
/// use retouch_ops::levels::contrast_factor;
///
/// assert_eq!(contrast_factor(0.0), 1.0);
/// assert!(contrast_factor(50.0) > 1.0);
/// assert!(contrast_factor(-50.0) < 1.0);
/// ```
pub fn contrast_factor(contrast: f64) -> f64 {
    // 259 would divide by zero
    let c = contrast.clamp(-255.0, 255.0);
    (259.0 * (c + 255.0)) / (255.0 * (259.0 - c))
}

/// Builds the shared R/G/B table for a brightness/contrast pair.
pub fn brightness_contrast_lut(brightness: f64, contrast: f64) -> Lut {
    let f = contrast_factor(contrast);
    let mut lut = [0u8; 256];
    for (v, out) in lut.iter_mut().enumerate() {
        *out = to_byte(f * (v as f64 + brightness - 128.0) + 128.0);
    }
    lut
}

/// Applies brightness and contrast in place.
pub fn apply_brightness_contrast(raster: &mut Raster, brightness: f64, contrast: f64) {
    trace!(brightness, contrast, "brightness/contrast");
    if brightness == 0.0 && contrast == 0.0 {
        return;
    }
    let lut = brightness_contrast_lut(brightness, contrast);
    map_pixels(raster, |[r, g, b, a]| {
        [lut[r as usize], lut[g as usize], lut[b as usize], a]
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curves::identity_lut;

    #[test]
    fn test_neutral_is_identity() {
        assert_eq!(brightness_contrast_lut(0.0, 0.0), identity_lut());
    }

    #[test]
    fn test_brightness_offsets() {
        let lut = brightness_contrast_lut(20.0, 0.0);
        assert_eq!(lut[100], 120);
        assert_eq!(lut[250], 255);
    }

    #[test]
    fn test_contrast_pivots_on_mid_gray() {
        let lut = brightness_contrast_lut(0.0, 60.0);
        assert_eq!(lut[128], 128);
        assert!(lut[64] < 64);
        assert!(lut[192] > 192);
        assert!(lut.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_extreme_contrast_is_finite() {
        assert!(contrast_factor(259.0).is_finite());
    }

    #[test]
    fn test_alpha_untouched() {
        let mut r = Raster::filled(2, 2, [10, 20, 30, 40]);
        apply_brightness_contrast(&mut r, 50.0, 10.0);
        assert_eq!(r.pixel(0, 0)[3], 40);
    }
}
