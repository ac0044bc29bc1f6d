//! Alpha knock-out by brightness threshold.
//!
//! Pixels whose R, G and B are *all* beyond the threshold become fully
//! transparent. Color channels are kept so a later threshold change can be
//! re-run from the pristine source without loss.

use crate::parallel::map_pixels;
use retouch_core::Raster;
use tracing::trace;

/// Default white threshold; nothing is brighter than 255, so it never fires.
pub const WHITE_OFF: u8 = 255;

/// Default black threshold; nothing is darker than 0, so it never fires.
pub const BLACK_OFF: u8 = 0;

/// Clears alpha where R, G and B are all strictly greater than `t`.
///
/// ```rust
/// use retouch_core::Raster;
/// use retouch_ops::threshold::threshold_white;
///
/// let mut r = Raster::filled(1, 1, [250, 250, 250, 255]);
/// threshold_white(&mut r, 240);
/// assert_eq!(r.pixel(0, 0), [250, 250, 250, 0]);
/// ```
pub fn threshold_white(raster: &mut Raster, t: u8) {
    trace!(t, "threshold white");
    if t == WHITE_OFF {
        return;
    }
    map_pixels(raster, |[r, g, b, a]| {
        if r > t && g > t && b > t {
            [r, g, b, 0]
        } else {
            [r, g, b, a]
        }
    });
}

/// Clears alpha where R, G and B are all strictly less than `t`.
pub fn threshold_black(raster: &mut Raster, t: u8) {
    trace!(t, "threshold black");
    if t == BLACK_OFF {
        return;
    }
    map_pixels(raster, |[r, g, b, a]| {
        if r < t && g < t && b < t {
            [r, g, b, 0]
        } else {
            [r, g, b, a]
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_white_threshold_240() {
        let mut r = Raster::new(3, 1);
        r.set_pixel(0, 0, [250, 250, 250, 255]);
        r.set_pixel(1, 0, [230, 230, 230, 255]);
        r.set_pixel(2, 0, [250, 250, 100, 255]);
        threshold_white(&mut r, 240);
        assert_eq!(r.pixel(0, 0), [250, 250, 250, 0]);
        assert_eq!(r.pixel(1, 0), [230, 230, 230, 255]);
        assert_eq!(r.pixel(2, 0), [250, 250, 100, 255]);
    }

    #[test]
    fn test_boundary_is_exclusive() {
        let mut r = Raster::filled(1, 1, [240, 240, 240, 255]);
        threshold_white(&mut r, 240);
        assert_eq!(r.pixel(0, 0)[3], 255);
        threshold_black(&mut r, 240);
        assert_eq!(r.pixel(0, 0)[3], 255);
    }

    #[test]
    fn test_black_threshold() {
        let mut r = Raster::new(2, 1);
        r.set_pixel(0, 0, [5, 8, 2, 200]);
        r.set_pixel(1, 0, [5, 80, 2, 200]);
        threshold_black(&mut r, 10);
        assert_eq!(r.pixel(0, 0), [5, 8, 2, 0]);
        assert_eq!(r.pixel(1, 0), [5, 80, 2, 200]);
    }

    #[test]
    fn test_defaults_never_fire() {
        let src = Raster::filled(2, 2, [255, 255, 255, 255]);
        let mut r = src.clone();
        threshold_white(&mut r, WHITE_OFF);
        let mut dark = Raster::filled(2, 2, [0, 0, 0, 255]);
        threshold_black(&mut dark, BLACK_OFF);
        assert_eq!(r, src);
        assert_eq!(dark.pixel(0, 0)[3], 255);
    }
}
