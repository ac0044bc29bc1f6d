//! Row-parallel pixel iteration.
//!
//! Every per-pixel stage funnels through [`map_pixels`] and every
//! neighborhood stage through [`for_each_row`]. With the `parallel` feature
//! (default) rows are distributed over the rayon pool; without it the same
//! closures run sequentially. Output is identical either way because each
//! row is written exactly once from read-only inputs.

use retouch_core::{Raster, CHANNELS};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Replaces every pixel with `f(pixel)`.
///
/// # Example
///
/// ```rust
/// use retouch_core::Raster;
/// use retouch_ops::parallel::map_pixels;
///
/// let mut r = Raster::filled(8, 8, [10, 20, 30, 255]);
/// map_pixels(&mut r, |[r, g, b, a]| [b, g, r, a]);
/// assert_eq!(r.pixel(7, 7), [30, 20, 10, 255]);
/// ```
pub fn map_pixels<F>(raster: &mut Raster, f: F)
where
    F: Fn([u8; 4]) -> [u8; 4] + Sync + Send,
{
    let apply = |px: &mut [u8]| {
        let out = f([px[0], px[1], px[2], px[3]]);
        px.copy_from_slice(&out);
    };

    for_each_row(raster, |_, row| {
        row.chunks_exact_mut(CHANNELS).for_each(apply);
    });
}

/// Calls `f(y, row)` for every row of the raster, where `row` is the
/// mutable `width * 4` byte slice of row `y`.
pub fn for_each_row<F>(raster: &mut Raster, f: F)
where
    F: Fn(usize, &mut [u8]) + Sync + Send,
{
    let stride = raster.stride();
    if stride == 0 || raster.is_empty() {
        return;
    }

    #[cfg(feature = "parallel")]
    raster
        .pixels_mut()
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row)| f(y, row));

    #[cfg(not(feature = "parallel"))]
    raster
        .pixels_mut()
        .chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row)| f(y, row));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_pixels_touches_every_pixel() {
        let mut r = Raster::new(13, 7);
        map_pixels(&mut r, |[_, _, _, a]| [1, 2, 3, a.wrapping_add(9)]);
        for chunk in r.pixels().chunks_exact(4) {
            assert_eq!(chunk, &[1, 2, 3, 9]);
        }
    }

    #[test]
    fn test_for_each_row_indices() {
        let mut r = Raster::new(3, 5);
        for_each_row(&mut r, |y, row| {
            for b in row.iter_mut() {
                *b = y as u8;
            }
        });
        for y in 0..5 {
            assert_eq!(r.pixel(2, y), [y as u8; 4]);
        }
    }

    #[test]
    fn test_empty_raster_is_noop() {
        let mut r = Raster::new(0, 4);
        map_pixels(&mut r, |_| [255; 4]);
        assert!(r.is_empty());
    }
}
