//! 8-bit coverage masks for local adjustments.
//!
//! A [`Mask`] stores one byte per pixel: 0 keeps the source, 255 takes the
//! adjusted result, values in between mix linearly. Masks never resample; a
//! size mismatch against the raster is an error.

use crate::OpsResult;
use retouch_core::{Error, Raster, CHANNELS};
use tracing::trace;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Per-pixel coverage, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Mask {
    /// Mask with every pixel set to `value`.
    pub fn filled(width: u32, height: u32, value: u8) -> Self {
        Self {
            width,
            height,
            data: vec![value; width as usize * height as usize],
        }
    }

    /// Mask that selects everything.
    pub fn full(width: u32, height: u32) -> Self {
        Self::filled(width, height, 255)
    }

    /// Mask that selects nothing.
    pub fn empty(width: u32, height: u32) -> Self {
        Self::filled(width, height, 0)
    }

    /// Wraps existing coverage bytes.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidDimensions`] if `data.len() != width * height`.
    pub fn from_data(width: u32, height: u32, data: Vec<u8>) -> OpsResult<Self> {
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(Error::invalid_dimensions(
                width,
                height,
                format!("mask expects {expected} bytes, got {}", data.len()),
            )
            .into());
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Rectangle of full coverage on an empty mask. Clipped to the bounds.
    pub fn rect(width: u32, height: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> Self {
        let mut mask = Self::empty(width, height);
        for y in y0.min(height)..y1.min(height) {
            for x in x0.min(width)..x1.min(width) {
                mask.set(x, y, 255);
            }
        }
        mask
    }

    /// `(width, height)` pair.
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Coverage bytes.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Coverage at `(x, y)`.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.data[y as usize * self.width as usize + x as usize]
    }

    /// Sets coverage at `(x, y)`.
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, v: u8) {
        self.data[y as usize * self.width as usize + x as usize] = v;
    }

    /// Inverts coverage.
    pub fn invert(&mut self) {
        for v in &mut self.data {
            *v = 255 - *v;
        }
    }

    /// Returns `true` if every byte is 0.
    pub fn is_empty(&self) -> bool {
        self.data.iter().all(|&v| v == 0)
    }

    /// Returns `true` if every byte is 255.
    pub fn is_full(&self) -> bool {
        self.data.iter().all(|&v| v == 255)
    }
}

#[inline]
fn mix(src: u8, adj: u8, m: u8) -> u8 {
    let (s, a, m) = (src as u32, adj as u32, m as u32);
    // Integer lerp with rounding, exact at m = 0 and m = 255.
    ((s * (255 - m) + a * m + 127) / 255) as u8
}

/// Mixes `adjusted` over `source` by `mask`, all channels including alpha.
///
/// # Errors
///
/// `DimensionMismatch` if any of the three sizes differ.
pub fn blend(source: &Raster, adjusted: &Raster, mask: &Mask) -> OpsResult<Raster> {
    source.ensure_same_dimensions(adjusted.dimensions())?;
    source.ensure_same_dimensions(mask.dimensions())?;
    trace!(width = source.width(), height = source.height(), "mask blend");

    let mut out = adjusted.clone();
    let src = source.pixels();
    let coverage = mask.data();

    let mix_pixel = |(i, px): (usize, &mut [u8])| {
        let m = coverage[i];
        let base = i * CHANNELS;
        for c in 0..CHANNELS {
            px[c] = mix(src[base + c], px[c], m);
        }
    };

    #[cfg(feature = "parallel")]
    out.pixels_mut()
        .par_chunks_exact_mut(CHANNELS)
        .enumerate()
        .for_each(mix_pixel);

    #[cfg(not(feature = "parallel"))]
    out.pixels_mut()
        .chunks_exact_mut(CHANNELS)
        .enumerate()
        .for_each(mix_pixel);

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mix_endpoints() {
        for s in [0u8, 17, 200, 255] {
            for a in [0u8, 99, 255] {
                assert_eq!(mix(s, a, 0), s);
                assert_eq!(mix(s, a, 255), a);
            }
        }
        assert_eq!(mix(0, 255, 128), 128);
    }

    #[test]
    fn test_from_data_length() {
        assert!(Mask::from_data(2, 2, vec![0; 4]).is_ok());
        assert!(Mask::from_data(2, 2, vec![0; 5]).is_err());
    }

    #[test]
    fn test_rect_and_invert() {
        let mut m = Mask::rect(4, 4, 1, 1, 3, 10);
        assert_eq!(m.get(0, 0), 0);
        assert_eq!(m.get(2, 3), 255);
        m.invert();
        assert_eq!(m.get(0, 0), 255);
        assert!(!m.is_full());
        assert!(Mask::full(2, 2).is_full());
        assert!(Mask::empty(2, 2).is_empty());
    }

    #[test]
    fn test_blend_selects_region() {
        let src = Raster::filled(4, 1, [0, 0, 0, 255]);
        let adj = Raster::filled(4, 1, [200, 100, 50, 255]);
        let mask = Mask::rect(4, 1, 2, 0, 4, 1);
        let out = blend(&src, &adj, &mask).unwrap();
        assert_eq!(out.pixel(0, 0), [0, 0, 0, 255]);
        assert_eq!(out.pixel(3, 0), [200, 100, 50, 255]);
    }

    #[test]
    fn test_blend_mismatch() {
        let src = Raster::new(4, 4);
        let err = blend(&src, &src, &Mask::full(4, 3)).unwrap_err();
        assert!(err.is_dimension_mismatch());
    }
}
