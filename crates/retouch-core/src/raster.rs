//! Owned RGBA raster buffer.
//!
//! A [`Raster`] is the unit of work for every pipeline stage: a flat
//! `width * height * 4` byte buffer, row-major, top-to-bottom, channels
//! interleaved as R, G, B, A with straight (non-premultiplied) alpha.
//!
//! ```text
//! Memory: [R G B A R G B A ...]  <- Row 0
//!         [R G B A R G B A ...]  <- Row 1
//! ```
//!
//! # Ownership
//!
//! Unlike a shared image handle, a `Raster` owns its bytes outright. A stage
//! either takes `&mut Raster` and edits in place, or consumes one raster and
//! returns another. Two live mutable owners of the same backing storage
//! cannot exist. Sharing a read-only source across threads is done by
//! wrapping it in an `Arc<Raster>` and cloning on use.

use crate::{Error, Result};
use std::fmt;

/// Number of interleaved channels per pixel (R, G, B, A).
pub const CHANNELS: usize = 4;

/// Owned 8-bit RGBA pixel buffer with explicit dimensions.
///
/// # Example
///
/// ```rust
/// use retouch_core::Raster;
///
/// let bytes = vec![10u8; 2 * 3 * 4];
/// let raster = Raster::from_pixels(2, 3, bytes).unwrap();
/// assert_eq!(raster.dimensions(), (2, 3));
/// assert_eq!(raster.pixel(1, 2), [10, 10, 10, 10]);
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Raster {
    /// Creates a fully transparent black raster.
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize * CHANNELS;
        Self {
            width,
            height,
            pixels: vec![0; len],
        }
    }

    /// Creates a raster where every pixel is `rgba`.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let count = width as usize * height as usize;
        let mut pixels = Vec::with_capacity(count * CHANNELS);
        for _ in 0..count {
            pixels.extend_from_slice(&rgba);
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Wraps an existing byte buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] if `pixels.len()` is not
    /// `width * height * 4` or the size computation overflows.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(CHANNELS))
            .ok_or_else(|| Error::invalid_dimensions(width, height, "size overflows usize"))?;
        if pixels.len() != expected {
            return Err(Error::invalid_dimensions(
                width,
                height,
                format!("expected {} bytes, got {}", expected, pixels.len()),
            ));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Raster width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Raster height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)` pair.
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Number of pixels (not bytes).
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Returns `true` if the raster has no pixels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Bytes per row.
    #[inline]
    pub fn stride(&self) -> usize {
        self.width as usize * CHANNELS
    }

    /// Raw interleaved RGBA bytes.
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Mutable raw interleaved RGBA bytes.
    #[inline]
    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// Consumes the raster and returns its byte buffer.
    #[inline]
    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    /// Reads the pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are out of bounds. Use [`Self::get_pixel`]
    /// for a checked read.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = self.index(x, y);
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    /// Checked pixel read.
    pub fn get_pixel(&self, x: u32, y: u32) -> Result<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return Err(Error::out_of_bounds(x, y, self.width, self.height));
        }
        Ok(self.pixel(x, y))
    }

    /// Writes the pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are out of bounds.
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        let i = self.index(x, y);
        self.pixels[i..i + CHANNELS].copy_from_slice(&rgba);
    }

    /// Fails with [`Error::DimensionMismatch`] unless `other` has the same size.
    pub fn ensure_same_dimensions(&self, other: (u32, u32)) -> Result<()> {
        if self.dimensions() != other {
            return Err(Error::dimension_mismatch(self.dimensions(), other));
        }
        Ok(())
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * CHANNELS
    }
}

impl fmt::Debug for Raster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Raster")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_transparent() {
        let r = Raster::new(3, 2);
        assert_eq!(r.pixels().len(), 24);
        assert!(r.pixels().iter().all(|&b| b == 0));
        assert_eq!(r.stride(), 12);
    }

    #[test]
    fn test_from_pixels_length_check() {
        assert!(Raster::from_pixels(2, 2, vec![0; 16]).is_ok());
        let err = Raster::from_pixels(2, 2, vec![0; 15]).unwrap_err();
        assert!(matches!(err, Error::InvalidDimensions { .. }));
    }

    #[test]
    fn test_pixel_roundtrip() {
        let mut r = Raster::filled(4, 4, [1, 2, 3, 4]);
        r.set_pixel(3, 2, [9, 8, 7, 6]);
        assert_eq!(r.pixel(3, 2), [9, 8, 7, 6]);
        assert_eq!(r.pixel(0, 0), [1, 2, 3, 4]);
        assert!(r.get_pixel(4, 0).is_err());
    }

    #[test]
    fn test_clone_is_independent() {
        let a = Raster::filled(2, 2, [5, 5, 5, 255]);
        let mut b = a.clone();
        b.set_pixel(0, 0, [0, 0, 0, 0]);
        assert_eq!(a.pixel(0, 0), [5, 5, 5, 255]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_ensure_same_dimensions() {
        let r = Raster::new(8, 4);
        assert!(r.ensure_same_dimensions((8, 4)).is_ok());
        assert!(r.ensure_same_dimensions((4, 8)).unwrap_err().is_dimension_mismatch());
    }

    #[test]
    fn test_debug_is_compact() {
        let r = Raster::new(100, 100);
        let s = format!("{:?}", r);
        assert!(s.contains("40000"));
        assert!(s.len() < 80);
    }
}
