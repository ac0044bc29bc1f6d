//! Spatial convolution: box blur, Gaussian blur, sharpen, texture, clarity.
//!
//! # Kernels
//!
//! - [`Kernel::box_blur`] - uniform average, side capped at [`MAX_BOX_SIZE`]
//! - [`Kernel::gaussian`] - normalized Gaussian, radius capped at
//!   [`MAX_GAUSSIAN_RADIUS`], `sigma = radius / 2`
//! - [`Kernel::sharpen`] - 4-neighbor Laplacian sharpen
//! - [`Kernel::texture`] / [`Kernel::clarity`] - scaled sharpen variants
//!
//! # Borders
//!
//! Samples that fall outside the raster contribute nothing: their weight is
//! dropped and the remaining weights are *not* renormalized. Border pixels of
//! a blurred image therefore darken slightly. A uniform raster stays uniform
//! only away from the border, within `kernel.radius()` pixels of an edge the
//! output is attenuated.
//!
//! # Example
//!
//! ```rust
//! use retouch_core::Raster;
//! use retouch_ops::convolve::{apply_convolution, Kernel};
//!
//! let mut r = Raster::filled(16, 16, [200, 100, 50, 255]);
//! apply_convolution(&mut r, &Kernel::gaussian(2));
//! assert_eq!(r.pixel(8, 8), [200, 100, 50, 255]);
//! ```

use crate::parallel::for_each_row;
use crate::{OpsError, OpsResult};
use retouch_core::color::to_byte;
use retouch_core::{Raster, CHANNELS};
use tracing::{debug, trace};

/// Largest box kernel side length.
pub const MAX_BOX_SIZE: usize = 15;

/// Largest Gaussian radius; larger requests are clamped.
pub const MAX_GAUSSIAN_RADIUS: u32 = 10;

/// Upper bound on repeated sharpen passes.
pub const MAX_SHARPEN_PASSES: u32 = 3;

/// Texture amount to sharpen amount.
pub const TEXTURE_SCALE: f64 = 0.05;

/// Clarity amount to sharpen amount.
pub const CLARITY_SCALE: f64 = 0.08;

/// Square convolution kernel with odd side length.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    data: Vec<f64>,
    size: usize,
}

impl Kernel {
    /// Creates a kernel from row-major weights.
    ///
    /// # Errors
    ///
    /// Returns [`OpsError::InvalidKernel`] if `size` is even or zero, or
    /// `data.len() != size * size`.
    pub fn new(data: Vec<f64>, size: usize) -> OpsResult<Self> {
        if size % 2 == 0 {
            return Err(OpsError::InvalidKernel(format!(
                "kernel side must be odd, got {size}"
            )));
        }
        if data.len() != size * size {
            return Err(OpsError::InvalidKernel(format!(
                "kernel data size {} doesn't match {size}x{size}",
                data.len()
            )));
        }
        Ok(Self { data, size })
    }

    /// The 1x1 pass-through kernel.
    pub fn identity() -> Self {
        Self {
            data: vec![1.0],
            size: 1,
        }
    }

    /// Uniform averaging kernel of side `size`.
    ///
    /// Even sizes are bumped to the next odd number, then capped at
    /// [`MAX_BOX_SIZE`].
    ///
    /// ```rust
    /// use retouch_ops::convolve::Kernel;
    ///
    /// let k = Kernel::box_blur(3);
    /// assert_eq!(k.size(), 3);
    /// assert!((k.data()[0] - 1.0 / 9.0).abs() < 1e-12);
    /// ```
    pub fn box_blur(size: usize) -> Self {
        let size = if size % 2 == 0 { size + 1 } else { size };
        let size = size.min(MAX_BOX_SIZE);
        let count = size * size;
        Self {
            data: vec![1.0 / count as f64; count],
            size,
        }
    }

    /// Box kernel for a blur radius: side `min(2r + 1, MAX_BOX_SIZE)`.
    pub fn box_blur_radius(radius: u32) -> Self {
        Self::box_blur(2 * radius as usize + 1)
    }

    /// Normalized Gaussian kernel with side `2r + 1` and `sigma = r / 2`.
    ///
    /// `radius` is clamped to [`MAX_GAUSSIAN_RADIUS`]; radius 0 yields the
    /// identity kernel.
    pub fn gaussian(radius: u32) -> Self {
        let radius = radius.min(MAX_GAUSSIAN_RADIUS);
        if radius == 0 {
            return Self::identity();
        }

        let half = radius as i32;
        let size = 2 * radius as usize + 1;
        let sigma = radius as f64 / 2.0;
        let sigma2 = 2.0 * sigma * sigma;

        let mut data = Vec::with_capacity(size * size);
        let mut sum = 0.0;
        for y in -half..=half {
            for x in -half..=half {
                let d = (x * x + y * y) as f64;
                let w = (-d / sigma2).exp();
                data.push(w);
                sum += w;
            }
        }

        for w in &mut data {
            *w /= sum;
        }

        Self { data, size }
    }

    /// 3x3 sharpen: center `1 + 4a`, 4-neighbors `-a`, corners 0.
    ///
    /// Weights always sum to 1, so flat regions are preserved.
    pub fn sharpen(amount: f64) -> Self {
        let a = amount;
        let center = 1.0 + 4.0 * a;
        Self {
            data: vec![
                0.0, -a, 0.0,
                -a, center, -a,
                0.0, -a, 0.0,
            ],
            size: 3,
        }
    }

    /// Fine local-contrast sharpen, `sharpen(amount * TEXTURE_SCALE)`.
    pub fn texture(amount: f64) -> Self {
        Self::sharpen(amount * TEXTURE_SCALE)
    }

    /// Mid-frequency local-contrast sharpen, `sharpen(amount * CLARITY_SCALE)`.
    pub fn clarity(amount: f64) -> Self {
        Self::sharpen(amount * CLARITY_SCALE)
    }

    /// Row-major weights.
    #[inline]
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Side length.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Half side length.
    #[inline]
    pub fn radius(&self) -> usize {
        self.size / 2
    }

    /// Sum of all weights.
    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    /// Returns `true` for the 1x1 unit kernel.
    pub fn is_identity(&self) -> bool {
        self.size == 1 && self.data[0] == 1.0
    }
}

/// Splits a sharpen amount into `(passes, per_pass_amount)`.
///
/// `passes = clamp(ceil(|amount|), 1, MAX_SHARPEN_PASSES)`.
///
/// ```rust
/// use retouch_ops::convolve::sharpen_passes;
///
/// assert_eq!(sharpen_passes(0.5), (1, 0.5));
/// assert_eq!(sharpen_passes(2.0), (2, 1.0));
/// assert_eq!(sharpen_passes(9.0), (3, 3.0));
/// ```
pub fn sharpen_passes(amount: f64) -> (u32, f64) {
    let passes = (amount.abs().ceil() as u32).clamp(1, MAX_SHARPEN_PASSES);
    (passes, amount / passes as f64)
}

/// Sharpens in place with repeated passes; see [`sharpen_passes`].
pub fn apply_sharpen(raster: &mut Raster, amount: f64) {
    if amount == 0.0 || !amount.is_finite() {
        return;
    }
    let (passes, per_pass) = sharpen_passes(amount);
    debug!(amount, passes, "Applying sharpen");
    let kernel = Kernel::sharpen(per_pass);
    for _ in 0..passes {
        apply_convolution(raster, &kernel);
    }
}

/// Convolves every channel of `raster` with `kernel`, in place.
///
/// Out-of-bounds samples are skipped. Results are rounded and clamped to
/// bytes. If the weighted alpha sum is exactly zero the source alpha is kept.
pub fn apply_convolution(raster: &mut Raster, kernel: &Kernel) {
    let (width, height) = raster.dimensions();
    trace!(width, height, kernel = kernel.size, "convolve");
    if raster.is_empty() || kernel.is_identity() {
        return;
    }

    let w = width as isize;
    let h = height as isize;
    let stride = raster.stride();
    let size = kernel.size;
    let half = kernel.radius() as isize;
    let src = raster.pixels().to_vec();
    let weights = kernel.data();

    for_each_row(raster, |y, row| {
        for x in 0..width as usize {
            let mut sums = [0.0f64; CHANNELS];

            for ky in 0..size {
                let sy = y as isize + ky as isize - half;
                if sy < 0 || sy >= h {
                    continue;
                }
                let src_row = sy as usize * stride;

                for kx in 0..size {
                    let sx = x as isize + kx as isize - half;
                    if sx < 0 || sx >= w {
                        continue;
                    }
                    let kw = weights[ky * size + kx];
                    let i = src_row + sx as usize * CHANNELS;
                    for c in 0..CHANNELS {
                        sums[c] += src[i + c] as f64 * kw;
                    }
                }
            }

            let o = x * CHANNELS;
            for c in 0..3 {
                row[o + c] = to_byte(sums[c]);
            }
            row[o + 3] = if sums[3] == 0.0 {
                src[y * stride + o + 3]
            } else {
                to_byte(sums[3])
            };
        }
    });
}
