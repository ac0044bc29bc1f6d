//! Per-channel and luma histograms.
//!
//! Fully transparent pixels carry no visible color and are left out of all
//! four tables.

use retouch_core::color::{luma, to_byte};
use retouch_core::{Raster, CHANNELS};
use tracing::trace;

/// 256-bin counts for R, G, B and luma.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    /// Red bins.
    pub red: [u32; 256],
    /// Green bins.
    pub green: [u32; 256],
    /// Blue bins.
    pub blue: [u32; 256],
    /// Luma bins, `round(0.299r + 0.587g + 0.114b)`.
    pub luma: [u32; 256],
}

impl Default for Histogram {
    fn default() -> Self {
        Self {
            red: [0; 256],
            green: [0; 256],
            blue: [0; 256],
            luma: [0; 256],
        }
    }
}

impl Histogram {
    /// Counts every pixel with non-zero alpha.
    ///
    /// ```rust
    /// use retouch_core::Raster;
    /// use retouch_ops::Histogram;
    ///
    /// let h = Histogram::from_raster(&Raster::filled(4, 4, [255, 0, 0, 255]));
    /// assert_eq!(h.red[255], 16);
    /// assert_eq!(h.luma[76], 16);
    /// ```
    pub fn from_raster(raster: &Raster) -> Self {
        trace!(width = raster.width(), height = raster.height(), "histogram");
        let mut h = Self::default();
        for px in raster.pixels().chunks_exact(CHANNELS) {
            if px[3] == 0 {
                continue;
            }
            h.red[px[0] as usize] += 1;
            h.green[px[1] as usize] += 1;
            h.blue[px[2] as usize] += 1;
            let y = to_byte(luma(px[0] as f64, px[1] as f64, px[2] as f64));
            h.luma[y as usize] += 1;
        }
        h
    }

    /// Number of counted pixels.
    pub fn total(&self) -> u64 {
        self.red.iter().map(|&c| c as u64).sum()
    }

    /// Tallest bin across the three color channels, for display scaling.
    pub fn max_bin(&self) -> u32 {
        self.red
            .iter()
            .chain(&self.green)
            .chain(&self.blue)
            .copied()
            .max()
            .unwrap_or(0)
    }

    /// Mean of a 256-bin table, `None` when it is empty.
    pub fn mean(bins: &[u32; 256]) -> Option<f64> {
        let (n, sum) = bins
            .iter()
            .enumerate()
            .fold((0u64, 0u64), |(n, s), (i, &c)| (n + c as u64, s + i as u64 * c as u64));
        (n > 0).then(|| sum as f64 / n as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transparent_excluded() {
        let mut r = Raster::filled(3, 3, [10, 20, 30, 255]);
        r.set_pixel(0, 0, [10, 20, 30, 0]);
        r.set_pixel(1, 0, [10, 20, 30, 0]);
        let h = Histogram::from_raster(&r);
        assert_eq!(h.total(), 7);
        assert_eq!(h.green[20], 7);
        assert_eq!(h.luma.iter().sum::<u32>(), 7);
    }

    #[test]
    fn test_empty() {
        let h = Histogram::from_raster(&Raster::new(5, 5));
        assert_eq!(h.total(), 0);
        assert_eq!(h.max_bin(), 0);
        assert_eq!(Histogram::mean(&h.red), None);
    }

    #[test]
    fn test_mean() {
        let mut r = Raster::filled(2, 1, [0, 0, 0, 255]);
        r.set_pixel(1, 0, [100, 0, 0, 255]);
        let h = Histogram::from_raster(&r);
        assert_eq!(Histogram::mean(&h.red), Some(50.0));
    }
}
