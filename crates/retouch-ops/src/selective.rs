//! Per-hue-band HSL correction.
//!
//! The hue circle is partitioned into eight fixed bands. Each pixel is
//! classified into exactly one band and only that band's [`HslOffset`]
//! applies. Hue shifts are clamped to the band's own range, never wrapped,
//! so a red pixel stays red no matter how far its hue is pushed.
//!
//! ```text
//!   0    15   45   75        165  195       255  285       345  360
//!   |red |orng|yelw|  green   |aqua|   blue   |purp|  magenta |red|
//! ```
//!
//! Gray pixels (saturation 0) have no hue and are never touched.

use crate::parallel::map_pixels;
use retouch_core::color::{hsl_to_rgb, rgb_to_hsl};
use retouch_core::Raster;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;

/// One of the eight fixed hue ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HueBand {
    /// 345° to 15°, wrapping through 0°.
    Red,
    /// 15° to 45°.
    Orange,
    /// 45° to 75°.
    Yellow,
    /// 75° to 165°.
    Green,
    /// 165° to 195°.
    #[serde(alias = "cyan")]
    Aqua,
    /// 195° to 255°.
    Blue,
    /// 255° to 285°.
    Purple,
    /// 285° to 345°.
    Magenta,
}

impl HueBand {
    /// All bands, in classification order.
    pub const ALL: [HueBand; 8] = [
        HueBand::Red,
        HueBand::Orange,
        HueBand::Yellow,
        HueBand::Green,
        HueBand::Aqua,
        HueBand::Blue,
        HueBand::Purple,
        HueBand::Magenta,
    ];

    /// `(start, end)` in degrees as written; the red band has `start > end`.
    pub const fn range(self) -> (f64, f64) {
        match self {
            HueBand::Red => (345.0, 15.0),
            HueBand::Orange => (15.0, 45.0),
            HueBand::Yellow => (45.0, 75.0),
            HueBand::Green => (75.0, 165.0),
            HueBand::Aqua => (165.0, 195.0),
            HueBand::Blue => (195.0, 255.0),
            HueBand::Purple => (255.0, 285.0),
            HueBand::Magenta => (285.0, 345.0),
        }
    }

    /// Returns `true` for the band that crosses 0°.
    #[inline]
    pub fn wraps(self) -> bool {
        let (start, end) = self.range();
        start > end
    }

    /// Range with `end` lifted by 360 for the wrap band, so `start < end`.
    pub fn unwrapped_range(self) -> (f64, f64) {
        let (start, end) = self.range();
        if self.wraps() {
            (start, end + 360.0)
        } else {
            (start, end)
        }
    }

    /// Angular width in degrees.
    pub fn width(self) -> f64 {
        let (start, end) = self.unwrapped_range();
        end - start
    }

    /// Membership test for a hue in degrees, `[0, 360)`.
    pub fn contains(self, deg: f64) -> bool {
        let (start, end) = self.range();
        if self.wraps() {
            deg >= start || deg <= end
        } else {
            start <= deg && deg < end
        }
    }

    /// First band (in [`Self::ALL`] order) containing `deg`.
    pub fn classify(deg: f64) -> HueBand {
        let deg = deg.rem_euclid(360.0);
        Self::ALL
            .into_iter()
            .find(|b| b.contains(deg))
            .unwrap_or(HueBand::Red)
    }

    /// Shifts `deg` by `offset`, clamped to this band's range.
    ///
    /// ```rust
    /// use retouch_ops::selective::HueBand;
    ///
    /// assert_eq!(HueBand::Red.shift_hue(0.0, 90.0), 15.0);
    /// assert_eq!(HueBand::Red.shift_hue(10.0, -40.0), 345.0);
    /// assert_eq!(HueBand::Green.shift_hue(100.0, 20.0), 120.0);
    /// ```
    pub fn shift_hue(self, deg: f64, offset: f64) -> f64 {
        let (start, end) = self.unwrapped_range();
        let mut d = deg;
        if self.wraps() && d < start {
            d += 360.0;
        }
        (d + offset).clamp(start, end).rem_euclid(360.0)
    }

    /// Lowercase band name.
    pub fn name(self) -> &'static str {
        match self {
            HueBand::Red => "red",
            HueBand::Orange => "orange",
            HueBand::Yellow => "yellow",
            HueBand::Green => "green",
            HueBand::Aqua => "aqua",
            HueBand::Blue => "blue",
            HueBand::Purple => "purple",
            HueBand::Magenta => "magenta",
        }
    }
}

impl fmt::Display for HueBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Hue/saturation/lightness offsets for one band.
///
/// `h` is in degrees. `s` and `l` are relative changes: a magnitude up to 1
/// is a fraction (`-0.5` halves), anything larger is a percentage (`-50`
/// also halves).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HslOffset {
    /// Hue shift in degrees.
    pub h: f64,
    /// Relative saturation change.
    pub s: f64,
    /// Relative lightness change.
    pub l: f64,
}

impl HslOffset {
    /// Creates an offset.
    pub const fn new(h: f64, s: f64, l: f64) -> Self {
        Self { h, s, l }
    }

    /// Returns `true` if all three offsets are zero.
    pub fn is_zero(&self) -> bool {
        self.h == 0.0 && self.s == 0.0 && self.l == 0.0
    }
}

impl fmt::Display for HslOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "h{}/s{}/l{}", self.h, self.s, self.l)
    }
}

/// Offsets for all eight bands.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectiveColorSpec {
    /// Red band.
    pub red: HslOffset,
    /// Orange band.
    pub orange: HslOffset,
    /// Yellow band.
    pub yellow: HslOffset,
    /// Green band.
    pub green: HslOffset,
    /// Aqua band.
    #[serde(alias = "cyan")]
    pub aqua: HslOffset,
    /// Blue band.
    pub blue: HslOffset,
    /// Purple band.
    pub purple: HslOffset,
    /// Magenta band.
    pub magenta: HslOffset,
}

impl SelectiveColorSpec {
    /// Offset for `band`.
    pub fn get(&self, band: HueBand) -> &HslOffset {
        match band {
            HueBand::Red => &self.red,
            HueBand::Orange => &self.orange,
            HueBand::Yellow => &self.yellow,
            HueBand::Green => &self.green,
            HueBand::Aqua => &self.aqua,
            HueBand::Blue => &self.blue,
            HueBand::Purple => &self.purple,
            HueBand::Magenta => &self.magenta,
        }
    }

    /// Mutable offset for `band`.
    pub fn get_mut(&mut self, band: HueBand) -> &mut HslOffset {
        match band {
            HueBand::Red => &mut self.red,
            HueBand::Orange => &mut self.orange,
            HueBand::Yellow => &mut self.yellow,
            HueBand::Green => &mut self.green,
            HueBand::Aqua => &mut self.aqua,
            HueBand::Blue => &mut self.blue,
            HueBand::Purple => &mut self.purple,
            HueBand::Magenta => &mut self.magenta,
        }
    }

    /// Builder-style setter.
    pub fn with(mut self, band: HueBand, offset: HslOffset) -> Self {
        *self.get_mut(band) = offset;
        self
    }

    /// Returns `true` if every band offset is zero.
    pub fn is_identity(&self) -> bool {
        HueBand::ALL.iter().all(|&b| self.get(b).is_zero())
    }
}

/// Applies a relative saturation/lightness offset.
///
/// ```rust
/// use retouch_ops::selective::scale_component;
///
/// assert_eq!(scale_component(0.5, -0.5), 0.25);
/// assert_eq!(scale_component(0.5, -50.0), 0.25);
/// assert_eq!(scale_component(0.8, 1.0), 1.0);
/// ```
pub fn scale_component(v: f64, offset: f64) -> f64 {
    let pct = if offset.abs() <= 1.0 { offset * 100.0 } else { offset };
    (v * (1.0 + pct / 100.0)).clamp(0.0, 1.0)
}

/// Adjusts one pixel. Alpha passes through.
pub fn adjust_pixel(px: [u8; 4], spec: &SelectiveColorSpec) -> [u8; 4] {
    let [r, g, b, a] = px;
    let (h, s, l) = rgb_to_hsl(r, g, b);
    if s <= 0.0 {
        return px;
    }

    let deg = h * 360.0;
    let band = HueBand::classify(deg);
    let off = spec.get(band);
    if off.is_zero() {
        return px;
    }

    let s2 = scale_component(s, off.s);
    let l2 = scale_component(l, off.l);
    let target = if off.h != 0.0 {
        band.shift_hue(deg, off.h)
    } else {
        deg
    };

    match settle_in_band(band, target, s2, l2) {
        Some((nr, ng, nb)) => [nr, ng, nb, a],
        None => px,
    }
}

/// Converts `(target, s, l)` to bytes, nudging the hue 1° at a time toward
/// the band centre until the quantized color still classifies into `band`.
fn settle_in_band(band: HueBand, target: f64, s: f64, l: f64) -> Option<(u8, u8, u8)> {
    let (start, end) = band.unwrapped_range();
    let center = (start + end) / 2.0;
    let mut t = target;
    if band.wraps() && t < start {
        t += 360.0;
    }

    for _ in 0..=band.width() as usize {
        let rgb = hsl_to_rgb(t.rem_euclid(360.0) / 360.0, s, l);
        let (h2, s2, _) = rgb_to_hsl(rgb.0, rgb.1, rgb.2);
        if s2 <= 0.0 || HueBand::classify(h2 * 360.0) == band {
            return Some(rgb);
        }
        let gap = center - t;
        t = if gap.abs() <= 1.0 { center } else { t + gap.signum() };
    }
    None
}

/// Applies band offsets to every pixel in place.
pub fn apply_selective_color(raster: &mut Raster, spec: &SelectiveColorSpec) {
    trace!(width = raster.width(), height = raster.height(), "selective color");
    if spec.is_identity() {
        return;
    }
    map_pixels(raster, |px| adjust_pixel(px, spec));
}
