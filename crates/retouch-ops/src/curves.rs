//! Tone curves: control points to 256-entry lookup tables.
//!
//! Curves are monotone cubic Hermite splines (Fritsch–Carlson tangents), so a
//! non-decreasing set of control points always yields a non-decreasing LUT
//! with no overshoot between points.
//!
//! # Composition
//!
//! A [`CurveSpec`] has one master curve and one curve per color channel.
//! [`CurveLuts`] folds them into three tables, `out = channel[master[in]]`,
//! so applying curves costs three lookups per pixel.
//!
//! # Example
//!
//! ```rust
//! use retouch_ops::curves::{build_lut, CurvePoint};
//!
//! let lut = build_lut(&[CurvePoint::new(0.0, 0.0), CurvePoint::new(255.0, 255.0)]);
//! assert!((0..256).all(|i| lut[i] == i as u8));
//! ```

use crate::parallel::map_pixels;
use crate::{OpsError, OpsResult};
use retouch_core::color::to_byte;
use retouch_core::Raster;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{trace, warn};

/// 256-entry byte lookup table.
pub type Lut = [u8; 256];

const MAX_X: f64 = 255.0;

/// A single control point, both coordinates in `0..=255`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CurvePoint {
    /// Input level.
    pub x: f64,
    /// Output level.
    pub y: f64,
}

impl CurvePoint {
    /// Creates a point.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for CurvePoint {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for CurvePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.x, self.y)
    }
}

/// Master plus per-channel curves. Empty lists are identity curves.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveSpec {
    /// Applied to R, G and B before the channel curves.
    pub master: Vec<CurvePoint>,
    /// Red channel curve.
    pub red: Vec<CurvePoint>,
    /// Green channel curve.
    pub green: Vec<CurvePoint>,
    /// Blue channel curve.
    pub blue: Vec<CurvePoint>,
}

impl CurveSpec {
    /// Returns `true` if all four curves map every level to itself.
    pub fn is_identity(&self) -> bool {
        CurveLuts::from_spec(self).is_identity()
    }
}

/// Identity lookup table.
pub fn identity_lut() -> Lut {
    let mut lut = [0u8; 256];
    for (i, v) in lut.iter_mut().enumerate() {
        *v = i as u8;
    }
    lut
}

/// Validates and canonicalizes control points.
///
/// The result is clamped to `[0, 255]`, sorted by x with strictly increasing
/// x (for duplicate x the last point wins) and always starts at x = 0 and
/// ends at x = 255; missing endpoints are synthesized as (0, 0) and
/// (255, 255).
///
/// # Errors
///
/// [`OpsError::InvalidCurveSpec`] for fewer than two points or any
/// non-finite coordinate.
pub fn normalize_points(points: &[CurvePoint]) -> OpsResult<Vec<CurvePoint>> {
    if points.len() < 2 {
        return Err(OpsError::InvalidCurveSpec(format!(
            "need at least 2 points, got {}",
            points.len()
        )));
    }
    if let Some(p) = points.iter().find(|p| !p.x.is_finite() || !p.y.is_finite()) {
        return Err(OpsError::InvalidCurveSpec(format!(
            "non-finite control point ({}, {})",
            p.x, p.y
        )));
    }

    let mut pts: Vec<CurvePoint> = points
        .iter()
        .map(|p| CurvePoint::new(p.x.clamp(0.0, MAX_X), p.y.clamp(0.0, MAX_X)))
        .collect();
    // Stable, so equal x keep input order and the later one survives below.
    pts.sort_by(|a, b| a.x.total_cmp(&b.x));

    let mut out: Vec<CurvePoint> = Vec::with_capacity(pts.len() + 2);
    for p in pts {
        match out.last_mut() {
            Some(last) if last.x == p.x => *last = p,
            _ => out.push(p),
        }
    }

    if out.first().is_some_and(|p| p.x > 0.0) {
        out.insert(0, CurvePoint::new(0.0, 0.0));
    }
    if out.last().is_some_and(|p| p.x < MAX_X) {
        out.push(CurvePoint::new(MAX_X, MAX_X));
    }
    Ok(out)
}

/// Builds a LUT, reporting invalid control points as an error.
pub fn try_build_lut(points: &[CurvePoint]) -> OpsResult<Lut> {
    let pts = normalize_points(points)?;
    let n = pts.len();

    let h: Vec<f64> = pts.windows(2).map(|w| w[1].x - w[0].x).collect();
    let m: Vec<f64> = pts
        .windows(2)
        .zip(&h)
        .map(|(w, &dx)| (w[1].y - w[0].y) / dx)
        .collect();

    let mut tangents = vec![0.0; n];
    tangents[0] = m[0];
    tangents[n - 1] = m[n - 2];
    for i in 1..n - 1 {
        let (m0, m1) = (m[i - 1], m[i]);
        if m0 == 0.0 || m1 == 0.0 || (m0 > 0.0) != (m1 > 0.0) {
            continue;
        }
        let w1 = 2.0 * h[i] + h[i - 1];
        let w2 = h[i] + 2.0 * h[i - 1];
        tangents[i] = (w1 + w2) / (w1 / m0 + w2 / m1);
    }

    let mut lut = [0u8; 256];
    let mut seg = 0;
    for (x, out) in lut.iter_mut().enumerate() {
        let xf = x as f64;
        while seg < n - 2 && xf > pts[seg + 1].x {
            seg += 1;
        }
        let (p0, p1) = (pts[seg], pts[seg + 1]);
        let dx = h[seg];
        let t = ((xf - p0.x) / dx).clamp(0.0, 1.0);

        let t2 = t * t;
        let t3 = t2 * t;
        let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
        let h10 = t3 - 2.0 * t2 + t;
        let h01 = -2.0 * t3 + 3.0 * t2;
        let h11 = t3 - t2;

        let y = h00 * p0.y + h10 * dx * tangents[seg] + h01 * p1.y + h11 * dx * tangents[seg + 1];
        *out = to_byte(y);
    }

    trace!(points = n, "built curve lut");
    Ok(lut)
}

/// Builds a LUT from control points, falling back to the identity LUT (with
/// a warning) when the points are invalid.
pub fn build_lut(points: &[CurvePoint]) -> Lut {
    match try_build_lut(points) {
        Ok(lut) => lut,
        Err(e) => {
            warn!(error = %e, "Invalid curve, using identity");
            identity_lut()
        }
    }
}

fn channel_lut(points: &[CurvePoint]) -> Lut {
    if points.is_empty() {
        identity_lut()
    } else {
        build_lut(points)
    }
}

/// Composed per-channel tables for a [`CurveSpec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurveLuts {
    /// Red output table.
    pub red: Lut,
    /// Green output table.
    pub green: Lut,
    /// Blue output table.
    pub blue: Lut,
}

impl CurveLuts {
    /// Folds master and channel curves: `out_c[i] = channel_c[master[i]]`.
    pub fn from_spec(spec: &CurveSpec) -> Self {
        let master = channel_lut(&spec.master);
        let compose = |points: &[CurvePoint]| {
            let ch = channel_lut(points);
            let mut out = [0u8; 256];
            for (o, &m) in out.iter_mut().zip(master.iter()) {
                *o = ch[m as usize];
            }
            out
        };
        Self {
            red: compose(&spec.red),
            green: compose(&spec.green),
            blue: compose(&spec.blue),
        }
    }

    /// Returns `true` if every table is the identity.
    pub fn is_identity(&self) -> bool {
        let id = identity_lut();
        self.red == id && self.green == id && self.blue == id
    }

    /// Remaps R, G and B in place; alpha is untouched.
    pub fn apply(&self, raster: &mut Raster) {
        trace!(width = raster.width(), height = raster.height(), "curves");
        map_pixels(raster, |[r, g, b, a]| {
            [
                self.red[r as usize],
                self.green[g as usize],
                self.blue[b as usize],
                a,
            ]
        });
    }
}

/// Parses `"x:y,x:y,..."` into control points.
///
/// ```rust
/// use retouch_ops::curves::parse_points;
///
/// let pts = parse_points("0:0, 128:150 ,255:255").unwrap();
/// assert_eq!(pts.len(), 3);
/// assert_eq!(pts[1].y, 150.0);
/// ```
pub fn parse_points(s: &str) -> OpsResult<Vec<CurvePoint>> {
    s.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|pair| {
            let (x, y) = pair.split_once(':').ok_or_else(|| {
                OpsError::InvalidCurveSpec(format!("expected x:y, got '{pair}'"))
            })?;
            let parse = |v: &str| {
                v.trim().parse::<f64>().map_err(|_| {
                    OpsError::InvalidCurveSpec(format!("bad coordinate '{v}' in '{pair}'"))
                })
            };
            Ok(CurvePoint::new(parse(x)?, parse(y)?))
        })
        .collect()
}
