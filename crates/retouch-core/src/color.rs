//! RGB <-> HSL conversion and luma weighting.
//!
//! Pure functions with no state. Inputs are 8-bit channel values, so there
//! are no error conditions: every byte triple maps to a valid HSL triple and
//! every HSL triple (after hue wrapping and clamping) maps back to bytes.
//!
//! Hue is fractional, `[0, 1)`. Multiply by 360 for degrees.

/// Red weight of the perceptual luma sum.
pub const LUMA_R: f64 = 0.299;
/// Green weight of the perceptual luma sum.
pub const LUMA_G: f64 = 0.587;
/// Blue weight of the perceptual luma sum.
pub const LUMA_B: f64 = 0.114;

const EPSILON: f64 = 1e-12;

/// Perceptual luma on whatever scale the inputs use (0..255 for bytes).
#[inline]
pub fn luma(r: f64, g: f64, b: f64) -> f64 {
    LUMA_R * r + LUMA_G * g + LUMA_B * b
}

/// Converts 8-bit RGB to HSL.
///
/// Returns `(h, s, l)` with `h` in `[0, 1)` and `s`, `l` in `[0, 1]`.
/// Achromatic input (`r == g == b`) yields `h = 0, s = 0`.
///
/// ```rust
/// use retouch_core::color::rgb_to_hsl;
///
/// let (h, s, l) = rgb_to_hsl(0, 0, 255);
/// assert!((h - 2.0 / 3.0).abs() < 1e-9);
/// assert!((s - 1.0).abs() < 1e-9);
/// assert!((l - 0.5).abs() < 1e-9);
/// ```
pub fn rgb_to_hsl(r: u8, g: u8, b: u8) -> (f64, f64, f64) {
    let r = r as f64 / 255.0;
    let g = g as f64 / 255.0;
    let b = b as f64 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;

    let d = max - min;
    if d.abs() < EPSILON {
        return (0.0, 0.0, l);
    }

    let s = if l > 0.5 {
        d / (2.0 - max - min)
    } else {
        d / (max + min)
    };

    let h = if max == r {
        let mut h = (g - b) / d;
        if h < 0.0 {
            h += 6.0;
        }
        h
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };

    let h = h / 6.0;
    // (g - b) / d can land on exactly 6.0 after the wrap
    let h = if h >= 1.0 { h - 1.0 } else { h };
    (h, s, l)
}

/// Converts HSL back to 8-bit RGB, rounding to nearest.
///
/// `h` is wrapped into `[0, 1)`; `s` and `l` are clamped to `[0, 1]`.
///
/// ```rust
/// use retouch_core::color::hsl_to_rgb;
///
/// assert_eq!(hsl_to_rgb(0.0, 1.0, 0.5), (255, 0, 0));
/// assert_eq!(hsl_to_rgb(0.25, 0.0, 0.5), (128, 128, 128));
/// ```
pub fn hsl_to_rgb(h: f64, s: f64, l: f64) -> (u8, u8, u8) {
    let (r, g, b) = hsl_to_rgb_f64(h, s, l);
    (to_byte(r * 255.0), to_byte(g * 255.0), to_byte(b * 255.0))
}

/// Unquantized HSL -> RGB with channels in `[0, 1]`.
pub fn hsl_to_rgb_f64(h: f64, s: f64, l: f64) -> (f64, f64, f64) {
    let h = h.rem_euclid(1.0);
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);

    if s < EPSILON {
        return (l, l, l);
    }

    let q = if l < 0.5 {
        l * (1.0 + s)
    } else {
        l + s - l * s
    };
    let p = 2.0 * l - q;

    (
        hue_to_rgb(p, q, h + 1.0 / 3.0),
        hue_to_rgb(p, q, h),
        hue_to_rgb(p, q, h - 1.0 / 3.0),
    )
}

fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        return p + (q - p) * 6.0 * t;
    }
    if t < 1.0 / 2.0 {
        return q;
    }
    if t < 2.0 / 3.0 {
        return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
    }
    p
}

/// Rounds and clamps a float channel value to a byte.
#[inline]
pub fn to_byte(v: f64) -> u8 {
    if v.is_nan() {
        return 0;
    }
    v.round().clamp(0.0, 255.0) as u8
}
