//! The full adjustment state handed to the pipeline.
//!
//! [`EffectParams`] is a plain typed record: every field is named and has a
//! default that makes its stage a no-op. It serializes with serde and
//! missing fields fall back to defaults, so partial YAML/JSON files work:
//!
//! ```rust
//! use retouch_ops::EffectParams;
//!
//! let p: EffectParams = serde_json::from_str(r#"{"blur": 2, "tone": {"vibrance": 0.3}}"#).unwrap();
//! assert_eq!(p.blur, 2);
//! assert_eq!(p.threshold_white, 255);
//! ```
//!
//! [`EffectParams::diff`] lists changed fields for history labels.

use crate::curves::CurveSpec;
use crate::grading::GradingSpec;
use crate::selective::{HueBand, SelectiveColorSpec};
use crate::threshold::{BLACK_OFF, WHITE_OFF};
use crate::tone::ToneSpec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Every pipeline setting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectParams {
    /// Box blur radius; 0 disables.
    pub blur: u32,
    /// Gaussian blur radius; 0 disables.
    pub gaussian: u32,
    /// Sharpen amount; 0 disables.
    pub sharpen: f64,
    /// Fine local contrast, `-100..=100`.
    pub texture: f64,
    /// Mid-frequency local contrast, `-100..=100`.
    pub clarity: f64,
    /// Alpha knock-out above this level; 255 disables.
    pub threshold_white: u8,
    /// Alpha knock-out below this level; 0 disables.
    pub threshold_black: u8,
    /// `-100..=100`.
    pub brightness: f64,
    /// `-100..=100`.
    pub contrast: f64,
    /// Zone tone controls.
    pub tone: ToneSpec,
    /// Per-hue-band offsets.
    pub selective: SelectiveColorSpec,
    /// Tone curves.
    pub curves: CurveSpec,
    /// Color grading.
    pub grading: GradingSpec,
}

impl Default for EffectParams {
    fn default() -> Self {
        Self {
            blur: 0,
            gaussian: 0,
            sharpen: 0.0,
            texture: 0.0,
            clarity: 0.0,
            threshold_white: WHITE_OFF,
            threshold_black: BLACK_OFF,
            brightness: 0.0,
            contrast: 0.0,
            tone: ToneSpec::default(),
            selective: SelectiveColorSpec::default(),
            curves: CurveSpec::default(),
            grading: GradingSpec::default(),
        }
    }
}

/// One changed field: dotted path plus new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamChange {
    /// Dotted field path, e.g. `tone.vibrance`.
    pub field: String,
    /// New value, rendered for display.
    pub value: String,
}

impl ParamChange {
    /// Creates a change record.
    pub fn new(field: impl Into<String>, value: impl fmt::Display) -> Self {
        Self {
            field: field.into(),
            value: value.to_string(),
        }
    }
}

impl fmt::Display for ParamChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.field, self.value)
    }
}

/// Joins changes as `field=value, field=value`.
pub fn change_label(changes: &[ParamChange]) -> String {
    changes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

macro_rules! diff_fields {
    ($out:ident, $old:expr, $new:expr, $prefix:literal, [$($field:ident),* $(,)?]) => {
        $(
            if $old.$field != $new.$field {
                $out.push(ParamChange::new(
                    concat!($prefix, stringify!($field)),
                    &$new.$field,
                ));
            }
        )*
    };
}

struct PointsLabel<'a>(&'a [crate::curves::CurvePoint]);

impl fmt::Display for PointsLabel<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("identity");
        }
        write!(f, "[{} pts]", self.0.len())
    }
}

impl EffectParams {
    /// Returns `true` if running these params cannot change any pixel.
    pub fn is_identity(&self) -> bool {
        crate::pipeline::PixelPipeline::active_stages(self).is_empty()
    }

    /// Field-by-field changes from `self` to `newer`, in declaration order.
    ///
    /// ```rust
    /// use retouch_ops::EffectParams;
    ///
    /// let old = EffectParams::default();
    /// let mut new = old.clone();
    /// new.blur = 3;
    /// new.tone.vibrance = 25.0;
    /// let labels: Vec<String> = old.diff(&new).iter().map(|c| c.to_string()).collect();
    /// assert_eq!(labels, ["blur=3", "tone.vibrance=25"]);
    /// ```
    pub fn diff(&self, newer: &EffectParams) -> Vec<ParamChange> {
        let mut out = Vec::new();

        diff_fields!(out, self, newer, "", [
            blur, gaussian, sharpen, texture, clarity,
            threshold_white, threshold_black, brightness, contrast,
        ]);
        diff_fields!(out, self.tone, newer.tone, "tone.", [
            highlights, shadows, whites, blacks, vibrance, saturation, dehaze,
        ]);

        for band in HueBand::ALL {
            let (a, b) = (self.selective.get(band), newer.selective.get(band));
            if a != b {
                out.push(ParamChange::new(format!("selective.{band}"), b));
            }
        }

        let channels = [
            ("master", &self.curves.master, &newer.curves.master),
            ("red", &self.curves.red, &newer.curves.red),
            ("green", &self.curves.green, &newer.curves.green),
            ("blue", &self.curves.blue, &newer.curves.blue),
        ];
        for (name, a, b) in channels {
            if a != b {
                out.push(ParamChange::new(format!("curves.{name}"), PointsLabel(b)));
            }
        }

        diff_fields!(out, self.grading, newer.grading, "grading.", [
            shadows, midtones, highlights, blending, balance, temperature, tint,
        ]);

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curves::CurvePoint;
    use crate::grading::GradingZone;
    use crate::selective::HslOffset;

    #[test]
    fn test_default_is_identity() {
        assert!(EffectParams::default().is_identity());
    }

    #[test]
    fn test_diff_empty_when_equal() {
        let p = EffectParams::default();
        assert!(p.diff(&p.clone()).is_empty());
    }

    #[test]
    fn test_diff_nested_fields() {
        let old = EffectParams::default();
        let mut new = old.clone();
        new.threshold_white = 240;
        new.selective.red = HslOffset::new(10.0, 0.0, 0.0);
        new.curves.green = vec![CurvePoint::new(0.0, 0.0), CurvePoint::new(255.0, 200.0)];
        new.grading.shadows = GradingZone::new(220.0, 0.4, 0.5);

        let changes = old.diff(&new);
        let fields: Vec<&str> = changes.iter().map(|c| c.field.as_str()).collect();
        assert_eq!(
            fields,
            ["threshold_white", "selective.red", "curves.green", "grading.shadows"]
        );
    }

    #[test]
    fn test_change_label() {
        let old = EffectParams::default();
        let mut new = old.clone();
        new.brightness = 12.5;
        new.grading.temperature = -0.2;
        assert_eq!(
            change_label(&old.diff(&new)),
            "brightness=12.5, grading.temperature=-0.2"
        );
    }

    #[test]
    fn test_partial_yaml_like_json() {
        let p: EffectParams =
            serde_json::from_str(r#"{"selective": {"green": {"s": -0.5}}, "grading": {"tint": 0.1}}"#)
                .unwrap();
        assert_eq!(p.selective.green.s, -0.5);
        assert_eq!(p.grading.blending, 1.0);
        assert_eq!(p.grading.tint, 0.1);
        assert_eq!(p.threshold_black, 0);
    }
}
