//! End-to-end pipeline behavior on synthetic rasters.

use retouch_core::color::rgb_to_hsl;
use retouch_core::Raster;
use retouch_ops::convolve::{apply_convolution, Kernel};
use retouch_ops::curves::{build_lut, CurvePoint};
use retouch_ops::grading::GradingZone;
use retouch_ops::selective::{HslOffset, HueBand, SelectiveColorSpec};
use retouch_ops::{EffectParams, Histogram, Mask, PixelPipeline, Stage};

/// Deterministic colorful test image with a few transparent pixels.
fn gradient(width: u32, height: u32) -> Raster {
    let mut r = Raster::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let red = (x * 255 / width.max(1)) as u8;
            let green = (y * 255 / height.max(1)) as u8;
            let blue = ((x * 7 + y * 13) % 256) as u8;
            let alpha = if (x + y) % 11 == 0 { 0 } else { 255 };
            r.set_pixel(x, y, [red, green, blue, alpha]);
        }
    }
    r
}

#[test]
fn test_identity_on_defaults() {
    let src = gradient(37, 23);
    let (out, report) = PixelPipeline::run_with_report(&src, &EffectParams::default());
    assert!(report.is_passthrough());
    assert_eq!(out.pixels(), src.pixels());
}

#[test]
fn test_slider_round_trip_reproduces_source() {
    let src = gradient(24, 24);
    let baseline = PixelPipeline::run(&src, &EffectParams::default());

    let tweaks: [fn(&mut EffectParams); 12] = [
        |p| p.blur = 3,
        |p| p.gaussian = 4,
        |p| p.sharpen = 1.5,
        |p| p.clarity = 40.0,
        |p| p.threshold_white = 100,
        |p| p.threshold_black = 30,
        |p| p.contrast = -35.0,
        |p| p.tone.vibrance = 0.6,
        |p| p.tone.dehaze = 15.0,
        |p| p.selective.blue.s = -0.5,
        |p| p.curves.master = vec![CurvePoint::new(0.0, 20.0), CurvePoint::new(255.0, 235.0)],
        |p| p.grading.midtones = GradingZone::new(30.0, 0.5, 0.5),
    ];

    for tweak in &tweaks {
        let mut params = EffectParams::default();
        tweak(&mut params);
        let moved = PixelPipeline::run(&src, &params);
        assert_ne!(moved, baseline, "tweak had no effect: {params:?}");

        // Back to default: the pipeline always restarts from the pristine source.
        let restored = PixelPipeline::run(&src, &EffectParams::default());
        assert_eq!(restored, baseline);
        assert!(EffectParams::default().diff(&params).len() == 1);
    }
}

#[test]
fn test_identity_curve_lut() {
    let lut = build_lut(&[CurvePoint::new(0.0, 0.0), CurvePoint::new(255.0, 255.0)]);
    for x in 0..256 {
        assert_eq!(lut[x], x as u8);
    }
}

#[test]
fn test_red_band_hue_containment() {
    // Saturated reds spread across the whole 345..15 band.
    let mut src = Raster::new(64, 1);
    for x in 0..64u32 {
        let t = x as f64 / 63.0;
        let deg = 345.0 + 30.0 * t;
        let (r, g, b) = retouch_core::color::hsl_to_rgb(deg / 360.0, 0.4 + 0.6 * t, 0.3 + 0.4 * t);
        src.set_pixel(x, 0, [r, g, b, 255]);
    }

    for shift in [-180.0, -30.0, -5.0, 0.0, 7.0, 60.0, 400.0] {
        for (s, l) in [(0.0, 0.0), (0.5, -0.3), (-0.9, 0.4)] {
            let spec = SelectiveColorSpec::default().with(HueBand::Red, HslOffset::new(shift, s, l));
            let params = EffectParams {
                selective: spec,
                ..Default::default()
            };
            let out = PixelPipeline::run(&src, &params);

            for x in 0..64 {
                let [r0, g0, b0, _] = src.pixel(x, 0);
                let (h0, s0, _) = rgb_to_hsl(r0, g0, b0);
                if s0 == 0.0 || HueBand::classify(h0 * 360.0) != HueBand::Red {
                    continue;
                }
                let [r, g, b, _] = out.pixel(x, 0);
                let (h, sat, _) = rgb_to_hsl(r, g, b);
                assert!(
                    sat == 0.0 || HueBand::classify(h * 360.0) == HueBand::Red,
                    "shift {shift} pushed x={x} to {}deg",
                    h * 360.0
                );
            }
        }
    }
}

#[test]
fn test_box_kernel_sum_and_flat_interior() {
    for size in [1, 3, 5, 7, 9, 11, 13, 15] {
        let k = Kernel::box_blur(size);
        assert!((k.sum() - 1.0).abs() < 1e-9);

        let mut r = Raster::filled(24, 24, [77, 150, 210, 255]);
        apply_convolution(&mut r, &k);
        let rad = k.radius() as u32;
        for y in rad..24 - rad {
            for x in rad..24 - rad {
                assert_eq!(r.pixel(x, y), [77, 150, 210, 255]);
            }
        }
        if rad > 0 {
            assert!(r.pixel(0, 0)[0] < 77, "border should attenuate");
        }
    }
}

#[test]
fn test_threshold_white_240() {
    let mut src = Raster::filled(3, 1, [250, 250, 250, 255]);
    src.set_pixel(1, 0, [230, 230, 230, 255]);
    src.set_pixel(2, 0, [250, 239, 250, 255]);
    let params = EffectParams {
        threshold_white: 240,
        ..Default::default()
    };
    let (out, report) = PixelPipeline::run_with_report(&src, &params);
    assert_eq!(report.stages, vec![Stage::ThresholdWhite]);
    assert_eq!(out.pixel(0, 0), [250, 250, 250, 0]);
    assert_eq!(out.pixel(1, 0), [230, 230, 230, 255]);
    assert_eq!(out.pixel(2, 0), [250, 239, 250, 255]);
}

#[test]
fn test_threshold_runs_before_tonal_stages() {
    // Brightness would lift 230 above the threshold; threshold must not see it.
    let src = Raster::filled(2, 2, [230, 230, 230, 255]);
    let params = EffectParams {
        threshold_white: 240,
        brightness: 20.0,
        ..Default::default()
    };
    let out = PixelPipeline::run(&src, &params);
    assert_eq!(out.pixel(0, 0), [250, 250, 250, 255]);
}

#[test]
fn test_masked_run() {
    let src = gradient(16, 16);
    let params = EffectParams {
        brightness: 50.0,
        ..Default::default()
    };

    let none = PixelPipeline::run_masked(&src, &params, &Mask::empty(16, 16)).unwrap();
    assert_eq!(none, src);

    let all = PixelPipeline::run_masked(&src, &params, &Mask::full(16, 16)).unwrap();
    assert_eq!(all, PixelPipeline::run(&src, &params));

    let half = Mask::rect(16, 16, 0, 0, 8, 16);
    let out = PixelPipeline::run_masked(&src, &params, &half).unwrap();
    let full = PixelPipeline::run(&src, &params);
    assert_eq!(out.pixel(3, 5), full.pixel(3, 5));
    assert_eq!(out.pixel(12, 5), src.pixel(12, 5));

    let err = PixelPipeline::run_masked(&src, &params, &Mask::full(16, 15)).unwrap_err();
    assert!(err.is_dimension_mismatch());
}

#[test]
fn test_histogram_counts_opaque_pixels() {
    let src = gradient(20, 10);
    let opaque = src.pixels().chunks_exact(4).filter(|p| p[3] != 0).count() as u64;
    let h = Histogram::from_raster(&src);
    assert_eq!(h.total(), opaque);
    assert_eq!(h.luma.iter().map(|&c| c as u64).sum::<u64>(), opaque);
    assert_eq!(h.blue.iter().map(|&c| c as u64).sum::<u64>(), opaque);
}

#[test]
fn test_run_is_deterministic() {
    let src = gradient(40, 30);
    let params = EffectParams {
        gaussian: 2,
        sharpen: 0.7,
        contrast: 25.0,
        tone: retouch_ops::tone::ToneSpec {
            highlights: -10.0,
            saturation: 0.2,
            ..Default::default()
        },
        selective: SelectiveColorSpec::default().with(HueBand::Blue, HslOffset::new(-20.0, 0.3, 0.0)),
        grading: retouch_ops::grading::GradingSpec {
            shadows: GradingZone::new(210.0, 0.6, 0.5),
            temperature: 0.3,
            ..Default::default()
        },
        ..Default::default()
    };
    let a = PixelPipeline::run(&src, &params);
    let b = PixelPipeline::run(&src, &params);
    assert_eq!(a, b);
    assert_eq!(a.dimensions(), src.dimensions());
}
