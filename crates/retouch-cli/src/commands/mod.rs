//! CLI command implementations

pub mod apply;
pub mod batch;
pub mod curve;
pub mod histogram;
pub mod params;

use crate::ParamOverrides;
use anyhow::{Context, Result};
use image::{DynamicImage, ImageFormat, RgbaImage};
use retouch_core::Raster;
use retouch_editor::EditorConfig;
use retouch_ops::{curves, EffectParams, Mask};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Load image from path as RGBA8
pub fn load_image(path: &Path) -> Result<Raster> {
    let rgba = image::open(path)
        .with_context(|| format!("Failed to load: {}", path.display()))?
        .to_rgba8();
    let (width, height) = rgba.dimensions();
    Raster::from_pixels(width, height, rgba.into_raw())
        .with_context(|| format!("Failed to load: {}", path.display()))
}

/// Save image to path; the format follows the extension.
///
/// JPEG has no alpha, so it is dropped for `.jpg`/`.jpeg` outputs.
pub fn save_image(path: &Path, raster: &Raster) -> Result<()> {
    let (width, height) = raster.dimensions();
    let rgba = RgbaImage::from_raw(width, height, raster.pixels().to_vec())
        .context("Raster buffer does not match its dimensions")?;
    let image = DynamicImage::ImageRgba8(rgba);
    let saved = match ImageFormat::from_path(path) {
        Ok(ImageFormat::Jpeg) => image.to_rgb8().save(path),
        _ => image.save(path),
    };
    saved.with_context(|| format!("Failed to save: {}", path.display()))
}

/// Load a grayscale mask; it must match the image it is applied to.
pub fn load_mask(path: &Path) -> Result<Mask> {
    let luma = image::open(path)
        .with_context(|| format!("Failed to load mask: {}", path.display()))?
        .to_luma8();
    let (width, height) = luma.dimensions();
    Ok(Mask::from_data(width, height, luma.into_raw())?)
}

/// Read params from YAML or JSON; `None` gives the defaults.
pub fn load_params(path: Option<&Path>) -> Result<EffectParams> {
    let Some(path) = path else {
        return Ok(EffectParams::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read params: {}", path.display()))?;
    let is_json = path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    let params = if is_json {
        serde_json::from_str(&text)
            .with_context(|| format!("Invalid params JSON: {}", path.display()))?
    } else {
        serde_yaml::from_str(&text)
            .with_context(|| format!("Invalid params YAML: {}", path.display()))?
    };
    debug!(path = %path.display(), "Loaded params");
    Ok(params)
}

/// Read and validate the editor config; `None` gives the defaults.
pub fn load_config(path: Option<&Path>) -> Result<EditorConfig> {
    let config = match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            serde_yaml::from_str::<EditorConfig>(&text)
                .with_context(|| format!("Invalid config: {}", path.display()))?
        }
        None => EditorConfig::default(),
    };
    config.validate().context("Invalid editor config")?;
    Ok(config)
}

/// Params file plus flag overrides.
pub fn resolve_params(path: Option<&Path>, overrides: &ParamOverrides) -> Result<EffectParams> {
    let mut params = load_params(path)?;
    apply_overrides(&mut params, overrides)?;
    Ok(params)
}

/// Layer command-line flags over loaded params.
pub fn apply_overrides(params: &mut EffectParams, o: &ParamOverrides) -> Result<()> {
    if let Some(v) = o.blur {
        params.blur = v;
    }
    if let Some(v) = o.gaussian {
        params.gaussian = v;
    }
    if let Some(v) = o.sharpen {
        params.sharpen = v;
    }
    if let Some(v) = o.texture {
        params.texture = v;
    }
    if let Some(v) = o.clarity {
        params.clarity = v;
    }
    if let Some(v) = o.brightness {
        params.brightness = v;
    }
    if let Some(v) = o.contrast {
        params.contrast = v;
    }
    if let Some(v) = o.vibrance {
        params.tone.vibrance = v;
    }
    if let Some(v) = o.saturation {
        params.tone.saturation = v;
    }
    if let Some(v) = o.threshold_white {
        params.threshold_white = v;
    }
    if let Some(v) = o.threshold_black {
        params.threshold_black = v;
    }
    if let Some(points) = &o.curve {
        params.curves.master = curves::parse_points(points)
            .with_context(|| format!("Invalid --curve: {points}"))?;
    }
    Ok(())
}
