//! Apply command: one image through the pipeline.
//!
//! Goes through [`EffectsOrchestrator`] so the worker path, timeout and
//! inline fallback are the same ones the editor uses. With `--mask` the
//! render runs inline through [`PixelPipeline::run_masked`].

use crate::ApplyArgs;
use anyhow::{Context, Result, bail};
use retouch_core::Raster;
use retouch_editor::{ApplyOutcome, EditorConfig, EffectsOrchestrator};
use retouch_ops::{EffectParams, PixelPipeline};
use tracing::{info, trace};

pub fn run(args: ApplyArgs, verbose: u8, mut config: EditorConfig) -> Result<()> {
    trace!(input = %args.input.display(), "apply::run");

    let source = super::load_image(&args.input)?;
    let params = super::resolve_params(args.params.as_deref(), &args.overrides)?;

    if verbose > 0 {
        let stages = PixelPipeline::active_stages(&params);
        if stages.is_empty() {
            println!("No active stages; output equals input");
        } else {
            let names: Vec<&str> = stages.iter().map(|s| s.name()).collect();
            println!("Stages: {}", names.join(" -> "));
        }
    }

    let result = match &args.mask {
        Some(mask_path) => {
            let mask = super::load_mask(mask_path)?;
            PixelPipeline::run_masked(&source, &params, &mask)
                .with_context(|| format!("Mask does not fit: {}", mask_path.display()))?
        }
        None => {
            if args.sync {
                config.use_worker = false;
            }
            render(source, params, config)?
        }
    };

    super::save_image(&args.output, &result)?;
    info!(output = %args.output.display(), "Wrote result");
    if verbose > 0 {
        println!("Wrote {}", args.output.display());
    }
    Ok(())
}

/// Runs one apply on a private runtime and returns the rendered raster.
fn render(source: Raster, params: EffectParams, config: EditorConfig) -> Result<Raster> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(async move {
        let editor = EffectsOrchestrator::new(config)?;
        editor.load_image(source);
        match editor.apply(params).await {
            Ok(ApplyOutcome::Applied { .. }) => {}
            Ok(ApplyOutcome::Superseded) => bail!("Render was superseded"),
            Err(e) => bail!("{}", e.user_message()),
        }
        editor.result().context("Editor returned no result")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ParamOverrides;
    use tempfile::tempdir;

    fn write_source(dir: &std::path::Path) -> std::path::PathBuf {
        let path = dir.join("in.png");
        super::super::save_image(&path, &Raster::filled(6, 4, [100, 100, 100, 255])).unwrap();
        path
    }

    fn args(input: std::path::PathBuf, output: std::path::PathBuf) -> ApplyArgs {
        ApplyArgs {
            input,
            output,
            params: None,
            mask: None,
            sync: false,
            overrides: ParamOverrides {
                brightness: Some(20.0),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_apply_through_worker_and_sync() {
        let dir = tempdir().unwrap();
        let input = write_source(dir.path());

        for sync in [false, true] {
            let output = dir.path().join(format!("out_{sync}.png"));
            let mut a = args(input.clone(), output.clone());
            a.sync = sync;
            run(a, 0, EditorConfig::default()).unwrap();
            let out = super::super::load_image(&output).unwrap();
            assert_eq!(out.pixel(3, 2), [120, 120, 120, 255]);
        }
    }

    #[test]
    fn test_apply_with_mask() {
        let dir = tempdir().unwrap();
        let input = write_source(dir.path());

        let mut mask = image::GrayImage::new(6, 4);
        mask.put_pixel(0, 0, image::Luma([255]));
        let mask_path = dir.path().join("mask.png");
        mask.save(&mask_path).unwrap();

        let output = dir.path().join("masked.png");
        let mut a = args(input, output.clone());
        a.mask = Some(mask_path);
        run(a, 0, EditorConfig::default()).unwrap();

        let out = super::super::load_image(&output).unwrap();
        assert_eq!(out.pixel(0, 0), [120, 120, 120, 255]);
        assert_eq!(out.pixel(5, 3), [100, 100, 100, 255]);
    }

    #[test]
    fn test_mask_size_mismatch_fails() {
        let dir = tempdir().unwrap();
        let input = write_source(dir.path());
        let mask_path = dir.path().join("small.png");
        image::GrayImage::new(2, 2).save(&mask_path).unwrap();

        let mut a = args(input, dir.path().join("never.png"));
        a.mask = Some(mask_path);
        assert!(run(a, 0, EditorConfig::default()).is_err());
        assert!(!dir.path().join("never.png").exists());
    }
}
