//! Batch command: one look applied to every file matching a glob.
//!
//! Files are rendered inline, in parallel across the rayon pool.

use crate::BatchArgs;
use anyhow::{Context, Result, bail};
use rayon::prelude::*;
use retouch_ops::{EffectParams, PixelPipeline};
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace};

pub fn run(args: BatchArgs, verbose: u8) -> Result<()> {
    trace!(pattern = %args.input, "batch::run");

    let files: Vec<PathBuf> = glob::glob(&args.input)
        .with_context(|| format!("Invalid pattern: {}", args.input))?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file())
        .collect();

    if files.is_empty() {
        bail!("No files match pattern: {}", args.input);
    }

    let params = super::resolve_params(args.params.as_deref(), &args.overrides)?;
    info!(files = files.len(), pattern = %args.input, "Starting batch processing");
    if verbose > 0 {
        println!("Found {} files matching '{}'", files.len(), args.input);
    }

    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Failed to create: {}", args.output_dir.display()))?;

    let results: Vec<Result<()>> = files
        .par_iter()
        .map(|input| {
            process_file(input, &args.output_dir, &params, args.format.as_deref(), verbose)
        })
        .collect();

    let mut success = 0;
    let mut failed = 0;
    for r in results {
        match r {
            Ok(()) => success += 1,
            Err(e) => {
                failed += 1;
                eprintln!("Error: {e:#}");
            }
        }
    }

    info!(success, failed, "Batch processing complete");
    println!("Processed: {success} success, {failed} failed");

    if failed > 0 {
        bail!("{failed} files failed");
    }
    Ok(())
}

/// Output path: same stem in `output_dir`, optionally a new extension.
fn output_path(input: &Path, output_dir: &Path, format: Option<&str>) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let ext = format.unwrap_or_else(|| {
        input
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("png")
    });
    output_dir.join(format!("{stem}.{ext}"))
}

fn process_file(
    input: &Path,
    output_dir: &Path,
    params: &EffectParams,
    format: Option<&str>,
    verbose: u8,
) -> Result<()> {
    let output = output_path(input, output_dir, format);
    if verbose > 0 {
        println!("Processing {} -> {}", input.display(), output.display());
    }

    let source = super::load_image(input)?;
    let (result, report) = PixelPipeline::run_with_report(&source, params);
    debug!(file = %input.display(), stages = report.stages.len(), "Rendered");
    super::save_image(&output, &result)
}
