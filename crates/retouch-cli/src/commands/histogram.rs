//! Histogram command

use crate::HistogramArgs;
use anyhow::{Result, bail};
use retouch_ops::Histogram;
use serde_json::json;
use tracing::trace;

/// Width of the longest bar in the text view.
const BAR_WIDTH: usize = 40;

pub fn run(args: HistogramArgs, verbose: u8) -> Result<()> {
    trace!(input = %args.input.display(), "histogram::run");
    if args.buckets == 0 || args.buckets > 256 {
        bail!("--buckets must be between 1 and 256, got {}", args.buckets);
    }

    let raster = super::load_image(&args.input)?;
    let hist = Histogram::from_raster(&raster);

    if args.json {
        let doc = json!({
            "file": args.input.display().to_string(),
            "width": raster.width(),
            "height": raster.height(),
            "pixels": hist.total(),
            "red": hist.red.to_vec(),
            "green": hist.green.to_vec(),
            "blue": hist.blue.to_vec(),
            "luma": hist.luma.to_vec(),
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    println!("{}", args.input.display());
    println!("  Resolution: {}x{}", raster.width(), raster.height());
    println!("  Counted:    {} opaque pixels", hist.total());
    for (name, bins) in [
        ("Red", &hist.red),
        ("Green", &hist.green),
        ("Blue", &hist.blue),
        ("Luma", &hist.luma),
    ] {
        match Histogram::mean(bins) {
            Some(mean) => println!("  {name:<6} mean {mean:.2}"),
            None => println!("  {name:<6} mean -"),
        }
        if verbose > 0 || name == "Luma" {
            print_bars(bins, args.buckets);
        }
    }
    Ok(())
}

/// Sums 256 bins into `buckets` groups of near-equal width.
fn bucketize(bins: &[u32; 256], buckets: usize) -> Vec<u64> {
    let mut out = vec![0u64; buckets];
    for (level, &count) in bins.iter().enumerate() {
        out[level * buckets / 256] += count as u64;
    }
    out
}

fn print_bars(bins: &[u32; 256], buckets: usize) {
    let grouped = bucketize(bins, buckets);
    let peak = grouped.iter().copied().max().unwrap_or(0).max(1);
    for (i, count) in grouped.iter().enumerate() {
        let lo = i * 256 / buckets;
        let hi = (i + 1) * 256 / buckets - 1;
        let len = (*count as usize * BAR_WIDTH).div_ceil(peak as usize);
        println!("    {lo:>3}-{hi:<3} {:<width$} {count}", "#".repeat(len), width = BAR_WIDTH);
    }
}
