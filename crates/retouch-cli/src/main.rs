//! retouch - headless front end for the retouch pixel pipeline
//!
//! Runs the same adjustment stack the editor uses against image files.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "retouch")]
#[command(author, version, about = "Non-destructive pixel adjustments from the command line")]
#[command(long_about = "
Applies the retouch adjustment pipeline (blur, sharpen, curves, tone,
selective color, grading, thresholds) to image files.

Examples:
  retouch params > look.yaml                     # Dump default params
  retouch apply in.png -o out.png -p look.yaml   # Apply a saved look
  retouch apply in.png -o out.png --vibrance 0.3 --curve 0:0,64:40,255:255
  retouch histogram out.png --json               # Channel histograms
  retouch curve 0:0,128:150,255:255              # Print the LUT
  retouch batch 'shots/*.jpg' -o graded -p look.yaml
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Number of threads (0 = auto)
    #[arg(short = 'j', long, global = true, default_value = "0")]
    threads: usize,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Editor config (YAML): worker timeout, throttle, history limit
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline on one image
    #[command(visible_alias = "a")]
    Apply(ApplyArgs),

    /// Print per-channel histograms
    #[command(visible_alias = "h")]
    Histogram(HistogramArgs),

    /// Print the 256-entry LUT for a curve
    Curve(CurveArgs),

    /// Print the default params
    Params(ParamsArgs),

    /// Apply the same params to many images
    Batch(BatchArgs),
}

/// Individual param overrides layered on top of `--params`.
#[derive(Args, Clone, Debug, Default)]
struct ParamOverrides {
    /// Box blur radius
    #[arg(long)]
    blur: Option<u32>,

    /// Gaussian blur radius
    #[arg(long)]
    gaussian: Option<u32>,

    /// Sharpen amount
    #[arg(long)]
    sharpen: Option<f64>,

    /// Texture (-100..100)
    #[arg(long, allow_hyphen_values = true)]
    texture: Option<f64>,

    /// Clarity (-100..100)
    #[arg(long, allow_hyphen_values = true)]
    clarity: Option<f64>,

    /// Brightness (-100..100)
    #[arg(long, allow_hyphen_values = true)]
    brightness: Option<f64>,

    /// Contrast (-100..100)
    #[arg(long, allow_hyphen_values = true)]
    contrast: Option<f64>,

    /// Vibrance (-1..1)
    #[arg(long, allow_hyphen_values = true)]
    vibrance: Option<f64>,

    /// Saturation (-1..1)
    #[arg(long, allow_hyphen_values = true)]
    saturation: Option<f64>,

    /// Make pixels brighter than this transparent
    #[arg(long)]
    threshold_white: Option<u8>,

    /// Make pixels darker than this transparent
    #[arg(long)]
    threshold_black: Option<u8>,

    /// Master curve points, e.g. 0:0,128:150,255:255
    #[arg(long)]
    curve: Option<String>,
}

#[derive(Args)]
struct ApplyArgs {
    /// Input image
    input: PathBuf,

    /// Output image
    #[arg(short, long)]
    output: PathBuf,

    /// Params file (.yaml, .yml or .json)
    #[arg(short, long)]
    params: Option<PathBuf>,

    /// Grayscale mask image limiting where adjustments apply
    #[arg(short, long)]
    mask: Option<PathBuf>,

    /// Render on the calling thread instead of the pipeline worker
    #[arg(long)]
    sync: bool,

    #[command(flatten)]
    overrides: ParamOverrides,
}

#[derive(Args)]
struct HistogramArgs {
    /// Input image
    input: PathBuf,

    /// Machine-readable output (JSON, all 256 bins)
    #[arg(long)]
    json: bool,

    /// Number of buckets in the text view
    #[arg(short, long, default_value = "16")]
    buckets: usize,
}

#[derive(Args)]
struct CurveArgs {
    /// Control points as x:y pairs, e.g. 0:0,128:150,255:255
    points: String,

    /// Machine-readable output (JSON array)
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ParamsArgs {
    /// Emit JSON instead of YAML
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct BatchArgs {
    /// Input glob pattern, e.g. 'shots/*.png'
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: PathBuf,

    /// Params file (.yaml, .yml or .json)
    #[arg(short, long)]
    params: Option<PathBuf>,

    /// Output extension (defaults to the input's)
    #[arg(short, long)]
    format: Option<String>,

    #[command(flatten)]
    overrides: ParamOverrides,
}

/// Installs the global tracing subscriber.
///
/// `-v`/`-vv` win over `RETOUCH_LOG`, which wins over `RUST_LOG`. The guard
/// must live until exit so buffered file output is flushed.
fn init_logging(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = match verbose {
        0 => EnvFilter::try_from_env("RETOUCH_LOG")
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .with_context(|| format!("Invalid log file: {}", path.display()))?;
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
            Ok(None)
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging(cli.verbose, cli.log_file.as_deref())?;

    // Configure thread pool
    if cli.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(cli.threads)
            .build_global()
            .context("Failed to configure thread pool")?;
    }

    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Apply(args) => commands::apply::run(args, cli.verbose, config),
        Commands::Histogram(args) => commands::histogram::run(args, cli.verbose),
        Commands::Curve(args) => commands::curve::run(args),
        Commands::Params(args) => commands::params::run(args),
        Commands::Batch(args) => commands::batch::run(args, cli.verbose),
    }
}
