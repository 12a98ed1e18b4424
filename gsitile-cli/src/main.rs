//! gsitile CLI - Command-line interface
//!
//! Downloads the GSI map tiles covering a bounding box and stitches them
//! into one image.

mod error;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use gsitile::app::{StitchConfig, StitchReport, Stitcher, DEFAULT_ZOOM};
use gsitile::compose::OutputMode;
use gsitile::config::ConfigFile;
use gsitile::coord::{Angle, BoundingBox, GsdMode};
use gsitile::logging::{default_log_dir, default_log_file, init_logging};
use gsitile::provider::TileStyle;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tracing::info;

use error::CliError;

#[derive(Parser, Debug)]
#[command(name = "gsitile", version)]
#[command(
    about = "Download GSI map tiles for a bounding box and stitch them into one image",
    long_about = None
)]
struct Args {
    /// Latitude of the first corner (decimal degrees or D:M:S)
    #[arg(long, allow_hyphen_values = true)]
    lat0: Angle,

    /// Longitude of the first corner (decimal degrees or D:M:S)
    #[arg(long, allow_hyphen_values = true)]
    lon0: Angle,

    /// Latitude of the opposite corner (decimal degrees or D:M:S)
    #[arg(long, allow_hyphen_values = true)]
    lat1: Angle,

    /// Longitude of the opposite corner (decimal degrees or D:M:S)
    #[arg(long, allow_hyphen_values = true)]
    lon1: Angle,

    /// Zoom level (0-18)
    #[arg(long, default_value_t = DEFAULT_ZOOM)]
    zoom: u8,

    /// Tile style: std, pale, blank, english or seamlessphoto
    #[arg(long)]
    style: Option<TileStyle>,

    /// Output file path (format from extension: .jpg, .png, ...)
    #[arg(long)]
    output: PathBuf,

    /// Keep the whole tile-aligned canvas instead of cropping to the corners
    #[arg(long)]
    no_crop: bool,

    /// Root directory for staged tiles
    #[arg(long)]
    staging_dir: Option<PathBuf>,

    /// Keep staged tiles after a successful run
    #[arg(long)]
    keep_tiles: bool,

    /// Attempts per tile before the run fails
    #[arg(long)]
    retries: Option<u32>,

    /// Maximum concurrent tile downloads
    #[arg(long)]
    parallel: Option<usize>,

    /// Overall download timeout in seconds (0 disables)
    #[arg(long)]
    timeout: Option<u64>,

    /// Y-axis ground sample distance formula: compatible or corrected
    #[arg(long)]
    gsd_mode: Option<GsdMode>,

    /// Tile server base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Configuration file (default: ~/.gsitile/config.ini)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log debug output
    #[arg(long, short)]
    verbose: bool,
}

impl Args {
    fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_angles(self.lat0, self.lat1, self.lon0, self.lon1)
    }
}

/// Layers command-line flags over the configuration file.
fn resolve_config(args: &Args, file: &ConfigFile) -> Result<StitchConfig, CliError> {
    let mut config = StitchConfig::from_config_file(file).with_zoom(args.zoom);

    if let Some(style) = args.style {
        config = config.with_style(style);
    }
    if let Some(base_url) = &args.base_url {
        config = config.with_base_url(base_url.clone());
    }
    if let Some(dir) = &args.staging_dir {
        config = config.with_staging_dir(dir.clone());
    }
    if args.keep_tiles {
        config = config.with_keep_staged_tiles(true);
    }
    if let Some(retries) = args.retries {
        if retries == 0 {
            return Err(CliError::Config("--retries must be at least 1".to_string()));
        }
        config = config.with_max_attempts(retries);
    }
    if let Some(parallel) = args.parallel {
        if parallel == 0 {
            return Err(CliError::Config("--parallel must be at least 1".to_string()));
        }
        config = config.with_max_parallel(parallel);
    }
    if let Some(secs) = args.timeout {
        config = config.with_timeout((secs > 0).then(|| Duration::from_secs(secs)));
    }
    if let Some(mode) = args.gsd_mode {
        config = config.with_gsd_mode(mode);
    }
    if args.no_crop {
        config = config.with_output_mode(OutputMode::Merged);
    }

    Ok(config)
}

fn progress_bar(total: u64) -> ProgressBar {
    let bar = ProgressBar::with_draw_target(Some(total), ProgressDrawTarget::stderr_with_hz(10));
    let style = ProgressStyle::with_template(
        "downloading map tile: {pos} / {len} {bar:40.cyan/blue} [{elapsed_precise}]",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("=>-");
    bar.set_style(style);
    bar
}

fn print_report(report: &StitchReport, output: &std::path::Path) {
    let rect = &report.plan.rect;
    println!(
        "Stitched {} tiles ({} x {}) at zoom {} into {} ({}x{})",
        report.tiles_fetched,
        rect.columns(),
        rect.rows(),
        report.plan.zoom,
        output.display(),
        report.image_size.0,
        report.image_size.1
    );
    match &report.plan.gsd {
        Some(gsd) => println!("Ground sample distance: {}", gsd),
        None => println!("Ground sample distance: unavailable (zero-width extent)"),
    }
    println!(
        "Covered extent: {} to {}",
        report.extent.corner0, report.extent.corner1
    );
    if report.retries > 0 {
        println!("Retried attempts: {}", report.retries);
    }
    if let Some(dir) = &report.staged_tiles {
        println!("Staged tiles kept in {}", dir.display());
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let _logging_guard = init_logging(default_log_dir(), default_log_file(), args.verbose)
        .map_err(|e| CliError::LoggingInit(e.to_string()))?;

    let file = match &args.config {
        Some(path) => ConfigFile::load_from(path)?,
        None => ConfigFile::load()?,
    };
    let config = resolve_config(&args, &file)?;
    let bbox = args.bounding_box();

    let stitcher = Stitcher::gsi(config)?;
    let plan = stitcher.plan(&bbox)?;
    info!(
        version = gsitile::VERSION,
        style = %stitcher.config().style,
        tiles = plan.rect.tile_count(),
        output = %args.output.display(),
        "Starting download"
    );

    let bar = progress_bar(plan.rect.tile_count() as u64);
    let result = stitcher.run(&bbox, &args.output, |done, _total| {
        bar.set_position(done as u64);
    });
    match result {
        Ok(report) => {
            bar.finish();
            print_report(&report, &args.output);
            Ok(())
        }
        Err(e) => {
            bar.abandon();
            Err(e.into())
        }
    }
}

fn main() {
    let args = Args::parse();
    if let Err(e) = run(args) {
        e.exit();
    }
}
