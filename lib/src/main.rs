//! Infill CLI - Command-line interface for the rectilinear infill library
//!
//! Usage:
//!   infill-cli fill <regions.json> -o <polylines.json> [options]
//!   infill-cli fill <regions.json> --config my_config.json --pattern monotonic
//!   infill-cli inspect <regions.json> [options]
//!   infill-cli default-config

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{info, warn, LevelFilter};
use rectilinear_infill::geometry::PointF;
use rectilinear_infill::{ExPolygon, FillConfig, FillPattern, Polygon, RectilinearInfill};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Rectilinear and monotonic infill path generation
#[derive(Parser, Debug)]
#[command(name = "infill-cli")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fill regions and write the polylines as JSON
    Fill {
        /// Input regions file (JSON array of regions in mm)
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output polylines file (default: stdout)
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,

        #[command(flatten)]
        fill: FillArgs,
    },

    /// Print scan line statistics of each region
    Inspect {
        /// Input regions file (JSON array of regions in mm)
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        #[command(flatten)]
        fill: FillArgs,
    },

    /// Print the default fill configuration as JSON
    DefaultConfig,
}

#[derive(Args, Debug)]
struct FillArgs {
    /// Fill configuration file (JSON format), overridden by the flags below
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Fill pattern (rectilinear, monotonic, monotonic_line, grid)
    #[arg(long)]
    pattern: Option<String>,

    /// Line spacing in mm
    #[arg(long)]
    spacing: Option<f64>,

    /// Fill density (0-1]
    #[arg(long)]
    density: Option<f64>,

    /// Fill angle in degrees
    #[arg(long)]
    angle: Option<f64>,

    /// Seed of the region chaining
    #[arg(long)]
    seed: Option<u64>,

    /// Number of threads to use (0 = auto)
    #[arg(short = 'j', long, default_value = "0")]
    threads: usize,
}

/// A region as stored in the input file, in mm.
#[derive(Debug, Serialize, Deserialize)]
struct RegionMm {
    contour: Vec<[f64; 2]>,
    #[serde(default)]
    holes: Vec<Vec<[f64; 2]>>,
}

impl RegionMm {
    fn to_expolygon(&self) -> ExPolygon {
        let polygon = |points: &[[f64; 2]]| -> Polygon {
            Polygon::from_points(points.iter().map(|&[x, y]| PointF::new(x, y).to_scaled()).collect())
        };
        let mut expolygon =
            ExPolygon::with_holes(polygon(&self.contour), self.holes.iter().map(|h| polygon(h)).collect());
        expolygon.normalize();
        expolygon
    }
}

/// Output file contents, in mm.
#[derive(Debug, Serialize)]
struct FillReport {
    pattern: FillPattern,
    regions_filled: usize,
    regions_failed: usize,
    total_length_mm: f64,
    polylines: Vec<Vec<[f64; 2]>>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.debug {
        LevelFilter::Debug
    } else if cli.verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    match cli.command {
        Commands::Fill { input, output, fill } => run_fill(&input, output.as_deref(), &fill),
        Commands::Inspect { input, fill } => run_inspect(&input, &fill),
        Commands::DefaultConfig => {
            println!("{}", FillConfig::default().to_json_string()?);
            Ok(())
        }
    }
}

/// Build the fill configuration from the config file and the flag overrides.
fn build_config(args: &FillArgs) -> Result<FillConfig> {
    let mut config = match &args.config {
        Some(path) => FillConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config file: {}", path.display()))?,
        None => FillConfig::default(),
    };
    if let Some(pattern) = &args.pattern {
        config.pattern = pattern.parse().context("Invalid --pattern")?;
    }
    if let Some(spacing) = args.spacing {
        config.spacing = spacing;
    }
    if let Some(density) = args.density {
        config.density = density;
    }
    if let Some(angle) = args.angle {
        config.angle = angle.to_radians();
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    config.validate().context("Invalid fill configuration")?;

    if args.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(args.threads)
            .build_global()
            .context("Failed to initialize thread pool")?;
    }
    Ok(config)
}

fn load_regions(input: &Path) -> Result<Vec<ExPolygon>> {
    let text = fs::read_to_string(input)
        .with_context(|| format!("Failed to read regions file: {}", input.display()))?;
    let regions: Vec<RegionMm> = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse regions file: {}", input.display()))?;
    let expolygons: Vec<ExPolygon> = regions.iter().map(RegionMm::to_expolygon).collect();
    for (idx, ex) in expolygons.iter().enumerate() {
        if ex.contour.len() < 3 {
            warn!("Region {} has fewer than 3 contour points", idx);
        }
    }
    info!("Loaded {} regions from {}", expolygons.len(), input.display());
    Ok(expolygons)
}

fn run_fill(input: &Path, output: Option<&Path>, args: &FillArgs) -> Result<()> {
    let config = build_config(args)?;
    let regions = load_regions(input)?;
    info!("{}", config);

    let start = Instant::now();
    let result = RectilinearInfill::new(config).generate(&regions);
    info!(
        "Filled {} of {} regions in {:.1} ms: {} polylines, {:.2} mm",
        result.regions_filled,
        regions.len(),
        start.elapsed().as_secs_f64() * 1000.0,
        result.path_count(),
        result.total_length_mm
    );
    if result.regions_failed > 0 {
        warn!("{} regions failed and were left empty", result.regions_failed);
    }

    let report = FillReport {
        pattern: result.pattern,
        regions_filled: result.regions_filled,
        regions_failed: result.regions_failed,
        total_length_mm: result.total_length_mm,
        polylines: result
            .polylines
            .iter()
            .map(|p| p.to_mm().iter().map(|q| [q.x, q.y]).collect())
            .collect(),
    };
    let json = serde_json::to_string_pretty(&report).context("Failed to serialize polylines")?;
    match output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("Failed to write output: {}", path.display()))?;
            println!("Polylines written to: {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn run_inspect(input: &Path, args: &FillArgs) -> Result<()> {
    let config = build_config(args)?;
    let regions = load_regions(input)?;
    let infill = RectilinearInfill::new(config);

    println!("Region statistics ({}):", infill.config());
    for (idx, stats) in infill.inspect(&regions).into_iter().enumerate() {
        match stats {
            Ok(stats) => println!(
                "  Region {}: {} scan lines, {} intersections, {} inner contours, {} monotonic regions",
                idx, stats.scan_lines, stats.intersections, stats.inner_contours, stats.monotonic_regions
            ),
            Err(e) => println!("  Region {}: failed: {}", idx, e),
        }
    }
    Ok(())
}
