//! Définition et implémentation des commandes CLI
//!
//! - `reproject` : aligne un répertoire sur le CRS d'un raster de référence
//! - `resample` : rééchantillonne un répertoire à une taille de pixel commune

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, Subcommand};
use rasterwarp::Crs;
use tracing::info;

use raster_align::batch::{run_batch, BatchJob, TargetCrs};
use raster_align::Config;

#[derive(Subcommand)]
pub enum Commands {
    /// Reproject every raster of a directory onto a common CRS
    Reproject(ReprojectArgs),

    /// Resample every raster of a directory to a common pixel size (same CRS)
    Resample(ResampleArgs),
}

/// Options communes aux deux commandes
#[derive(Args)]
pub struct CommonArgs {
    /// Input directory containing the rasters
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output directory (created if missing)
    #[arg(short, long)]
    pub output: PathBuf,

    /// Prefix added to output file names
    #[arg(long)]
    pub prefix: Option<String>,

    /// Output compression: none, lzw, deflate (default: lzw)
    #[arg(long)]
    pub compression: Option<String>,

    /// Maximum number of files processed concurrently (default: env RASTER_ALIGN_JOBS / CPU cores)
    #[arg(long, alias = "threads")]
    pub jobs: Option<usize>,

    /// Memory budget for pixel buffers, in MB (default: env RASTER_ALIGN_WARP_MEMORY_MB / 1024)
    #[arg(long)]
    pub warp_memory_mb: Option<u64>,

    /// Extension of the files to process (default: tif)
    #[arg(long)]
    pub extension: Option<String>,

    /// JSON config file providing defaults
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write the batch report as JSON
    #[arg(long)]
    pub report: Option<PathBuf>,
}

#[derive(Args)]
pub struct ReprojectArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Reference raster whose CRS is the reprojection target
    #[arg(long, required_unless_present = "target_crs", conflicts_with = "target_crs")]
    pub reference: Option<PathBuf>,

    /// Target CRS (e.g. EPSG:32649), instead of a reference raster
    #[arg(long)]
    pub target_crs: Option<String>,

    /// Output pixel size in target CRS units (default: keep the diagonal pixel count)
    #[arg(long)]
    pub resolution: Option<f64>,
}

#[derive(Args)]
pub struct ResampleArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Output pixel size in source CRS units (e.g. 30)
    #[arg(long)]
    pub resolution: f64,
}

/// Exécute la commande reproject
pub fn cmd_reproject(args: ReprojectArgs) -> Result<()> {
    let target = match (&args.reference, &args.target_crs) {
        (Some(path), _) => TargetCrs::Reference(path.clone()),
        (None, Some(s)) => TargetCrs::Crs(Crs::parse(s)?),
        (None, None) => anyhow::bail!("Either --reference or --target-crs is required"),
    };

    let job = BatchJob::Reproject {
        target,
        resolution: args.resolution,
    };
    run(&job, &args.common)
}

/// Exécute la commande resample
pub fn cmd_resample(args: ResampleArgs) -> Result<()> {
    let job = BatchJob::Resample {
        resolution: args.resolution,
    };
    run(&job, &args.common)
}

fn run(job: &BatchJob, common: &CommonArgs) -> Result<()> {
    let file_config = match &common.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let cli_config = Config {
        extension: common.extension.clone(),
        prefix: common.prefix.clone(),
        compression: common.compression.clone(),
        jobs: common.jobs,
        warp_memory_mb: common.warp_memory_mb,
    };
    let options = cli_config
        .or(Config::from_env())
        .or(file_config)
        .into_options()?;

    println!("=== {} ===", job.operation());
    println!("Input: {}", common.input.display());
    println!("Output: {}", job.output_dir(&common.output).display());
    println!("Extension: {}", options.extension);
    println!("Compression: {}", options.compression);
    println!("Jobs: {}", options.jobs);
    println!("Memory budget: {} MB", options.warp_memory_mb);

    let report = run_batch(&common.input, &common.output, job, &options)?;

    report.display();
    if let Some(path) = &common.report {
        save_report(&report, path)?;
    }

    println!("{}", report.summary());
    Ok(())
}

fn save_report(report: &raster_align::BatchReport, path: &Path) -> Result<()> {
    report.save_to_file(path)?;
    info!(path = %path.display(), "Report saved");
    Ok(())
}
