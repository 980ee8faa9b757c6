//! Point d'entrée CLI pour raster-align

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

// Charger .env au démarrage
fn load_env() {
    // Chercher .env dans le répertoire courant ou parent
    if dotenvy::dotenv().is_err() {
        // Essayer depuis le répertoire du binaire
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

mod cli;

use cli::Commands;

/// Aligner des séries temporelles de rasters sur un CRS et une taille de pixel communs
#[derive(Parser)]
#[command(name = "raster-align")]
#[command(author, version)]
#[command(about = "Reproject or resample a directory of GeoTIFF rasters onto a common grid")]
#[command(long_about = "Batch tool that aligns single-band GeoTIFF time series.\n\n'reproject' warps every file to the CRS of a reference raster, 'resample' changes the pixel size within each file's CRS. Bilinear interpolation, NoData-aware.")]
struct Cli {
    /// Augmenter la verbosité (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> Result<()> {
    // Charger .env avant tout
    load_env();

    let cli = Cli::parse();

    // Configurer le logging
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Reproject(args) => {
            info!(input = %args.common.input.display(), output = %args.common.output.display(), "Reprojecting");
            cli::cmd_reproject(args)?;
        }
        Commands::Resample(args) => {
            info!(input = %args.common.input.display(), resolution = args.resolution, "Resampling");
            cli::cmd_resample(args)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    let rust_log = std::env::var("RUST_LOG").ok();
    let filter = log_filter(verbose, quiet, rust_log.as_deref());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .init();
}

/// RUST_LOG prioritaire ; -v/-q seulement s'il est absent ou invalide
fn log_filter(verbose: u8, quiet: bool, rust_log: Option<&str>) -> EnvFilter {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(level.as_str().to_lowercase()))
}
