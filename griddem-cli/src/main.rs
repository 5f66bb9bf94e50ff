use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

/// Gridded elevation model CLI tool
#[derive(Parser)]
#[command(name = "griddem")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory containing grid files
    #[arg(short, long, env = "GRIDDEM_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Maximum grids in cache
    #[arg(
        short,
        long,
        env = "GRIDDEM_CACHE_SIZE",
        default_value = "16",
        global = true
    )]
    cache_size: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Query elevation at a single map coordinate
    Query {
        /// Grid file: a path, or a name in the data directory (e.g. N35E138)
        grid: String,

        /// X coordinate (longitude for geographic grids)
        #[arg(short, long, allow_negative_numbers = true)]
        x: f64,

        /// Y coordinate (latitude for geographic grids)
        #[arg(short, long, allow_negative_numbers = true)]
        y: f64,

        /// Output result as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Add elevations to every coordinate of a CSV or GeoJSON file
    Batch {
        /// Grid file: a path, or a name in the data directory
        grid: String,

        /// Input file (CSV or GeoJSON)
        input: PathBuf,

        /// Output file (same format as input if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Column name for X (CSV only)
        #[arg(long, default_value = "x")]
        x_col: String,

        /// Column name for Y (CSV only)
        #[arg(long, default_value = "y")]
        y_col: String,
    },

    /// Display information about a grid
    Info {
        /// Grid file: a path, or a name in the data directory
        grid: String,
    },

    /// Render a shaded relief PNG
    Hillshade {
        /// Grid file: a path, or a name in the data directory
        grid: String,

        /// Output PNG
        output: PathBuf,

        /// Light zenith in degrees
        #[arg(long, default_value = "45")]
        zenith: f64,

        /// Light azimuth in degrees clockwise from north
        #[arg(long, default_value = "315")]
        azimuth: f64,

        /// Vertical exaggeration
        #[arg(long, default_value = "1")]
        z_factor: f64,

        /// Resample to this cell size before shading
        #[arg(long)]
        cell_size: Option<f64>,
    },

    /// Trace the outline of the populated cells as GeoJSON
    Boundary {
        /// Grid file: a path, or a name in the data directory
        grid: String,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Resample to this cell size before tracing
        #[arg(long)]
        cell_size: Option<f64>,
    },

    /// Resample a grid to a coarser cell size and write it
    Resample {
        /// Grid file: a path, or a name in the data directory
        grid: String,

        /// Target cell size
        cell_size: f64,

        /// Output file; the extension selects the format (e.g. .hgt)
        output: PathBuf,
    },

    /// List grid files in the data directory
    List,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "griddem=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let source = commands::GridSource::new(cli.data_dir, cli.cache_size);

    match cli.command {
        Commands::Query { grid, x, y, json } => commands::query::run(&source, &grid, x, y, json),
        Commands::Batch {
            grid,
            input,
            output,
            x_col,
            y_col,
        } => commands::batch::run(&source, &grid, input, output, &x_col, &y_col),
        Commands::Info { grid } => commands::info::run(&source, &grid),
        Commands::Hillshade {
            grid,
            output,
            zenith,
            azimuth,
            z_factor,
            cell_size,
        } => commands::hillshade::run(&source, &grid, output, zenith, azimuth, z_factor, cell_size),
        Commands::Boundary {
            grid,
            output,
            cell_size,
        } => commands::boundary::run(&source, &grid, output, cell_size),
        Commands::Resample {
            grid,
            cell_size,
            output,
        } => commands::resample::run(&source, &grid, cell_size, output),
        Commands::List => commands::list::run(&source),
    }
}
