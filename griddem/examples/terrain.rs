//! Read a tile, build an overview, shade it and trace its outline.
//!
//! Run with: cargo run --example terrain -- /path/to/N35E138.hgt [out_dir]

use std::env;
use std::path::PathBuf;

use griddem::{io, DemError, Hillshader, ReaderConfig, StorageKind};

fn main() -> Result<(), DemError> {
    let mut args = env::args().skip(1);
    let input = args.next().unwrap_or_else(|| {
        eprintln!("Usage: cargo run --example terrain -- /path/to/tile.hgt [out_dir]");
        std::process::exit(1);
    });
    let out_dir = PathBuf::from(args.next().unwrap_or_else(|| ".".to_string()));

    let grid = io::global().read(&input, &ReaderConfig::default())?;
    println!(
        "Read {}x{} grid, cell size {:.6}",
        grid.width(),
        grid.height(),
        grid.cell_size()
    );

    let stats = grid.statistics()?;
    println!(
        "  min {:?} max {:?} mean {:?}, {} void cells",
        stats.min, stats.max, stats.mean, stats.null_count
    );

    // Four source cells per overview cell along each axis
    let mut overview = grid.resample(grid.cell_size() * 4.0, StorageKind::Float)?;
    println!("Overview: {}x{}", overview.width(), overview.height());

    let relief_path = out_dir.join("relief.png");
    overview
        .shaded_relief(&Hillshader::default())?
        .write_png(&relief_path)?;
    println!("Wrote {}", relief_path.display());

    let outline = overview.trace_boundary()?;
    println!(
        "Outline: {} vertices, area {:.4}",
        outline.vertices().len(),
        outline.signed_area()
    );

    Ok(())
}
