use anyhow::Result;
use griddem::filename::parse_tile_name;
use griddem::io::hgt::HgtResolution;
use std::fs;

use super::{format_size, GridSource};

pub fn run(source: &GridSource) -> Result<()> {
    let catalog = source.catalog()?;
    let dir = catalog.data_dir();

    if !dir.exists() {
        anyhow::bail!("Data directory does not exist: {}", dir.display());
    }

    let names = catalog.scan_grid_files();
    if names.is_empty() {
        println!("No grid files found in: {}", dir.display());
        return Ok(());
    }

    let mut total_size: u64 = 0;

    println!("{:<16} {:>8} {:>30}", "GRID", "TYPE", "COVERAGE");
    println!("{}", "-".repeat(56));

    for name in &names {
        // Archived grids are listed without the .zip suffix
        let path = dir.join(name);
        let (size, archived) = match fs::metadata(&path) {
            Ok(m) => (m.len(), false),
            Err(_) => (
                fs::metadata(dir.join(format!("{}.zip", name)))
                    .map(|m| m.len())
                    .unwrap_or(0),
                true,
            ),
        };
        total_size += size;

        let kind = if archived {
            "zip"
        } else {
            match HgtResolution::from_file_size(size) {
                Ok(HgtResolution::Srtm1) => "SRTM1",
                Ok(HgtResolution::Srtm3) => "SRTM3",
                Ok(HgtResolution::Custom(_)) => "custom",
                Err(_) => "???",
            }
        };

        let coverage = match parse_tile_name(name) {
            Some(corner) => format!(
                "x {} to {}, y {} to {}",
                corner.lon,
                corner.lon + 1,
                corner.lat,
                corner.lat + 1
            ),
            None => "Unknown".to_string(),
        };

        println!("{:<16} {:>8} {:>30}", name, kind, coverage);
    }

    println!();
    println!("Summary:");
    println!("  Total grids: {}", names.len());
    println!("  Total size: {}", format_size(total_size));
    println!("  Data directory: {}", dir.display());

    Ok(())
}
