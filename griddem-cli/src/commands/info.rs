use anyhow::{Context, Result};
use griddem::filename::parse_tile_name;
use griddem::io::hgt::HgtResolution;

use super::{format_size, GridSource};

pub fn run(source: &GridSource, grid: &str) -> Result<()> {
    let path = source.resolve_path(grid)?;
    let loaded = source.load(grid)?;

    let stats = loaded.statistics().context("Failed to read grid cells")?;
    let bounds = loaded.bounding_box();

    println!(
        "Grid: {}",
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| grid.to_string())
    );
    println!("Path: {}", path.display());
    println!();

    let resolution = std::fs::metadata(&path)
        .ok()
        .and_then(|m| HgtResolution::from_file_size(m.len()).ok());
    let resolution_str = match resolution {
        Some(HgtResolution::Srtm1) => " SRTM1 (~30m)",
        Some(HgtResolution::Srtm3) => " SRTM3 (~90m)",
        _ => "",
    };
    println!(
        "Size:{} ({}x{} cells, cell size {})",
        resolution_str,
        loaded.width(),
        loaded.height(),
        loaded.cell_size()
    );
    println!("Coordinate space: {}", loaded.space().id);
    println!(
        "Bounds: x {} to {}, y {} to {}",
        bounds.min_x, bounds.max_x, bounds.min_y, bounds.max_y
    );
    if let Some(corner) = parse_tile_name(&path) {
        println!("Tile: {}", corner.stem());
    }
    println!("Storage: {}", loaded.storage().kind_name());
    if let Ok(metadata) = std::fs::metadata(&path) {
        println!("File size: {}", format_size(metadata.len()));
    }
    println!();

    if let (Some(min), Some(max)) = (stats.min, stats.max) {
        println!("Min elevation: {}", min);
        println!("Max elevation: {}", max);
    }
    if let Some(mean) = stats.mean {
        println!("Mean elevation: {:.2}", mean);
    }

    let total = stats.finite_count + stats.null_count;
    if stats.null_count > 0 && total > 0 {
        let void_pct = (stats.null_count as f64 / total as f64) * 100.0;
        println!("Void cells: {} ({:.1}%)", stats.null_count, void_pct);
    }

    Ok(())
}
