use anyhow::{Context, Result};
use griddem::geojson::boundary_to_feature;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::warn;

use super::{with_cell_size, GridSource};

pub fn run(
    source: &GridSource,
    grid: &str,
    output: Option<PathBuf>,
    cell_size: Option<f64>,
) -> Result<()> {
    let loaded = source.load(grid)?;

    let feature = with_cell_size(&loaded, cell_size, |g| {
        let trace = g.trace_boundary().context("Failed to trace boundary")?;
        if trace.is_bounding_box_fallback() {
            warn!(grid, "grid holds no data, writing its bounding box");
        }
        Ok(boundary_to_feature(g, &trace))
    })?;

    match output {
        Some(path) => {
            let file = File::create(&path).context("Failed to create output file")?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, &feature)?;
            writer.flush()?;
            println!("Output written to: {}", path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&feature)?),
    }

    Ok(())
}
