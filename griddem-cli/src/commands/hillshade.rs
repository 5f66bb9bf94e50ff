use anyhow::{Context, Result};
use griddem::{HillshadeParams, Hillshader};
use std::path::PathBuf;

use super::{with_cell_size, GridSource};

pub fn run(
    source: &GridSource,
    grid: &str,
    output: PathBuf,
    zenith: f64,
    azimuth: f64,
    z_factor: f64,
    cell_size: Option<f64>,
) -> Result<()> {
    let loaded = source.load(grid)?;
    let shader = Hillshader::new(HillshadeParams {
        zenith_deg: zenith,
        azimuth_deg: azimuth,
        z_factor,
    });

    let (width, height) = with_cell_size(&loaded, cell_size, |g| {
        let relief = shader.render(g).context("Failed to shade grid")?;
        relief
            .write_png(&output)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        Ok((relief.width(), relief.height()))
    })?;

    println!("Shaded relief {}x{} written to: {}", width, height, output.display());
    Ok(())
}
