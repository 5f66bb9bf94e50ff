use anyhow::{Context, Result};
use serde::Serialize;

use super::GridSource;

#[derive(Serialize)]
struct ElevationResponse {
    x: f64,
    y: f64,
    elevation: Option<f64>,
}

pub fn run(source: &GridSource, grid: &str, x: f64, y: f64, json: bool) -> Result<()> {
    let loaded = source.load(grid)?;
    let elevation = loaded
        .get_value(x, y)
        .context("Failed to get elevation")?;

    if json {
        let response = ElevationResponse { x, y, elevation };
        println!("{}", serde_json::to_string(&response)?);
    } else {
        match elevation {
            Some(elev) => println!("{}", elev),
            None => println!("void"),
        }
    }

    Ok(())
}
