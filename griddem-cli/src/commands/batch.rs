use anyhow::{bail, Context, Result};
use griddem::geojson::add_elevations_to_geometry;
use griddem::ElevationGrid;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use super::GridSource;

pub fn run(
    source: &GridSource,
    grid: &str,
    input: PathBuf,
    output: Option<PathBuf>,
    x_col: &str,
    y_col: &str,
) -> Result<()> {
    let loaded = source.load(grid)?;

    // Detect file format
    let extension = input
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "csv" => process_csv(&loaded, &input, output, x_col, y_col),
        "geojson" | "json" => process_geojson(&loaded, &input, output),
        _ => bail!(
            "Unsupported file format: {}. Use .csv or .geojson",
            extension
        ),
    }
}

fn progress_bar(len: u64) -> Result<ProgressBar> {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            )?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

fn output_path(input: &Path, output: Option<PathBuf>, extension: &str) -> PathBuf {
    output.unwrap_or_else(|| {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        input.with_file_name(format!("{}_elevation.{}", stem, extension))
    })
}

fn process_csv(
    grid: &ElevationGrid,
    input: &Path,
    output: Option<PathBuf>,
    x_col: &str,
    y_col: &str,
) -> Result<()> {
    let file = File::open(input).context("Failed to open input file")?;
    let mut reader = csv::Reader::from_reader(BufReader::new(file));

    // Find column indices
    let headers = reader.headers()?.clone();
    let x_idx = headers
        .iter()
        .position(|h| h == x_col)
        .with_context(|| format!("Column '{}' not found in CSV", x_col))?;
    let y_idx = headers
        .iter()
        .position(|h| h == y_col)
        .with_context(|| format!("Column '{}' not found in CSV", y_col))?;

    let records: Vec<_> = reader.records().collect::<Result<_, _>>()?;
    let pb = progress_bar(records.len() as u64)?;

    let output_path = output_path(input, output, "csv");
    let output_file = File::create(&output_path).context("Failed to create output file")?;
    let mut writer = csv::Writer::from_writer(BufWriter::new(output_file));

    let mut new_headers: Vec<&str> = headers.iter().collect();
    new_headers.push("elevation");
    writer.write_record(&new_headers)?;

    for record in records {
        let x: f64 = record
            .get(x_idx)
            .context("Missing x")?
            .parse()
            .context("Invalid x")?;
        let y: f64 = record
            .get(y_idx)
            .context("Missing y")?
            .parse()
            .context("Invalid y")?;

        let elevation = grid
            .get_value(x, y)
            .context("Failed to read grid")?
            .map(|e| e.to_string())
            .unwrap_or_else(|| "void".to_string());

        let mut new_record: Vec<&str> = record.iter().collect();
        new_record.push(&elevation);
        writer.write_record(&new_record)?;

        pb.inc(1);
    }

    pb.finish_with_message("done");
    writer.flush()?;

    println!("Output written to: {}", output_path.display());
    Ok(())
}

fn process_geojson(grid: &ElevationGrid, input: &Path, output: Option<PathBuf>) -> Result<()> {
    let file = File::open(input).context("Failed to open input file")?;
    let reader = BufReader::new(file);

    let geojson: geojson::GeoJson =
        serde_json::from_reader(reader).context("Failed to parse GeoJSON")?;

    let result = match geojson {
        geojson::GeoJson::Geometry(geometry) => {
            geojson::GeoJson::Geometry(add_elevations_to_geometry(grid, geometry)?)
        }
        geojson::GeoJson::Feature(mut feature) => {
            if let Some(geometry) = feature.geometry.take() {
                feature.geometry = Some(add_elevations_to_geometry(grid, geometry)?);
            }
            geojson::GeoJson::Feature(feature)
        }
        geojson::GeoJson::FeatureCollection(mut fc) => {
            let pb = progress_bar(fc.features.len() as u64)?;
            for feature in &mut fc.features {
                if let Some(geometry) = feature.geometry.take() {
                    feature.geometry = Some(add_elevations_to_geometry(grid, geometry)?);
                }
                pb.inc(1);
            }
            pb.finish_with_message("done");
            geojson::GeoJson::FeatureCollection(fc)
        }
    };

    let output_path = output_path(input, output, "geojson");
    let output_file = File::create(&output_path).context("Failed to create output file")?;
    let mut writer = BufWriter::new(output_file);
    serde_json::to_writer_pretty(&mut writer, &result)?;
    writer.flush()?;

    println!("Output written to: {}", output_path.display());
    Ok(())
}
