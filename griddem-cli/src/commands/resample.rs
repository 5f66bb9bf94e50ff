use anyhow::{Context, Result};
use griddem::io::{self, hgt::resample_posts};
use griddem::resample::resample_step;
use griddem::StorageKind;
use std::path::{Path, PathBuf};

use super::GridSource;

pub fn run(source: &GridSource, grid: &str, cell_size: f64, output: PathBuf) -> Result<()> {
    let loaded = source.load(grid)?;

    // .hgt posts must stay on the tile edges, so thin instead of block-averaging
    let resampled = if is_hgt(&output) {
        let step = resample_step(loaded.cell_size(), cell_size);
        resample_posts(&loaded, step, StorageKind::Float)
            .with_context(|| format!("Cannot thin grid to cell size {} for .hgt", cell_size))?
    } else {
        loaded
            .resample(cell_size, StorageKind::Float)
            .context("Failed to resample grid")?
    };

    io::global()
        .write(&resampled, &output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "Resampled {}x{} -> {}x{} (cell size {} -> {})",
        loaded.width(),
        loaded.height(),
        resampled.width(),
        resampled.height(),
        loaded.cell_size(),
        resampled.cell_size()
    );
    println!("Output written to: {}", output.display());
    Ok(())
}

fn is_hgt(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("hgt"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// 9x9 tile, post (x, y) holds `10 * y + x`.
    fn write_tile(dir: &Path) -> PathBuf {
        let bytes: Vec<u8> = (0..9i16)
            .flat_map(|row| (0..9i16).map(move |x| 10 * (8 - row) + x))
            .flat_map(|v| v.to_be_bytes())
            .collect();
        let path = dir.join("N10E020.hgt");
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn test_resample_to_hgt_reads_back() {
        let tmp = TempDir::new().unwrap();
        let input = write_tile(tmp.path());
        let out = TempDir::new().unwrap();
        let output = out.path().join("N10E020.hgt");
        let source = GridSource::new(None, 4);

        run(&source, input.to_str().unwrap(), 0.5, output.clone()).unwrap();

        let back = io::global()
            .read(&output, &griddem::ReaderConfig::default())
            .unwrap();
        assert_eq!(back.width(), 3);
        assert_eq!(back.cell_size(), 0.5);
        assert_eq!(back.get_value(20.5, 10.5).unwrap(), Some(44.0));
    }

    #[test]
    fn test_resample_to_hgt_rejects_uneven_step() {
        let tmp = TempDir::new().unwrap();
        let input = write_tile(tmp.path());
        let output = tmp.path().join("out.hgt");
        let source = GridSource::new(None, 4);

        // 0.375 is a step of 3, which does not divide 8 post intervals
        assert!(run(&source, input.to_str().unwrap(), 0.375, output.clone()).is_err());
        assert!(!output.exists());
    }

    #[test]
    fn test_is_hgt() {
        assert!(is_hgt(Path::new("a/N10E020.HGT")));
        assert!(!is_hgt(Path::new("relief.png")));
    }
}
