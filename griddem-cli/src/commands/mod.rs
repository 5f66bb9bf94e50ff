pub mod batch;
pub mod boundary;
pub mod hillshade;
pub mod info;
pub mod list;
pub mod query;
pub mod resample;

use anyhow::{Context, Result};
use griddem::{io, ElevationGrid, GridCatalog, GridCatalogBuilder, ReaderConfig, StorageKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where grids named on the command line are loaded from.
pub struct GridSource {
    data_dir: Option<PathBuf>,
    cache_size: u64,
}

impl GridSource {
    pub fn new(data_dir: Option<PathBuf>, cache_size: u64) -> Self {
        Self {
            data_dir,
            cache_size,
        }
    }

    pub fn catalog(&self) -> Result<GridCatalog> {
        let builder = match &self.data_dir {
            Some(dir) => GridCatalogBuilder::new(dir),
            None => GridCatalogBuilder::from_env().context(
                "GRIDDEM_DATA_DIR environment variable not set. Use --data-dir or set GRIDDEM_DATA_DIR",
            )?,
        };
        Ok(builder.cache_size(self.cache_size).build())
    }

    /// File on disk for `grid`: the argument itself if it is an existing
    /// file, otherwise the name inside the data directory.
    pub fn resolve_path(&self, grid: &str) -> Result<PathBuf> {
        let path = Path::new(grid);
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        Ok(self.catalog()?.data_dir().join(catalog_name(grid)))
    }

    /// Load `grid` from a path, or by name through the catalog. A bare tile
    /// name such as `N35E138` gets the `.hgt` extension.
    pub fn load(&self, grid: &str) -> Result<Arc<ElevationGrid>> {
        let path = Path::new(grid);
        if path.is_file() {
            let loaded = io::global()
                .read(path, &ReaderConfig::default())
                .with_context(|| format!("Failed to read grid: {}", path.display()))?;
            return Ok(Arc::new(loaded));
        }

        let name = catalog_name(grid);
        self.catalog()?
            .get_grid(&name)
            .with_context(|| format!("Failed to load grid: {}", name))
    }
}

fn catalog_name(grid: &str) -> String {
    if Path::new(grid).extension().is_some() {
        grid.to_string()
    } else {
        format!("{}.hgt", grid)
    }
}

/// Run `f` on `grid`, or on a resampled copy when a cell size is given.
pub fn with_cell_size<T>(
    grid: &ElevationGrid,
    cell_size: Option<f64>,
    f: impl FnOnce(&ElevationGrid) -> Result<T>,
) -> Result<T> {
    match cell_size {
        Some(cell_size) => {
            let resampled = grid
                .resample(cell_size, StorageKind::Float)
                .context("Failed to resample grid")?;
            f(&resampled)
        }
        None => f(grid),
    }
}

pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
