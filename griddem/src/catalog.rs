//! Directory of grid files with LRU caching.
//!
//! This module provides [`GridCatalog`], which opens grids by file name from
//! a data directory through an [`IoRegistry`], keeps recently used ones in
//! memory and extracts `<name>.zip` archives on first use.
//!
//! Cached grids are shared read-only as `Arc<ElevationGrid>`.
//!
//! ```ignore
//! use griddem::GridCatalogBuilder;
//!
//! let catalog = GridCatalogBuilder::new("/data/srtm").cache_size(32).build();
//! let elevation = catalog.get_value("N35E138.hgt", 138.7, 35.5)?;
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use moka::sync::Cache;
use tracing::{debug, info, warn};

use crate::bbox::BoundingBox;
use crate::error::{DemError, Result};
use crate::filename::parse_tile_name;
use crate::grid::ElevationGrid;
use crate::io::{self, IoRegistry, ReaderConfig};

/// Default number of grids kept in the cache.
pub const DEFAULT_CACHE_SIZE: u64 = 16;

/// Statistics about cache usage.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Number of grids currently in the cache.
    pub entry_count: u64,
    /// Number of requests served from the cache.
    pub hit_count: u64,
    /// Number of grids loaded from disk.
    pub miss_count: u64,
}

impl CacheStats {
    /// Calculate the cache hit rate (0.0 to 1.0).
    ///
    /// Returns 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hit_count + self.miss_count;
        if total == 0 {
            0.0
        } else {
            self.hit_count as f64 / total as f64
        }
    }
}

/// Statistics from a preload operation.
#[derive(Debug, Clone, Default)]
pub struct PreloadStats {
    /// Number of grids successfully loaded into cache.
    pub grids_loaded: u64,
    /// Number of grids that were already in cache.
    pub grids_already_cached: u64,
    /// Number of grids that failed to load.
    pub grids_failed: u64,
    /// Number of grids that matched the bounding box filter.
    pub grids_matched: u64,
    /// Total elapsed time in milliseconds.
    pub elapsed_ms: u64,
}

/// Grids of one data directory, opened on demand.
pub struct GridCatalog {
    data_dir: PathBuf,
    registry: Arc<IoRegistry>,
    reader_config: ReaderConfig,
    cache: Cache<String, Arc<ElevationGrid>>,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
}

impl GridCatalog {
    /// Create a catalog over `data_dir` using the process-wide registry.
    ///
    /// # Arguments
    ///
    /// * `data_dir` - Directory holding the grid files
    /// * `cache_size` - Maximum number of grids to keep open
    pub fn new<P: AsRef<Path>>(data_dir: P, cache_size: u64) -> Self {
        GridCatalogBuilder::new(data_dir).cache_size(cache_size).build()
    }

    pub fn builder<P: AsRef<Path>>(data_dir: P) -> GridCatalogBuilder {
        GridCatalogBuilder::new(data_dir)
    }

    /// Open a grid by file name, from cache or disk.
    ///
    /// If `name` is missing but `name.zip` exists, the first entry of the
    /// archive with the same extension is extracted next to it.
    ///
    /// # Errors
    ///
    /// Returns [`DemError::FileNotFound`] if neither the file nor an archive
    /// exists, [`DemError::UnknownFormat`] if no registered format handles
    /// it, or any error of the reader.
    pub fn get_grid(&self, name: &str) -> Result<Arc<ElevationGrid>> {
        if let Some(grid) = self.cache.get(name) {
            self.hit_count.fetch_add(1, Ordering::Relaxed);
            return Ok(grid);
        }
        self.miss_count.fetch_add(1, Ordering::Relaxed);

        let path = self.data_dir.join(name);
        if !path.exists() {
            let zip_path = self.data_dir.join(format!("{}.zip", name));
            if !zip_path.exists() {
                return Err(DemError::FileNotFound { path });
            }
            self.extract_from_zip(&zip_path, name)?;
        }

        let grid = Arc::new(self.registry.read(&path, &self.reader_config)?);
        info!(
            name,
            width = grid.width(),
            height = grid.height(),
            "loaded grid into cache"
        );
        self.cache.insert(name.to_string(), grid.clone());
        Ok(grid)
    }

    /// Elevation at a map coordinate of the named grid.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(elevation))` - finite elevation
    /// - `Ok(None)` - no data, or the point lies outside the grid
    /// - `Err(...)` - the grid could not be opened
    pub fn get_value(&self, name: &str, x: f64, y: f64) -> Result<Option<f64>> {
        self.get_grid(name)?.get_value(x, y)
    }

    /// Extract the grid file from a local archive.
    fn extract_from_zip(&self, zip_path: &Path, name: &str) -> Result<()> {
        let file = std::fs::File::open(zip_path)?;
        let mut archive = zip::ZipArchive::new(file)
            .map_err(|e| DemError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;

        let wanted_ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_ascii_lowercase()));

        for i in 0..archive.len() {
            let mut entry = archive.by_index(i).map_err(|e| {
                DemError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
            })?;

            let entry_name = entry.name().to_ascii_lowercase();
            let matches = entry_name == name.to_ascii_lowercase()
                || wanted_ext
                    .as_deref()
                    .is_some_and(|ext| entry_name.ends_with(ext));
            if matches {
                let out_path = self.data_dir.join(name);
                let mut out_file = std::fs::File::create(&out_path)?;
                std::io::copy(&mut entry, &mut out_file)?;
                debug!(archive = %zip_path.display(), entry = %entry.name(), "extracted grid");
                return Ok(());
            }
        }

        Err(DemError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("No {} found in {}", name, zip_path.display()),
        )))
    }

    /// Get cache statistics.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.run_pending_tasks();
        CacheStats {
            entry_count: self.cache.entry_count(),
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn registry(&self) -> &IoRegistry {
        &self.registry
    }

    /// Get the maximum cache size.
    pub fn cache_capacity(&self) -> u64 {
        self.cache.policy().max_capacity().unwrap_or(0)
    }

    /// Drop one grid from the cache, e.g. after its file changed.
    ///
    /// Holders of the `Arc` keep their copy.
    pub fn invalidate(&self, name: &str) {
        self.cache.invalidate(name);
    }

    /// Drop every grid from the cache.
    pub fn clear_cache(&self) {
        self.cache.invalidate_all();
    }

    /// File names in the data directory that a registered format can read.
    ///
    /// `<name>.zip` archives are listed as `<name>`; a file and its archive
    /// appear once. Sorted.
    pub fn scan_grid_files(&self) -> Vec<String> {
        let mut names = BTreeSet::new();

        let entries = match std::fs::read_dir(&self.data_dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %self.data_dir.display(), error = %e, "cannot read data directory");
                return Vec::new();
            }
        };

        for entry in entries.flatten() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            let name = match name.strip_suffix(".zip") {
                Some(inner) => inner,
                None => &name,
            };
            if self.registry.lookup(name).is_some() {
                names.insert(name.to_string());
            }
        }

        names.into_iter().collect()
    }

    /// Load grids into the cache ahead of use.
    ///
    /// # Arguments
    ///
    /// * `bounds` - If `None`, every readable file is loaded. Otherwise only
    ///   files named after a one-degree tile overlapping at least one box
    ///   are loaded; other files are skipped.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let alps = BoundingBox::new(5.0, 45.0, 16.0, 48.0);
    /// let stats = catalog.preload(Some(&[alps]));
    /// println!("Loaded {} grids in {}ms", stats.grids_loaded, stats.elapsed_ms);
    /// ```
    pub fn preload(&self, bounds: Option<&[BoundingBox]>) -> PreloadStats {
        let start = Instant::now();
        let mut stats = PreloadStats::default();

        for name in self.scan_grid_files() {
            if let Some(boxes) = bounds {
                let Some(corner) = parse_tile_name(&name) else {
                    debug!(name, "skipping file without tile name");
                    continue;
                };
                if !boxes.iter().any(|b| corner.overlaps(b)) {
                    continue;
                }
            }

            stats.grids_matched += 1;

            if self.cache.contains_key(&name) {
                stats.grids_already_cached += 1;
                continue;
            }

            match self.get_grid(&name) {
                Ok(_) => stats.grids_loaded += 1,
                Err(e) => {
                    warn!(name, error = %e, "failed to preload grid");
                    stats.grids_failed += 1;
                }
            }
        }

        stats.elapsed_ms = start.elapsed().as_millis() as u64;
        info!(
            matched = stats.grids_matched,
            loaded = stats.grids_loaded,
            failed = stats.grids_failed,
            elapsed_ms = stats.elapsed_ms,
            "preload finished"
        );
        stats
    }
}

/// Builder for [`GridCatalog`].
///
/// # Example
///
/// ```ignore
/// use griddem::GridCatalogBuilder;
///
/// let catalog = GridCatalogBuilder::from_env()?.build();
/// ```
pub struct GridCatalogBuilder {
    data_dir: PathBuf,
    cache_size: u64,
    reader_config: ReaderConfig,
    registry: Option<Arc<IoRegistry>>,
}

impl GridCatalogBuilder {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            cache_size: DEFAULT_CACHE_SIZE,
            reader_config: ReaderConfig::default(),
            registry: None,
        }
    }

    /// Create a builder from environment variables.
    ///
    /// # Environment Variables
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `GRIDDEM_DATA_DIR` | Directory holding grid files | Required |
    /// | `GRIDDEM_CACHE_SIZE` | Maximum grids in cache | 16 |
    ///
    /// # Errors
    ///
    /// Returns an error if `GRIDDEM_DATA_DIR` is not set.
    pub fn from_env() -> Result<Self> {
        let data_dir = std::env::var("GRIDDEM_DATA_DIR").map_err(|_| {
            DemError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "GRIDDEM_DATA_DIR environment variable not set",
            ))
        })?;

        let cache_size: u64 = std::env::var("GRIDDEM_CACHE_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_CACHE_SIZE);

        Ok(Self::new(data_dir).cache_size(cache_size))
    }

    /// Overrides the directory set in the constructor or from environment.
    pub fn data_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.data_dir = path.as_ref().to_path_buf();
        self
    }

    /// Default is 16 grids.
    pub fn cache_size(mut self, size: u64) -> Self {
        self.cache_size = size;
        self
    }

    /// Options passed to every reader.
    pub fn reader_config(mut self, config: ReaderConfig) -> Self {
        self.reader_config = config;
        self
    }

    /// Use this registry instead of the process-wide one.
    pub fn registry(mut self, registry: Arc<IoRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn build(self) -> GridCatalog {
        GridCatalog {
            data_dir: self.data_dir,
            registry: self.registry.unwrap_or_else(io::global),
            reader_config: self.reader_config,
            cache: Cache::builder().max_capacity(self.cache_size).build(),
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
        }
    }
}
