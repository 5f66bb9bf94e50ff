//! Reader and writer collaborators and the format registry.
//!
//! A [`GridFormat`] knows how to open a reader for, or create a writer to,
//! one on-disk format. Formats are found through an [`IoRegistry`] by file
//! extension. The process-wide registry is installed once at startup with
//! [`install`] and read through [`global`]; if nothing was installed the
//! built-in formats are used.
//!
//! ```ignore
//! use griddem::io::{self, ReaderConfig};
//!
//! let grid = io::global().read("N35E138.hgt", &ReaderConfig::default())?;
//! ```

pub mod hgt;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use serde::Deserialize;

use crate::error::{DemError, Result};
use crate::grid::ElevationGrid;
use crate::space::CoordinateSpace;

/// Options recognised by readers.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Use this space instead of the one the format implies.
    pub coordinate_space: Option<CoordinateSpace>,
    /// Map the file read-write so that sets go straight to disk.
    pub writable: bool,
    /// Copy the cells into memory instead of mapping the file.
    pub in_memory: bool,
}

/// Produces a populated grid from one resource.
pub trait GridReader {
    fn read(&mut self) -> Result<ElevationGrid>;

    /// Release anything the reader holds. Grids already returned stay valid.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Serializes grids to one resource.
pub trait GridWriter {
    fn write(&mut self, grid: &ElevationGrid) -> Result<()>;
}

/// Factory for the readers and writers of one format.
pub trait GridFormat: Send + Sync {
    /// Short format name, e.g. `"hgt"`.
    fn name(&self) -> &'static str;

    /// Lower-case file extensions handled, without the dot.
    fn extensions(&self) -> &'static [&'static str];

    fn open_reader(&self, path: &Path, config: &ReaderConfig) -> Result<Box<dyn GridReader>>;

    fn create_writer(&self, path: &Path) -> Result<Box<dyn GridWriter>>;
}

/// Maps file extensions to formats.
#[derive(Clone, Default)]
pub struct IoRegistry {
    formats: Vec<(String, Arc<dyn GridFormat>)>,
}

impl IoRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every format shipped with this crate.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(hgt::HgtFormat));
        registry
    }

    /// Register `format` under each of its extensions. A later registration
    /// for the same extension takes precedence.
    pub fn register(&mut self, format: Arc<dyn GridFormat>) {
        for ext in format.extensions() {
            self.formats
                .retain(|(registered, _)| !registered.eq_ignore_ascii_case(ext));
            self.formats.push((ext.to_ascii_lowercase(), format.clone()));
        }
    }

    /// Format registered for the extension of `path`, if any.
    pub fn lookup<P: AsRef<Path>>(&self, path: P) -> Option<Arc<dyn GridFormat>> {
        let ext = path.as_ref().extension()?.to_str()?;
        self.formats
            .iter()
            .find(|(registered, _)| registered.eq_ignore_ascii_case(ext))
            .map(|(_, format)| format.clone())
    }

    /// Open and read a grid in one step.
    ///
    /// # Errors
    ///
    /// Returns [`DemError::UnknownFormat`] if no format handles the path,
    /// otherwise whatever the reader reports.
    pub fn read<P: AsRef<Path>>(&self, path: P, config: &ReaderConfig) -> Result<ElevationGrid> {
        let path = path.as_ref();
        let format = self.lookup(path).ok_or_else(|| unknown(path))?;
        let mut reader = format.open_reader(path, config)?;
        let grid = reader.read();
        reader.close()?;
        grid
    }

    /// Write a grid in the format implied by `path`.
    pub fn write<P: AsRef<Path>>(&self, grid: &ElevationGrid, path: P) -> Result<()> {
        let path = path.as_ref();
        let format = self.lookup(path).ok_or_else(|| unknown(path))?;
        format.create_writer(path)?.write(grid)
    }
}

impl fmt::Debug for IoRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.formats.iter().map(|(ext, format)| (ext, format.name())))
            .finish()
    }
}

fn unknown(path: &Path) -> DemError {
    DemError::UnknownFormat {
        path: PathBuf::from(path),
    }
}

static GLOBAL: OnceLock<Arc<IoRegistry>> = OnceLock::new();

/// Install the process-wide registry.
///
/// # Errors
///
/// Returns [`DemError::RegistryInstalled`] if a registry was already
/// installed, or if [`global`] was called first and fixed the defaults.
pub fn install(registry: IoRegistry) -> Result<()> {
    GLOBAL
        .set(Arc::new(registry))
        .map_err(|_| DemError::RegistryInstalled)
}

/// The process-wide registry. Read-only once obtained.
pub fn global() -> Arc<IoRegistry> {
    GLOBAL
        .get_or_init(|| Arc::new(IoRegistry::with_defaults()))
        .clone()
}
