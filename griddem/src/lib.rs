//! # griddem - Gridded Elevation Model Engine
//!
//! In-memory and file-backed rasters of elevation samples, with the
//! operations a terrain pipeline needs on them.
//!
//! ## Features
//!
//! - **Pluggable storage**: 8-byte or 4-byte floats, scaled integers, 16-bit
//!   integers, or cells read straight from a memory-mapped file
//! - **Resampling**: block-mean to a coarser cell size
//! - **Hillshading**: Horn slope/aspect with a cached shaded relief, PNG export
//! - **Boundary tracing**: the outline of the populated cells as one polygon
//! - **Readers and writers**: SRTM `.hgt` built in, more via [`IoRegistry`]
//! - **Catalog**: LRU cache of grids loaded from a data directory
//!
//! ## Quick Start
//!
//! ```ignore
//! use griddem::{io, ReaderConfig, Hillshader};
//!
//! let mut grid = io::global().read("/data/N35E138.hgt", &ReaderConfig::default())?;
//! println!("Elevation: {:?}", grid.get_value(138.7274, 35.3606)?);
//!
//! let coarse = grid.resample(grid.cell_size() * 4.0, griddem::StorageKind::Float)?;
//! let relief = grid.shaded_relief(&Hillshader::default())?;
//! relief.write_png("relief.png")?;
//! let outline = coarse.trace_boundary()?;
//! ```
//!
//! ## Grid Layout
//!
//! A grid covers `width × height` square cells of side `cell_size`, starting
//! at `(min_x, min_y)`. Row 0 is the southern edge. A map coordinate maps to
//! a cell through the grid's [`AxisRounding`]: X floors and Y rounds to
//! nearest unless a reader sets otherwise.
//!
//! ## Data Sources
//!
//! SRTM tiles can be downloaded from:
//! - <https://dwtkns.com/srtm30m/>
//! - <https://earthexplorer.usgs.gov/>

pub mod bbox;
pub mod boundary;
pub mod catalog;
pub mod error;
pub mod filename;
pub mod grid;
pub mod hillshade;
pub mod io;
pub mod resample;
pub mod space;
pub mod storage;

#[cfg(feature = "geojson")]
pub mod geojson;

// Re-export main types at crate root for convenience
pub use bbox::BoundingBox;
pub use boundary::{BoundaryTrace, Vertex};
pub use catalog::{CacheStats, GridCatalog, GridCatalogBuilder, PreloadStats};
pub use error::{DemError, Result};
pub use grid::{ElevationGrid, GridPoint, GridStats};
pub use hillshade::{HillshadeParams, Hillshader, ShadedRelief};
pub use io::{GridFormat, GridReader, GridWriter, IoRegistry, ReaderConfig};
pub use space::{AxisRounding, CellRounding, CoordinateSpace};
pub use storage::{Storage, StorageKind};
