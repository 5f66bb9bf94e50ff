//! SRTM `.hgt` reader and writer.
//!
//! An `.hgt` file is a headerless square of 16-bit big-endian signed
//! integers, north row first, with `-32768` marking voids. Samples are
//! posts on a regular lattice whose outer rows and columns lie exactly on
//! the whole-degree edges of the tile, so a file of `n × n` samples spans
//! one degree with a spacing of `1 / (n - 1)`. The tile's south-west corner
//! comes from the file name (see [`crate::filename`]).
//!
//! - **SRTM1**: 3601×3601 samples, 1 arc-second (~30m) resolution
//! - **SRTM3**: 1201×1201 samples, 3 arc-second (~90m) resolution
//!
//! Any other square size is accepted as well, which is what
//! [`resample_posts`] and [`HgtWriter`] produce for thinned tiles.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{DemError, Result};
use crate::filename::{parse_tile_name, TileCorner};
use crate::grid::ElevationGrid;
use crate::io::{GridFormat, GridReader, GridWriter, ReaderConfig};
use crate::space::{AxisRounding, CoordinateSpace};
use crate::storage::{
    ByteOrder, CellCodec, DirectFileStorage, FileLayout, RowOrder, ScaledInt16Codec, Storage,
    StorageKind,
};

/// Number of samples per row/column for SRTM1.
pub const SRTM1_SAMPLES: usize = 3601;

/// Number of samples per row/column for SRTM3.
pub const SRTM3_SAMPLES: usize = 1201;

/// Value indicating no data (void) in `.hgt` files.
pub const VOID_VALUE: i16 = -32768;

/// WGS84 geographic coordinates, the space `.hgt` tiles are published in.
pub const WGS84: CoordinateSpace = CoordinateSpace::new(4326);

const LAYOUT: FileLayout = FileLayout {
    header_size: 0,
    row_order: RowOrder::NorthFirst,
};

fn codec() -> Box<dyn CellCodec> {
    Box::new(ScaledInt16Codec {
        scale: 1.0,
        byte_order: ByteOrder::Big,
    })
}

/// Resolution of an `.hgt` file, detected from its size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HgtResolution {
    /// 1 arc-second, 3601 samples per side.
    Srtm1,
    /// 3 arc-second, 1201 samples per side.
    Srtm3,
    /// Any other square of at least 2 samples per side.
    Custom(usize),
}

impl HgtResolution {
    /// Detect the resolution from a file size in bytes.
    ///
    /// # Errors
    ///
    /// Returns [`DemError::InvalidFileSize`] unless the size is
    /// `2 * n * n` for some `n >= 2`.
    pub fn from_file_size(size: u64) -> Result<Self> {
        let invalid = || DemError::InvalidFileSize {
            size: size as usize,
        };
        if size % 2 != 0 {
            return Err(invalid());
        }
        let cells = size / 2;
        let n = (cells as f64).sqrt().round() as u64;
        if n < 2 || n * n != cells {
            return Err(invalid());
        }
        Ok(match n as usize {
            SRTM1_SAMPLES => HgtResolution::Srtm1,
            SRTM3_SAMPLES => HgtResolution::Srtm3,
            n => HgtResolution::Custom(n),
        })
    }

    /// Samples per row and column.
    pub fn samples(&self) -> usize {
        match self {
            HgtResolution::Srtm1 => SRTM1_SAMPLES,
            HgtResolution::Srtm3 => SRTM3_SAMPLES,
            HgtResolution::Custom(n) => *n,
        }
    }

    /// Post spacing in degrees.
    pub fn cell_size(&self) -> f64 {
        1.0 / (self.samples() - 1) as f64
    }
}

/// The `.hgt` format as registered in an [`IoRegistry`](crate::io::IoRegistry).
#[derive(Debug, Clone, Copy, Default)]
pub struct HgtFormat;

impl GridFormat for HgtFormat {
    fn name(&self) -> &'static str {
        "hgt"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["hgt"]
    }

    fn open_reader(&self, path: &Path, config: &ReaderConfig) -> Result<Box<dyn GridReader>> {
        Ok(Box::new(HgtReader::new(path, config.clone())))
    }

    fn create_writer(&self, path: &Path) -> Result<Box<dyn GridWriter>> {
        Ok(Box::new(HgtWriter::new(path)))
    }
}

/// Reads one `.hgt` file into a grid.
///
/// By default the file is memory-mapped read-only, so opening even an SRTM1
/// tile is instant; [`ReaderConfig::in_memory`] copies it into a short grid
/// instead.
///
/// Sample `k` of a row lies on `corner + k * cell_size`; the grid's origin is
/// shifted half a cell south-west so each post sits at its cell's centre and
/// lookups round to the nearest post.
///
/// # Example
///
/// ```ignore
/// use griddem::io::{hgt::HgtReader, GridReader, ReaderConfig};
///
/// let grid = HgtReader::new("N35E138.hgt", ReaderConfig::default()).read()?;
/// let elevation = grid.get_value(138.7, 35.5)?;
/// ```
#[derive(Debug, Clone)]
pub struct HgtReader {
    path: PathBuf,
    config: ReaderConfig,
    corner: Option<TileCorner>,
}

impl HgtReader {
    pub fn new<P: AsRef<Path>>(path: P, config: ReaderConfig) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            config,
            corner: None,
        }
    }

    /// Place the grid at an explicit corner instead of parsing the file name.
    pub fn with_corner(mut self, corner: TileCorner) -> Self {
        self.corner = Some(corner);
        self
    }

    fn corner(&self) -> TileCorner {
        if let Some(corner) = self.corner.or_else(|| parse_tile_name(&self.path)) {
            return corner;
        }
        warn!(path = %self.path.display(), "file name is not a tile name, placing grid at 0,0");
        TileCorner::new(0, 0)
    }
}

impl GridReader for HgtReader {
    /// # Errors
    ///
    /// Returns an error if the file does not exist, cannot be mapped, or its
    /// size is not a square of 16-bit samples.
    fn read(&mut self) -> Result<ElevationGrid> {
        if !self.path.exists() {
            return Err(DemError::FileNotFound {
                path: self.path.clone(),
            });
        }
        let size = std::fs::metadata(&self.path)?.len();
        let resolution = HgtResolution::from_file_size(size)?;
        let n = resolution.samples();
        let cell_size = resolution.cell_size();

        let corner = self.corner();
        let space = self.config.coordinate_space.unwrap_or(WGS84);
        let min_x = corner.lon as f64 - cell_size / 2.0;
        let min_y = corner.lat as f64 - cell_size / 2.0;

        let mapped = DirectFileStorage::open(&self.path, n, n, LAYOUT, codec(), self.config.writable)?;
        let mut grid = ElevationGrid::with_storage(
            space,
            min_x,
            min_y,
            n,
            n,
            cell_size,
            Storage::DirectFile(mapped),
        )?;
        if self.config.in_memory {
            // Dropping the mapped grid unmaps the file
            grid = grid.copy_to(StorageKind::Short)?;
        }
        grid.set_rounding(AxisRounding::FLOOR);

        debug!(
            path = %self.path.display(),
            samples = n,
            in_memory = self.config.in_memory,
            "read hgt grid"
        );
        Ok(grid)
    }
}

/// Writes a grid as a `.hgt` file.
///
/// Cells are rounded to whole units and clamped to the 16-bit range; nulls
/// become [`VOID_VALUE`]. The grid must already be a post lattice that reads
/// back unchanged: `n × n` cells of size `1 / (n - 1)` whose south-west post
/// sits on a whole degree, matching the file name when it is a tile name.
/// [`resample_posts`] produces such grids from a read tile.
#[derive(Debug, Clone)]
pub struct HgtWriter {
    path: PathBuf,
}

impl HgtWriter {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Tile corner the grid's south-west post lies on.
    fn check_post_lattice(&self, grid: &ElevationGrid) -> Result<TileCorner> {
        let (width, height) = (grid.width(), grid.height());
        if width != height || width < 2 {
            return Err(self.unsupported(format!(
                "grid is {}x{}, hgt needs a square of at least 2x2 posts",
                width, height
            )));
        }

        let spacing = HgtResolution::Custom(width).cell_size();
        if (grid.cell_size() - spacing).abs() > 1e-9 * spacing {
            return Err(self.unsupported(format!(
                "cell size {} does not match the post spacing {} of {} samples",
                grid.cell_size(),
                spacing,
                width
            )));
        }

        let half = grid.cell_size() / 2.0;
        let (corner_x, corner_y) = (grid.min_x() + half, grid.min_y() + half);
        if (corner_x - corner_x.round()).abs() > 1e-9 || (corner_y - corner_y.round()).abs() > 1e-9
        {
            return Err(self.unsupported(format!(
                "first post at ({}, {}) is not on a whole degree",
                corner_x, corner_y
            )));
        }
        let corner = TileCorner::new(corner_x.round() as i32, corner_y.round() as i32);

        if let Some(named) = parse_tile_name(&self.path) {
            if named != corner {
                return Err(self.unsupported(format!(
                    "grid covers tile {} but the file is named for {}",
                    corner.stem(),
                    named.stem()
                )));
            }
        }
        Ok(corner)
    }

    fn unsupported(&self, reason: String) -> DemError {
        DemError::Unsupported {
            operation: format!("writing {}: {}", self.path.display(), reason),
        }
    }
}

impl GridWriter for HgtWriter {
    /// # Errors
    ///
    /// Returns [`DemError::Unsupported`] if the grid is not a post lattice
    /// that would read back with the same size, spacing and placement.
    fn write(&mut self, grid: &ElevationGrid) -> Result<()> {
        let corner = self.check_post_lattice(grid)?;
        let width = grid.width();

        let mut file = DirectFileStorage::create(&self.path, width, width, LAYOUT, codec())?;
        for point in grid.points_finite() {
            let point = point?;
            file.set(point.grid_y * width + point.grid_x, point.z)?;
        }
        file.close()?;

        debug!(path = %self.path.display(), samples = width, tile = %corner.stem(), "wrote hgt grid");
        Ok(())
    }
}

/// Thin a post grid by `step`, keeping every `step`-th post.
///
/// Each kept post holds the mean of the finite posts within `step / 2` of it
/// on both axes, so the edge posts stay on the tile edges and the result can
/// be written with [`HgtWriter`]. An `n`-post side becomes
/// `(n - 1) / step + 1` posts.
///
/// # Errors
///
/// Returns [`DemError::Unsupported`] unless `step >= 1` divides `n - 1` on
/// both axes.
///
/// # Example
///
/// ```ignore
/// // SRTM1 to SRTM3
/// let srtm3 = resample_posts(&srtm1, 3, StorageKind::Short)?;
/// ```
pub fn resample_posts(grid: &ElevationGrid, step: usize, kind: StorageKind) -> Result<ElevationGrid> {
    let (width, height) = (grid.width(), grid.height());
    if step == 0 || (width - 1) % step != 0 || (height - 1) % step != 0 {
        return Err(DemError::Unsupported {
            operation: format!(
                "thinning {}x{} posts by {} (step must divide the post count minus one)",
                width, height, step
            ),
        });
    }

    let new_width = (width - 1) / step + 1;
    let new_height = (height - 1) / step + 1;
    let cell_size = grid.cell_size() * step as f64;
    let shift = (grid.cell_size() - cell_size) / 2.0;

    let mut target = ElevationGrid::new(
        grid.space(),
        grid.min_x() + shift,
        grid.min_y() + shift,
        new_width,
        new_height,
        cell_size,
        kind,
    )?;
    target.set_rounding(grid.rounding());

    let radius = step / 2;
    let space = grid.space();
    for new_y in 0..new_height {
        let center_y = new_y * step;
        let y0 = center_y.saturating_sub(radius);
        let y1 = (center_y + radius).min(height - 1);
        for new_x in 0..new_width {
            let center_x = new_x * step;
            let x0 = center_x.saturating_sub(radius);
            let x1 = (center_x + radius).min(width - 1);

            let mut sum = 0.0;
            let mut count = 0u32;
            for y in y0..=y1 {
                for x in x0..=x1 {
                    if let Some(z) = grid.get_elevation_fast(x, y)? {
                        sum += z;
                        count += 1;
                    }
                }
            }
            if count > 0 {
                target.set_elevation(new_x as i64, new_y as i64, space.make_z_precise(sum / count as f64))?;
            }
        }
    }

    debug!(
        from = width,
        to = new_width,
        step,
        "thinned hgt posts"
    );
    Ok(target)
}
