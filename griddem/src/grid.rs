//! The elevation grid.
//!
//! This module provides [`ElevationGrid`], a raster of elevation samples
//! addressed by integer `(grid_x, grid_y)` indices. Row 0 is the southern
//! edge (`min_y`), column 0 the western edge (`min_x`).

use tracing::debug;

use crate::bbox::BoundingBox;
use crate::error::{DemError, Result};
use crate::hillshade::{HillshadeParams, Hillshader, ShadedRelief};
use crate::space::{AxisRounding, CoordinateSpace};
use crate::storage::{Storage, StorageKind};

/// One visited cell.
///
/// `x`/`y` are the map coordinates of the cell's minimum corner, which map
/// back to the same cell under both rounding policies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridPoint {
    pub grid_x: usize,
    pub grid_y: usize,
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
}

/// Summary of the values held by a grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridStats {
    /// Smallest finite elevation, `None` if the grid holds no data.
    pub min: Option<f64>,
    /// Largest finite elevation, `None` if the grid holds no data.
    pub max: Option<f64>,
    /// Mean of the finite elevations.
    pub mean: Option<f64>,
    pub finite_count: u64,
    pub null_count: u64,
}

/// A gridded digital elevation model.
///
/// # Example
///
/// ```
/// use griddem::{CoordinateSpace, ElevationGrid, StorageKind};
///
/// let mut grid = ElevationGrid::new(
///     CoordinateSpace::new(26910),
///     500_000.0,
///     5_400_000.0,
///     100,
///     100,
///     1.0,
///     StorageKind::Float,
/// )?;
/// grid.set_elevation(10, 20, 123.5)?;
/// assert_eq!(grid.get_elevation(10, 20)?, Some(123.5));
/// assert_eq!(grid.get_elevation(-1, 0)?, None);
/// # Ok::<(), griddem::DemError>(())
/// ```
#[derive(Debug)]
pub struct ElevationGrid {
    space: CoordinateSpace,
    bounding_box: BoundingBox,
    cell_size: f64,
    width: usize,
    height: usize,
    rounding: AxisRounding,
    storage: Storage,
    revision: u64,
    /// Last rendered relief and the parameters it was rendered with.
    shaded_relief: Option<(HillshadeParams, ShadedRelief)>,
}

impl ElevationGrid {
    /// Create an all-null grid with fresh in-memory storage.
    ///
    /// # Arguments
    ///
    /// * `space` - Coordinate space the origin is expressed in
    /// * `min_x`, `min_y` - South-west corner of the grid
    /// * `width`, `height` - Number of columns and rows
    /// * `cell_size` - Edge length of one square cell
    /// * `kind` - Storage encoding
    ///
    /// # Errors
    ///
    /// Returns an error if a dimension is zero or the cell size is not a
    /// positive finite number.
    pub fn new(
        space: CoordinateSpace,
        min_x: f64,
        min_y: f64,
        width: usize,
        height: usize,
        cell_size: f64,
        kind: StorageKind,
    ) -> Result<Self> {
        validate(width, height, cell_size)?;
        let storage = kind.allocate(width * height);
        Self::with_storage(space, min_x, min_y, width, height, cell_size, storage)
    }

    /// Create a grid over an existing backend, such as a mapped file.
    ///
    /// # Errors
    ///
    /// Returns an error if the dimensions are invalid or the backend does not
    /// hold exactly `width * height` cells.
    pub fn with_storage(
        space: CoordinateSpace,
        min_x: f64,
        min_y: f64,
        width: usize,
        height: usize,
        cell_size: f64,
        storage: Storage,
    ) -> Result<Self> {
        validate(width, height, cell_size)?;
        if storage.len() != width * height {
            return Err(DemError::InvalidDimensions { width, height });
        }
        debug!(
            width,
            height,
            cell_size,
            storage = storage.kind_name(),
            "created elevation grid"
        );

        Ok(Self {
            space,
            bounding_box: BoundingBox::new(
                min_x,
                min_y,
                min_x + width as f64 * cell_size,
                min_y + height as f64 * cell_size,
            ),
            cell_size,
            width,
            height,
            rounding: AxisRounding::default(),
            storage,
            revision: 0,
            shaded_relief: None,
        })
    }

    pub fn space(&self) -> CoordinateSpace {
        self.space
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn min_x(&self) -> f64 {
        self.bounding_box.min_x
    }

    pub fn min_y(&self) -> f64 {
        self.bounding_box.min_y
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.bounding_box
    }

    /// Override the bounding box. Coordinate lookups use its minimum corner
    /// as the origin; the cell size is unchanged.
    pub fn set_bounding_box(&mut self, bounding_box: BoundingBox) {
        self.bounding_box = bounding_box;
        self.invalidate();
    }

    pub fn rounding(&self) -> AxisRounding {
        self.rounding
    }

    /// Change how map coordinates snap to cells.
    pub fn set_rounding(&mut self, rounding: AxisRounding) {
        self.rounding = rounding;
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Incremented by every successful mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Column index for map coordinate `x`. May be out of range.
    pub fn grid_cell_x(&self, x: f64) -> i64 {
        self.rounding
            .x
            .apply((x - self.bounding_box.min_x) / self.cell_size)
    }

    /// Row index for map coordinate `y`. May be out of range.
    pub fn grid_cell_y(&self, y: f64) -> i64 {
        self.rounding
            .y
            .apply((y - self.bounding_box.min_y) / self.cell_size)
    }

    /// X of the western edge of column `grid_x`.
    pub fn cell_min_x(&self, grid_x: i64) -> f64 {
        self.bounding_box.min_x + grid_x as f64 * self.cell_size
    }

    /// Y of the southern edge of row `grid_y`.
    pub fn cell_min_y(&self, grid_y: i64) -> f64 {
        self.bounding_box.min_y + grid_y as f64 * self.cell_size
    }

    /// Map coordinates of the centre of a cell.
    pub fn cell_center(&self, grid_x: i64, grid_y: i64) -> (f64, f64) {
        let half = self.cell_size / 2.0;
        (
            self.cell_min_x(grid_x) + half,
            self.cell_min_y(grid_y) + half,
        )
    }

    fn index(&self, grid_x: i64, grid_y: i64) -> Option<usize> {
        if grid_x < 0 || grid_y < 0 {
            return None;
        }
        let (x, y) = (grid_x as usize, grid_y as usize);
        if x < self.width && y < self.height {
            Some(y * self.width + x)
        } else {
            None
        }
    }

    /// Elevation of a cell, or `None` for no data.
    ///
    /// Indices outside the grid also return `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Only a closed direct-file backend fails.
    pub fn get_elevation(&self, grid_x: i64, grid_y: i64) -> Result<Option<f64>> {
        match self.index(grid_x, grid_y) {
            Some(index) => self.storage.get(index),
            None => Ok(None),
        }
    }

    /// Elevation of a cell without a bounds check.
    ///
    /// The caller guarantees `grid_x < width` and `grid_y < height`; a
    /// violation panics or reads the wrong cell.
    #[inline]
    pub fn get_elevation_fast(&self, grid_x: usize, grid_y: usize) -> Result<Option<f64>> {
        debug_assert!(grid_x < self.width && grid_y < self.height);
        self.storage.get(grid_y * self.width + grid_x)
    }

    /// Elevation at a map coordinate using the grid's rounding policy.
    pub fn get_value(&self, x: f64, y: f64) -> Result<Option<f64>> {
        self.get_elevation(self.grid_cell_x(x), self.grid_cell_y(y))
    }

    /// `true` if the cell is in range and holds a finite value.
    pub fn has_elevation(&self, grid_x: i64, grid_y: i64) -> Result<bool> {
        Ok(self.get_elevation(grid_x, grid_y)?.is_some())
    }

    /// `true` if the cell holds no data or is out of range.
    pub fn is_null(&self, grid_x: i64, grid_y: i64) -> Result<bool> {
        Ok(self.get_elevation(grid_x, grid_y)?.is_none())
    }

    /// Store an elevation. Non-finite values store no data.
    ///
    /// Returns `Ok(false)` without touching the grid if the index is out of range.
    pub fn set_elevation(&mut self, grid_x: i64, grid_y: i64, elevation: f64) -> Result<bool> {
        self.write(grid_x, grid_y, Some(elevation))
    }

    /// Mark a cell as no data.
    ///
    /// Returns `Ok(false)` without touching the grid if the index is out of range.
    pub fn set_elevation_null(&mut self, grid_x: i64, grid_y: i64) -> Result<bool> {
        self.write(grid_x, grid_y, None)
    }

    fn write(&mut self, grid_x: i64, grid_y: i64, value: Option<f64>) -> Result<bool> {
        match self.index(grid_x, grid_y) {
            Some(index) => {
                self.storage.set(index, value)?;
                self.invalidate();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Set every cell to no data.
    pub fn clear(&mut self) -> Result<()> {
        self.storage.clear()?;
        self.invalidate();
        Ok(())
    }

    /// Drop cached derived products after a mutation.
    fn invalidate(&mut self) {
        self.revision += 1;
        self.shaded_relief = None;
    }

    /// Visit every finite elevation in row-major order, row 0 first.
    pub fn for_each_elevation_finite(&self, mut visit: impl FnMut(f64)) -> Result<()> {
        for index in 0..self.storage.len() {
            if let Some(z) = self.storage.get(index)? {
                visit(z);
            }
        }
        Ok(())
    }

    /// Visit every cell, null or not, in row-major order.
    pub fn for_each_point(&self, mut visit: impl FnMut(GridPoint)) -> Result<()> {
        for point in self.points() {
            visit(point?);
        }
        Ok(())
    }

    /// Visit every finite cell, optionally only those whose point falls
    /// inside `target`.
    pub fn for_each_point_finite(
        &self,
        target: Option<&BoundingBox>,
        mut visit: impl FnMut(GridPoint),
    ) -> Result<()> {
        for grid_y in 0..self.height {
            let y = self.cell_min_y(grid_y as i64);
            if let Some(t) = target {
                if y < t.min_y || y > t.max_y {
                    continue;
                }
            }
            for grid_x in 0..self.width {
                let x = self.cell_min_x(grid_x as i64);
                if let Some(t) = target {
                    if x < t.min_x || x > t.max_x {
                        continue;
                    }
                }
                if let Some(z) = self.get_elevation_fast(grid_x, grid_y)? {
                    visit(GridPoint {
                        grid_x,
                        grid_y,
                        x,
                        y,
                        z: Some(z),
                    });
                }
            }
        }
        Ok(())
    }

    /// Iterator over every cell in row-major order. Each call starts over.
    pub fn points(&self) -> Points<'_> {
        Points {
            grid: self,
            index: 0,
            finite_only: false,
        }
    }

    /// Iterator over the finite cells in row-major order.
    pub fn points_finite(&self) -> Points<'_> {
        Points {
            grid: self,
            index: 0,
            finite_only: true,
        }
    }

    /// Copy every finite cell of `other` into this grid.
    ///
    /// `other`'s origin is snapped to the nearest cell of this grid; cells
    /// falling outside this grid are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`DemError::IncompatibleCellSize`] if the cell sizes differ.
    /// A backend failure part-way leaves earlier cells written.
    pub fn merge_from(&mut self, other: &ElevationGrid) -> Result<()> {
        if !same_cell_size(self.cell_size, other.cell_size) {
            return Err(DemError::IncompatibleCellSize {
                expected: self.cell_size,
                actual: other.cell_size,
            });
        }

        let offset_x = ((other.min_x() - self.min_x()) / self.cell_size).round() as i64;
        let offset_y = ((other.min_y() - self.min_y()) / self.cell_size).round() as i64;

        let mut copied = 0u64;
        for other_y in 0..other.height {
            let grid_y = other_y as i64 + offset_y;
            if grid_y < 0 || grid_y >= self.height as i64 {
                continue;
            }
            for other_x in 0..other.width {
                let grid_x = other_x as i64 + offset_x;
                let Some(index) = self.index(grid_x, grid_y) else {
                    continue;
                };
                if let Some(z) = other.get_elevation_fast(other_x, other_y)? {
                    if copied == 0 {
                        self.invalidate();
                    }
                    self.storage.set(index, Some(z))?;
                    copied += 1;
                }
            }
        }

        debug!(copied, offset_x, offset_y, "merged elevation grid");
        Ok(())
    }

    /// Null every cell of this grid where `other` has a finite value at the
    /// cell's point.
    pub fn clear_null_where_covered(&mut self, other: &ElevationGrid) -> Result<()> {
        let mut cleared = 0u64;
        for grid_y in 0..self.height {
            let y = self.cell_min_y(grid_y as i64);
            for grid_x in 0..self.width {
                let x = self.cell_min_x(grid_x as i64);
                if other.get_value(x, y)?.is_some() {
                    if cleared == 0 {
                        self.invalidate();
                    }
                    self.storage.set(grid_y * self.width + grid_x, None)?;
                    cleared += 1;
                }
            }
        }

        debug!(cleared, "cleared cells covered by another grid");
        Ok(())
    }

    /// Min, max, mean and counts over all cells.
    pub fn statistics(&self) -> Result<GridStats> {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        let mut finite_count = 0u64;

        self.for_each_elevation_finite(|z| {
            min = min.min(z);
            max = max.max(z);
            sum += z;
            finite_count += 1;
        })?;

        let null_count = self.storage.len() as u64 - finite_count;
        if finite_count == 0 {
            return Ok(GridStats {
                min: None,
                max: None,
                mean: None,
                finite_count,
                null_count,
            });
        }
        Ok(GridStats {
            min: Some(min),
            max: Some(max),
            mean: Some(sum / finite_count as f64),
            finite_count,
            null_count,
        })
    }

    /// Duplicate this grid into fresh in-memory storage of another encoding.
    pub fn copy_to(&self, kind: StorageKind) -> Result<ElevationGrid> {
        let mut copy = ElevationGrid::new(
            self.space,
            self.min_x(),
            self.min_y(),
            self.width,
            self.height,
            self.cell_size,
            kind,
        )?;
        copy.bounding_box = self.bounding_box;
        copy.rounding = self.rounding;
        for index in 0..self.storage.len() {
            if let Some(z) = self.storage.get(index)? {
                copy.storage.set(index, Some(z))?;
            }
        }
        Ok(copy)
    }

    /// Shaded relief for `shader`'s parameters, rendered on first access and
    /// reused until the grid is mutated or different parameters are asked for.
    pub fn shaded_relief(&mut self, shader: &Hillshader) -> Result<&ShadedRelief> {
        let params = *shader.params();
        let cached = match self.shaded_relief.take() {
            Some((p, image)) if p == params => (p, image),
            _ => (params, shader.render(self)?),
        };
        let (_, image) = self.shaded_relief.insert(cached);
        Ok(image)
    }

    /// Release the backing file, if any. Further access fails.
    pub fn close(&mut self) -> Result<()> {
        self.shaded_relief = None;
        self.storage.close()
    }

    pub fn is_open(&self) -> bool {
        self.storage.is_open()
    }
}

/// Row-major iterator over a grid's cells; see [`ElevationGrid::points`].
pub struct Points<'a> {
    grid: &'a ElevationGrid,
    index: usize,
    finite_only: bool,
}

impl Iterator for Points<'_> {
    type Item = Result<GridPoint>;

    fn next(&mut self) -> Option<Self::Item> {
        let len = self.grid.storage.len();
        while self.index < len {
            let index = self.index;
            self.index += 1;

            let z = match self.grid.storage.get(index) {
                Ok(z) => z,
                Err(e) => {
                    // Stop after reporting the failure once
                    self.index = len;
                    return Some(Err(e));
                }
            };
            if self.finite_only && z.is_none() {
                continue;
            }
            let grid_x = index % self.grid.width;
            let grid_y = index / self.grid.width;
            return Some(Ok(GridPoint {
                grid_x,
                grid_y,
                x: self.grid.cell_min_x(grid_x as i64),
                y: self.grid.cell_min_y(grid_y as i64),
                z,
            }));
        }
        None
    }
}

fn validate(width: usize, height: usize, cell_size: f64) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(DemError::InvalidDimensions { width, height });
    }
    if !(cell_size.is_finite() && cell_size > 0.0) {
        return Err(DemError::InvalidCellSize(cell_size));
    }
    Ok(())
}

fn same_cell_size(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::CellRounding;

    fn grid(width: usize, height: usize, kind: StorageKind) -> ElevationGrid {
        ElevationGrid::new(
            CoordinateSpace::new(3005),
            1000.0,
            2000.0,
            width,
            height,
            1.0,
            kind,
        )
        .unwrap()
    }

    #[test]
    fn test_new_validates() {
        let space = CoordinateSpace::default();
        assert!(matches!(
            ElevationGrid::new(space, 0.0, 0.0, 0, 5, 1.0, StorageKind::Double),
            Err(DemError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            ElevationGrid::new(space, 0.0, 0.0, 5, 5, -1.0, StorageKind::Double),
            Err(DemError::InvalidCellSize(_))
        ));
        assert!(matches!(
            ElevationGrid::new(space, 0.0, 0.0, 5, 5, f64::NAN, StorageKind::Double),
            Err(DemError::InvalidCellSize(_))
        ));
    }

    #[test]
    fn test_bounding_box_derived() {
        let g = ElevationGrid::new(
            CoordinateSpace::default(),
            10.0,
            20.0,
            4,
            3,
            2.5,
            StorageKind::Short,
        )
        .unwrap();
        assert_eq!(g.bounding_box(), BoundingBox::new(10.0, 20.0, 20.0, 27.5));
    }

    #[test]
    fn test_out_of_range_is_no_data() {
        let mut g = grid(10, 10, StorageKind::Double);
        for x in 0..10 {
            for y in 0..10 {
                g.set_elevation(x, y, 1.0).unwrap();
            }
        }
        assert_eq!(g.get_elevation(-1, 0).unwrap(), None);
        assert_eq!(g.get_elevation(10, 5).unwrap(), None);
        assert_eq!(g.get_elevation(5, 10).unwrap(), None);
        assert_eq!(g.get_elevation(5, 5).unwrap(), Some(1.0));

        // Out of range writes are ignored
        assert!(!g.set_elevation(10, 10, 5.0).unwrap());
        assert!(!g.set_elevation_null(-3, 0).unwrap());
    }

    #[test]
    fn test_set_null_idempotent() {
        let mut g = grid(3, 3, StorageKind::ScaledInt { scale: 100.0 });
        g.set_elevation(1, 1, 7.25).unwrap();
        assert_eq!(g.get_elevation(1, 1).unwrap(), Some(7.25));

        assert!(g.set_elevation_null(1, 1).unwrap());
        assert_eq!(g.get_elevation(1, 1).unwrap(), None);
        assert!(g.set_elevation_null(1, 1).unwrap());
        assert_eq!(g.get_elevation(1, 1).unwrap(), None);
    }

    #[test]
    fn test_coordinate_mapping_policy() {
        let mut g = grid(10, 10, StorageKind::Double);

        // X floors, Y rounds
        assert_eq!(g.grid_cell_x(1002.7), 2);
        assert_eq!(g.grid_cell_y(2002.7), 3);
        assert_eq!(g.grid_cell_y(2002.2), 2);

        g.set_rounding(AxisRounding {
            x: CellRounding::Floor,
            y: CellRounding::Floor,
        });
        assert_eq!(g.grid_cell_y(2002.7), 2);
    }

    #[test]
    fn test_get_value() {
        let mut g = grid(10, 10, StorageKind::Float);
        g.set_elevation(3, 4, 55.5).unwrap();

        assert_eq!(g.get_value(1003.5, 2004.0).unwrap(), Some(55.5));
        assert_eq!(g.get_value(0.0, 0.0).unwrap(), None);
    }

    #[test]
    fn test_iteration_order_row_major() {
        let mut g = grid(3, 2, StorageKind::Double);
        g.set_elevation(2, 0, 1.0).unwrap();
        g.set_elevation(0, 1, 2.0).unwrap();
        g.set_elevation(1, 1, 3.0).unwrap();

        let mut seen = Vec::new();
        g.for_each_elevation_finite(|z| seen.push(z)).unwrap();
        assert_eq!(seen, vec![1.0, 2.0, 3.0]);

        let all: Vec<_> = g.points().map(|p| p.unwrap()).collect();
        assert_eq!(all.len(), 6);
        assert_eq!((all[0].grid_x, all[0].grid_y), (0, 0));
        assert_eq!((all[3].grid_x, all[3].grid_y), (0, 1));
        assert_eq!(all[3].x, 1000.0);
        assert_eq!(all[3].y, 2001.0);

        // Restartable
        assert_eq!(g.points_finite().count(), 3);
        assert_eq!(g.points_finite().count(), 3);

        let mut count = 0;
        g.for_each_point(|_| count += 1).unwrap();
        assert_eq!(count, 6);
    }

    #[test]
    fn test_points_map_back_to_cells() {
        let mut g = grid(4, 4, StorageKind::Double);
        g.set_elevation(3, 2, 9.0).unwrap();

        for point in g.points_finite() {
            let point = point.unwrap();
            assert_eq!(g.grid_cell_x(point.x), point.grid_x as i64);
            assert_eq!(g.grid_cell_y(point.y), point.grid_y as i64);
        }
    }

    #[test]
    fn test_for_each_point_finite_clipped() {
        let mut g = grid(5, 5, StorageKind::Double);
        for x in 0..5 {
            for y in 0..5 {
                g.set_elevation(x, y, (x + y) as f64).unwrap();
            }
        }

        let target = BoundingBox::new(1001.0, 2001.0, 1002.0, 2002.0);
        let mut visited = Vec::new();
        g.for_each_point_finite(Some(&target), |p| visited.push((p.grid_x, p.grid_y)))
            .unwrap();
        assert_eq!(visited, vec![(1, 1), (2, 1), (1, 2), (2, 2)]);

        let mut all = 0;
        g.for_each_point_finite(None, |_| all += 1).unwrap();
        assert_eq!(all, 25);
    }

    #[test]
    fn test_merge_alignment() {
        let mut target = grid(10, 10, StorageKind::Double);
        let mut source = ElevationGrid::new(
            CoordinateSpace::new(3005),
            1002.0,
            2002.0,
            5,
            5,
            1.0,
            StorageKind::Double,
        )
        .unwrap();
        for x in 0..5 {
            for y in 0..5 {
                source.set_elevation(x, y, (10 * y + x) as f64).unwrap();
            }
        }

        target.merge_from(&source).unwrap();

        for x in 0..10i64 {
            for y in 0..10i64 {
                let v = target.get_elevation(x, y).unwrap();
                if (2..=6).contains(&x) && (2..=6).contains(&y) {
                    assert_eq!(v, Some((10 * (y - 2) + (x - 2)) as f64));
                } else {
                    assert_eq!(v, None);
                }
            }
        }
    }

    #[test]
    fn test_merge_clips_and_skips_nulls() {
        let mut target = grid(4, 4, StorageKind::Double);
        target.set_elevation(3, 3, 99.0).unwrap();

        let mut source = ElevationGrid::new(
            CoordinateSpace::new(3005),
            1002.0,
            2002.0,
            4,
            4,
            1.0,
            StorageKind::Double,
        )
        .unwrap();
        source.set_elevation(0, 0, 1.0).unwrap();
        source.set_elevation(3, 3, 2.0).unwrap(); // lands outside target

        target.merge_from(&source).unwrap();
        assert_eq!(target.get_elevation(2, 2).unwrap(), Some(1.0));
        // Null source cell does not overwrite
        assert_eq!(target.get_elevation(3, 3).unwrap(), Some(99.0));
    }

    #[test]
    fn test_merge_rejects_different_cell_size() {
        let mut target = grid(10, 10, StorageKind::Double);
        let source = ElevationGrid::new(
            CoordinateSpace::new(3005),
            1000.0,
            2000.0,
            5,
            5,
            2.0,
            StorageKind::Double,
        )
        .unwrap();

        let result = target.merge_from(&source);
        assert!(matches!(
            result,
            Err(DemError::IncompatibleCellSize {
                expected,
                actual
            }) if expected == 1.0 && actual == 2.0
        ));
    }

    #[test]
    fn test_clear_null_where_covered() {
        let mut target = grid(4, 4, StorageKind::Double);
        for x in 0..4 {
            for y in 0..4 {
                target.set_elevation(x, y, 5.0).unwrap();
            }
        }
        let mut cover = grid(2, 2, StorageKind::Double);
        cover.set_elevation(0, 0, 1.0).unwrap();
        cover.set_elevation(1, 1, 1.0).unwrap();

        target.clear_null_where_covered(&cover).unwrap();

        assert_eq!(target.get_elevation(0, 0).unwrap(), None);
        assert_eq!(target.get_elevation(1, 1).unwrap(), None);
        assert_eq!(target.get_elevation(1, 0).unwrap(), Some(5.0));
        assert_eq!(target.get_elevation(3, 3).unwrap(), Some(5.0));
    }

    #[test]
    fn test_statistics() {
        let mut g = grid(2, 2, StorageKind::Double);
        let empty = g.statistics().unwrap();
        assert_eq!(empty.min, None);
        assert_eq!(empty.null_count, 4);

        g.set_elevation(0, 0, 10.0).unwrap();
        g.set_elevation(1, 0, 30.0).unwrap();
        let stats = g.statistics().unwrap();
        assert_eq!(stats.min, Some(10.0));
        assert_eq!(stats.max, Some(30.0));
        assert_eq!(stats.mean, Some(20.0));
        assert_eq!(stats.finite_count, 2);
        assert_eq!(stats.null_count, 2);
    }

    #[test]
    fn test_copy_to_other_encoding() {
        let mut g = grid(3, 3, StorageKind::Double);
        g.set_elevation(1, 2, 12.75).unwrap();

        let copy = g.copy_to(StorageKind::Short).unwrap();
        assert_eq!(copy.storage().kind_name(), "short");
        assert_eq!(copy.get_elevation(1, 2).unwrap(), Some(12.0));
        assert_eq!(copy.get_elevation(0, 0).unwrap(), None);
        assert_eq!(copy.bounding_box(), g.bounding_box());
    }

    #[test]
    fn test_mutation_bumps_revision() {
        let mut g = grid(2, 2, StorageKind::Double);
        let start = g.revision();
        g.set_elevation(0, 0, 1.0).unwrap();
        assert!(g.revision() > start);

        let after_set = g.revision();
        g.set_elevation(5, 5, 1.0).unwrap(); // out of range, no mutation
        assert_eq!(g.revision(), after_set);

        g.clear().unwrap();
        assert!(g.revision() > after_set);
        assert_eq!(g.get_elevation(0, 0).unwrap(), None);
    }

    #[test]
    fn test_with_storage_checks_length() {
        let storage = StorageKind::Double.allocate(5);
        let result = ElevationGrid::with_storage(
            CoordinateSpace::default(),
            0.0,
            0.0,
            2,
            2,
            1.0,
            storage,
        );
        assert!(result.is_err());
    }
}
