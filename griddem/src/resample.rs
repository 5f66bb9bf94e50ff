//! Box-average resampling to a coarser cell size.

use tracing::debug;

use crate::error::{DemError, Result};
use crate::grid::ElevationGrid;
use crate::storage::StorageKind;

/// Number of source cells aggregated into one target cell along each axis.
///
/// `round(new / old)`, never less than one. Ratios that do not resolve to a
/// whole number are rounded to the nearest step.
pub fn resample_step(old_cell_size: f64, new_cell_size: f64) -> usize {
    let cell_ratio = old_cell_size / new_cell_size;
    ((1.0 / cell_ratio).round() as usize).max(1)
}

impl ElevationGrid {
    /// Produce a new grid with cell size `new_cell_size`, each cell holding
    /// the mean of the finite source cells in its footprint.
    ///
    /// The result keeps this grid's origin and coordinate space and is
    /// stored with `kind`. Averages are passed through the space's vertical
    /// precision model. A footprint with no finite sample stays null.
    ///
    /// # Errors
    ///
    /// Returns [`DemError::InvalidCellSize`] for a non-positive or
    /// non-finite cell size, or a backend error while reading.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let overview = grid.resample(grid.cell_size() * 4.0, StorageKind::Float)?;
    /// ```
    pub fn resample(&self, new_cell_size: f64, kind: StorageKind) -> Result<ElevationGrid> {
        if !(new_cell_size.is_finite() && new_cell_size > 0.0) {
            return Err(DemError::InvalidCellSize(new_cell_size));
        }

        let cell_ratio = self.cell_size() / new_cell_size;
        let step = resample_step(self.cell_size(), new_cell_size);
        let new_width = ((self.width() as f64 * cell_ratio).round() as usize).max(1);
        let new_height = ((self.height() as f64 * cell_ratio).round() as usize).max(1);

        let mut target = ElevationGrid::new(
            self.space(),
            self.min_x(),
            self.min_y(),
            new_width,
            new_height,
            new_cell_size,
            kind,
        )?;
        target.set_rounding(self.rounding());

        let space = self.space();
        for new_y in 0..new_height {
            let y0 = new_y * step;
            let y1 = (y0 + step).min(self.height());
            for new_x in 0..new_width {
                let x0 = new_x * step;
                let x1 = (x0 + step).min(self.width());

                let mut sum = 0.0;
                let mut count = 0u32;
                for y in y0..y1 {
                    for x in x0..x1 {
                        if let Some(z) = self.get_elevation_fast(x, y)? {
                            sum += z;
                            count += 1;
                        }
                    }
                }
                if count > 0 {
                    let mean = space.make_z_precise(sum / count as f64);
                    target.set_elevation(new_x as i64, new_y as i64, mean)?;
                }
            }
        }

        debug!(
            from = %format!("{}x{}", self.width(), self.height()),
            to = %format!("{}x{}", new_width, new_height),
            step,
            "resampled elevation grid"
        );
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::CoordinateSpace;
    use approx::assert_relative_eq;

    fn block_grid() -> ElevationGrid {
        // Every 2x2 block holds 10, 20, 30, 40
        let mut grid = ElevationGrid::new(
            CoordinateSpace::new(26910),
            0.0,
            0.0,
            4,
            4,
            1.0,
            StorageKind::Double,
        )
        .unwrap();
        for y in 0..4i64 {
            for x in 0..4i64 {
                let v = 10.0 * (1 + (x % 2) + 2 * (y % 2)) as f64;
                grid.set_elevation(x, y, v).unwrap();
            }
        }
        grid
    }

    #[test]
    fn test_step() {
        assert_eq!(resample_step(1.0, 2.0), 2);
        assert_eq!(resample_step(1.0, 4.0), 4);
        assert_eq!(resample_step(1.0, 1.0), 1);
        assert_eq!(resample_step(1.0, 2.6), 3);
        // Finer target never aggregates
        assert_eq!(resample_step(2.0, 1.0), 1);
    }

    #[test]
    fn test_block_mean() {
        let grid = block_grid();
        let coarse = grid.resample(2.0, StorageKind::Double).unwrap();

        assert_eq!(coarse.width(), 2);
        assert_eq!(coarse.height(), 2);
        assert_eq!(coarse.cell_size(), 2.0);
        assert_eq!(coarse.min_x(), grid.min_x());
        for y in 0..2 {
            for x in 0..2 {
                assert_eq!(coarse.get_elevation(x, y).unwrap(), Some(25.0));
            }
        }
    }

    #[test]
    fn test_null_block_stays_null() {
        let mut grid = block_grid();
        for (x, y) in [(2, 2), (3, 2), (2, 3), (3, 3)] {
            grid.set_elevation_null(x, y).unwrap();
        }
        // Partially null block averages only finite cells
        grid.set_elevation_null(0, 0).unwrap();

        let coarse = grid.resample(2.0, StorageKind::Float).unwrap();
        assert_eq!(coarse.get_elevation(1, 1).unwrap(), None);
        assert_eq!(coarse.get_elevation(0, 0).unwrap(), Some(30.0));
        assert_eq!(coarse.get_elevation(1, 0).unwrap(), Some(25.0));
    }

    #[test]
    fn test_precision_model_applied() {
        let mut grid = ElevationGrid::new(
            CoordinateSpace::with_scale_z(3005, 10.0),
            0.0,
            0.0,
            2,
            1,
            1.0,
            StorageKind::Double,
        )
        .unwrap();
        grid.set_elevation(0, 0, 1.0).unwrap();
        grid.set_elevation(1, 0, 1.26).unwrap();

        let coarse = grid.resample(2.0, StorageKind::Double).unwrap();
        assert_eq!(coarse.width(), 1);
        assert_relative_eq!(coarse.get_elevation(0, 0).unwrap().unwrap(), 1.1);
    }

    #[test]
    fn test_uneven_edge_footprint() {
        let mut grid = ElevationGrid::new(
            CoordinateSpace::default(),
            0.0,
            0.0,
            5,
            5,
            1.0,
            StorageKind::Double,
        )
        .unwrap();
        for y in 0..5 {
            for x in 0..5 {
                grid.set_elevation(x, y, (x + 1) as f64).unwrap();
            }
        }

        // round(5 * 0.5) = 3 columns; the last footprint is one cell wide
        let coarse = grid.resample(2.0, StorageKind::Double).unwrap();
        assert_eq!(coarse.width(), 3);
        assert_eq!(coarse.get_elevation(0, 0).unwrap(), Some(1.5));
        assert_eq!(coarse.get_elevation(2, 0).unwrap(), Some(5.0));
    }

    #[test]
    fn test_rejects_bad_cell_size() {
        let grid = block_grid();
        assert!(matches!(
            grid.resample(0.0, StorageKind::Double),
            Err(DemError::InvalidCellSize(_))
        ));
    }
}
