//! Shaded relief (Horn's method).
//!
//! Slope and aspect come from the 3x3 neighbourhood of each cell:
//!
//! ```text
//!   a b c      north (grid_y + 1)
//!   d e f
//!   g h i      south (grid_y - 1)
//! ```
//!
//! Neighbours outside the grid or without data take the centre value.

use std::f64::consts::{FRAC_PI_2, PI};
use std::path::Path;

use image::{ImageFormat, Rgba, RgbaImage};
use serde::Deserialize;
use tracing::debug;

use crate::error::Result;
use crate::grid::ElevationGrid;

/// Pixel value written for cells without data: fully transparent.
pub const NO_DATA_PIXEL: u32 = 0;

/// Light source and vertical exaggeration.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct HillshadeParams {
    /// Angle of the light source above the horizon's normal, in degrees.
    pub zenith_deg: f64,
    /// Compass direction the light comes from, in degrees clockwise from north.
    pub azimuth_deg: f64,
    pub z_factor: f64,
}

impl Default for HillshadeParams {
    fn default() -> Self {
        Self {
            zenith_deg: 45.0,
            azimuth_deg: 315.0,
            z_factor: 1.0,
        }
    }
}

/// Computes shading for a grid with fixed light parameters.
///
/// Trigonometric terms are computed once when the parameters are set.
#[derive(Debug, Clone)]
pub struct Hillshader {
    params: HillshadeParams,
    zenith_rad: f64,
    cos_zenith: f64,
    sin_zenith: f64,
    azimuth_rad: f64,
}

impl Hillshader {
    pub fn new(params: HillshadeParams) -> Self {
        let zenith_rad = params.zenith_deg.to_radians();
        // Compass bearing to the math angle measured counter-clockwise from east
        let mut azimuth_math = 360.0 - params.azimuth_deg + 90.0;
        if azimuth_math >= 360.0 {
            azimuth_math -= 360.0;
        }
        Self {
            params,
            zenith_rad,
            cos_zenith: zenith_rad.cos(),
            sin_zenith: zenith_rad.sin(),
            azimuth_rad: azimuth_math.to_radians(),
        }
    }

    pub fn params(&self) -> &HillshadeParams {
        &self.params
    }

    pub fn zenith_rad(&self) -> f64 {
        self.zenith_rad
    }

    pub fn azimuth_rad(&self) -> f64 {
        self.azimuth_rad
    }

    pub fn set_zenith(&mut self, zenith_deg: f64) {
        *self = Self::new(HillshadeParams {
            zenith_deg,
            ..self.params
        });
    }

    pub fn set_azimuth(&mut self, azimuth_deg: f64) {
        *self = Self::new(HillshadeParams {
            azimuth_deg,
            ..self.params
        });
    }

    /// Slope and aspect in radians at a cell, or `None` if the cell has no
    /// data or is out of range.
    pub fn slope_aspect(
        &self,
        grid: &ElevationGrid,
        grid_x: i64,
        grid_y: i64,
    ) -> Result<Option<(f64, f64)>> {
        let Some(e) = grid.get_elevation(grid_x, grid_y)? else {
            return Ok(None);
        };
        let n = |dx: i64, dy: i64| -> Result<f64> {
            Ok(grid.get_elevation(grid_x + dx, grid_y + dy)?.unwrap_or(e))
        };

        let a = n(-1, 1)?;
        let b = n(0, 1)?;
        let c = n(1, 1)?;
        let d = n(-1, 0)?;
        let f = n(1, 0)?;
        let g = n(-1, -1)?;
        let h = n(0, -1)?;
        let i = n(1, -1)?;

        let eight_cells = 8.0 * grid.cell_size();
        let dzdx = ((c + 2.0 * f + i) - (a + 2.0 * d + g)) / eight_cells;
        let dzdy = ((g + 2.0 * h + i) - (a + 2.0 * b + c)) / eight_cells;

        let slope = (self.params.z_factor * (dzdx * dzdx + dzdy * dzdy).sqrt()).atan();
        Ok(Some((slope, aspect(dzdx, dzdy))))
    }

    /// Raw shading value `255 * illumination` at a cell. May be negative for
    /// faces turned away from the light.
    pub fn shade(&self, grid: &ElevationGrid, grid_x: i64, grid_y: i64) -> Result<Option<f64>> {
        Ok(self
            .slope_aspect(grid, grid_x, grid_y)?
            .map(|(slope, aspect)| self.illumination(slope, aspect)))
    }

    fn illumination(&self, slope: f64, aspect: f64) -> f64 {
        255.0
            * (self.cos_zenith * slope.cos()
                + self.sin_zenith * slope.sin() * (self.azimuth_rad - aspect).cos())
    }

    /// Shade every cell of `grid`.
    pub fn render(&self, grid: &ElevationGrid) -> Result<ShadedRelief> {
        let (width, height) = (grid.width(), grid.height());
        let mut pixels = Vec::with_capacity(width * height);
        for grid_y in 0..height as i64 {
            for grid_x in 0..width as i64 {
                let pixel = match self.shade(grid, grid_x, grid_y)? {
                    Some(shade) => gray_pixel(shade),
                    None => NO_DATA_PIXEL,
                };
                pixels.push(pixel);
            }
        }

        debug!(
            width,
            height,
            zenith = self.params.zenith_deg,
            azimuth = self.params.azimuth_deg,
            "rendered shaded relief"
        );
        Ok(ShadedRelief {
            width,
            height,
            pixels,
        })
    }
}

impl Default for Hillshader {
    fn default() -> Self {
        Self::new(HillshadeParams::default())
    }
}

fn aspect(dzdx: f64, dzdy: f64) -> f64 {
    if dzdx != 0.0 {
        let mut aspect = dzdy.atan2(-dzdx);
        if aspect < 0.0 {
            aspect += 2.0 * PI;
        }
        aspect
    } else if dzdy > 0.0 {
        FRAC_PI_2
    } else if dzdy < 0.0 {
        3.0 * FRAC_PI_2
    } else {
        0.0
    }
}

/// Pack a shade value into an opaque gray ARGB pixel.
fn gray_pixel(shade: f64) -> u32 {
    let g = shade.round().clamp(0.0, 255.0) as u32;
    0xFF00_0000 | (g << 16) | (g << 8) | g
}

/// A rendered shaded relief: one ARGB pixel per grid cell, row 0 = south.
#[derive(Debug, Clone, PartialEq)]
pub struct ShadedRelief {
    width: usize,
    height: usize,
    pixels: Vec<u32>,
}

impl ShadedRelief {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Packed ARGB pixels in grid order.
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Pixel of cell `(grid_x, grid_y)`.
    pub fn pixel(&self, grid_x: usize, grid_y: usize) -> u32 {
        self.pixels[grid_y * self.width + grid_x]
    }

    /// Gray level of a cell, `None` where the grid had no data.
    pub fn gray(&self, grid_x: usize, grid_y: usize) -> Option<u8> {
        let pixel = self.pixel(grid_x, grid_y);
        if pixel == NO_DATA_PIXEL {
            None
        } else {
            Some((pixel & 0xFF) as u8)
        }
    }

    /// Convert to an RGBA image with north at the top.
    pub fn to_rgba_image(&self) -> RgbaImage {
        let height = self.height as u32;
        RgbaImage::from_fn(self.width as u32, height, |px, py| {
            let grid_y = (height - 1 - py) as usize;
            let p = self.pixel(px as usize, grid_y);
            Rgba([
                (p >> 16) as u8,
                (p >> 8) as u8,
                p as u8,
                (p >> 24) as u8,
            ])
        })
    }

    /// Encode as PNG.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_png<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.to_rgba_image()
            .save_with_format(path.as_ref(), ImageFormat::Png)?;
        debug!(path = %path.as_ref().display(), "wrote shaded relief");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::CoordinateSpace;
    use crate::storage::StorageKind;
    use approx::assert_abs_diff_eq;
    use tempfile::TempDir;

    fn grid_from(width: usize, height: usize, f: impl Fn(i64, i64) -> f64) -> ElevationGrid {
        let mut grid = ElevationGrid::new(
            CoordinateSpace::default(),
            0.0,
            0.0,
            width,
            height,
            1.0,
            StorageKind::Double,
        )
        .unwrap();
        for y in 0..height as i64 {
            for x in 0..width as i64 {
                grid.set_elevation(x, y, f(x, y)).unwrap();
            }
        }
        grid
    }

    #[test]
    fn test_flat_plane_shade() {
        let grid = grid_from(5, 5, |_, _| 100.0);

        for azimuth in [0.0, 90.0, 225.0, 315.0] {
            let shader = Hillshader::new(HillshadeParams {
                zenith_deg: 30.0,
                azimuth_deg: azimuth,
                z_factor: 1.0,
            });
            for y in 0..5 {
                for x in 0..5 {
                    let (slope, _) = shader.slope_aspect(&grid, x, y).unwrap().unwrap();
                    assert_eq!(slope, 0.0);
                    let shade = shader.shade(&grid, x, y).unwrap().unwrap();
                    assert_abs_diff_eq!(shade, 255.0 * 30f64.to_radians().cos(), epsilon = 1e-9);
                }
            }
        }
    }

    #[test]
    fn test_slope_facing_light() {
        // Rises to the east, so the face looks west
        let grid = grid_from(5, 5, |x, _| x as f64);

        let from_west = Hillshader::new(HillshadeParams {
            zenith_deg: 45.0,
            azimuth_deg: 270.0,
            z_factor: 1.0,
        });
        let from_east = Hillshader::new(HillshadeParams {
            zenith_deg: 45.0,
            azimuth_deg: 90.0,
            z_factor: 1.0,
        });

        let (slope, aspect) = from_west.slope_aspect(&grid, 2, 2).unwrap().unwrap();
        assert_abs_diff_eq!(slope, PI / 4.0, epsilon = 1e-12);
        assert_abs_diff_eq!(aspect, PI, epsilon = 1e-12);

        assert_abs_diff_eq!(from_west.shade(&grid, 2, 2).unwrap().unwrap(), 255.0, epsilon = 1e-9);
        assert_abs_diff_eq!(from_east.shade(&grid, 2, 2).unwrap().unwrap(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_aspect_special_cases() {
        assert_eq!(aspect(0.0, 1.0), FRAC_PI_2);
        assert_eq!(aspect(0.0, -1.0), 3.0 * FRAC_PI_2);
        let a = aspect(1.0, -1.0);
        assert!((0.0..2.0 * PI).contains(&a));
    }

    #[test]
    fn test_no_data_pixel() {
        let mut grid = grid_from(3, 3, |_, _| 10.0);
        grid.set_elevation_null(1, 1).unwrap();

        let relief = Hillshader::default().render(&grid).unwrap();
        assert_eq!(relief.pixel(1, 1), NO_DATA_PIXEL);
        assert_eq!(relief.gray(1, 1), None);
        // Neighbours of the hole substitute their own value and stay flat
        let expected = (255.0 * 45f64.to_radians().cos()).round() as u8;
        assert_eq!(relief.gray(0, 0), Some(expected));
        assert_eq!(relief.pixel(0, 0) >> 24, 0xFF);
    }

    #[test]
    fn test_cached_relief_invalidated_by_mutation() {
        let mut grid = grid_from(3, 3, |_, _| 10.0);
        let shader = Hillshader::default();

        let before = grid.shaded_relief(&shader).unwrap().pixel(1, 1);
        assert_ne!(before, NO_DATA_PIXEL);

        grid.set_elevation_null(1, 1).unwrap();
        let after = grid.shaded_relief(&shader).unwrap().pixel(1, 1);
        assert_eq!(after, NO_DATA_PIXEL);
    }

    #[test]
    fn test_cached_relief_follows_params() {
        let mut grid = grid_from(5, 5, |x, _| x as f64);
        let mut shader = Hillshader::new(HillshadeParams {
            azimuth_deg: 270.0,
            ..HillshadeParams::default()
        });
        let lit = grid.shaded_relief(&shader).unwrap().gray(2, 2);

        shader.set_azimuth(90.0);
        let dark = grid.shaded_relief(&shader).unwrap().gray(2, 2);
        assert_eq!(lit, Some(255));
        assert_eq!(dark, Some(0));
    }

    #[test]
    fn test_image_orientation_and_png() {
        let mut grid = grid_from(2, 2, |_, _| 5.0);
        grid.set_elevation_null(0, 1).unwrap(); // north-west cell

        let relief = Hillshader::default().render(&grid).unwrap();
        let image = relief.to_rgba_image();
        assert_eq!(image.dimensions(), (2, 2));
        // North row is the first image row
        assert_eq!(image.get_pixel(0, 0).0[3], 0);
        assert_eq!(image.get_pixel(0, 1).0[3], 255);

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("relief.png");
        relief.write_png(&path).unwrap();
        assert!(path.exists());
    }
}
