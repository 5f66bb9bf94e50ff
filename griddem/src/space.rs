//! Coordinate space reference and coordinate-to-cell rounding policy.

use serde::Deserialize;

/// Opaque reference to the coordinate system a grid lives in.
///
/// The engine never reprojects; it only carries the identifier along and
/// applies the vertical precision model when it computes new elevations.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct CoordinateSpace {
    /// Coordinate system identifier (for example an EPSG code). 0 = unknown.
    pub id: u32,
    /// Vertical precision scale: computed elevations are rounded to
    /// `1 / scale_z`. A value of 0 keeps full floating precision.
    #[serde(default)]
    pub scale_z: f64,
}

impl CoordinateSpace {
    /// A space with full floating-point vertical precision.
    pub const fn new(id: u32) -> Self {
        Self { id, scale_z: 0.0 }
    }

    /// A space whose computed elevations are rounded to `1 / scale_z`.
    pub const fn with_scale_z(id: u32, scale_z: f64) -> Self {
        Self { id, scale_z }
    }

    /// Apply the vertical precision model to a computed elevation.
    pub fn make_z_precise(&self, z: f64) -> f64 {
        if self.scale_z > 0.0 && z.is_finite() {
            (z * self.scale_z).round() / self.scale_z
        } else {
            z
        }
    }
}

impl Default for CoordinateSpace {
    fn default() -> Self {
        Self::new(0)
    }
}

/// How a fractional cell position is snapped to an integer index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellRounding {
    /// `floor((coord - origin) / cell_size)`
    #[default]
    Floor,
    /// `round((coord - origin) / cell_size)`
    Round,
}

impl CellRounding {
    /// Snap a fractional cell offset to an index.
    pub fn apply(self, offset: f64) -> i64 {
        match self {
            CellRounding::Floor => offset.floor() as i64,
            CellRounding::Round => offset.round() as i64,
        }
    }
}

/// Per-axis rounding policy used by coordinate lookups.
///
/// The default floors X and rounds Y, which is what existing grid data
/// produced by this engine has always been queried with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisRounding {
    pub x: CellRounding,
    pub y: CellRounding,
}

impl AxisRounding {
    /// Floor on both axes.
    pub const FLOOR: AxisRounding = AxisRounding {
        x: CellRounding::Floor,
        y: CellRounding::Floor,
    };
}

impl Default for AxisRounding {
    fn default() -> Self {
        Self {
            x: CellRounding::Floor,
            y: CellRounding::Round,
        }
    }
}
