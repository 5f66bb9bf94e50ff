//! Axis-aligned bounding boxes in grid map coordinates.

/// An axis-aligned rectangle in the grid's coordinate space.
///
/// The space itself is opaque to this crate; coordinates are whatever
/// units the grid's [`CoordinateSpace`](crate::CoordinateSpace) uses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Minimum X (western boundary).
    pub min_x: f64,
    /// Minimum Y (southern boundary).
    pub min_y: f64,
    /// Maximum X (eastern boundary).
    pub max_x: f64,
    /// Maximum Y (northern boundary).
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a new bounding box.
    ///
    /// # Arguments
    ///
    /// * `min_x` - Western boundary
    /// * `min_y` - Southern boundary
    /// * `max_x` - Eastern boundary
    /// * `max_y` - Northern boundary
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Width along X.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height along Y.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Check if a point lies inside the box (edges inclusive).
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Check if this bounding box overlaps another.
    ///
    /// Touching edges do not count as overlap.
    pub fn overlaps(&self, other: &BoundingBox) -> bool {
        self.min_x < other.max_x
            && self.max_x > other.min_x
            && self.min_y < other.max_y
            && self.max_y > other.min_y
    }

    /// The overlapping region of two boxes, or `None` if they are disjoint.
    pub fn intersection(&self, other: &BoundingBox) -> Option<BoundingBox> {
        if !self.overlaps(other) {
            return None;
        }
        Some(BoundingBox {
            min_x: self.min_x.max(other.min_x),
            min_y: self.min_y.max(other.min_y),
            max_x: self.max_x.min(other.max_x),
            max_y: self.max_y.min(other.max_y),
        })
    }

    /// The four corners as a closed counter-clockwise ring starting at
    /// `(min_x, min_y)`.
    pub fn ring(&self) -> Vec<(f64, f64)> {
        vec![
            (self.min_x, self.min_y),
            (self.max_x, self.min_y),
            (self.max_x, self.max_y),
            (self.min_x, self.max_y),
            (self.min_x, self.min_y),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlaps() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);

        assert!(a.overlaps(&BoundingBox::new(5.0, 5.0, 15.0, 15.0)));
        assert!(!a.overlaps(&BoundingBox::new(20.0, 20.0, 30.0, 30.0)));

        // Touching edge (exclusive boundary)
        assert!(!a.overlaps(&BoundingBox::new(10.0, 0.0, 20.0, 10.0)));

        // Fully contained
        assert!(a.overlaps(&BoundingBox::new(2.0, 2.0, 3.0, 3.0)));

        // Negative coordinates
        let neg = BoundingBox::new(-13.5, -78.5, -11.5, -76.5);
        assert!(neg.overlaps(&BoundingBox::new(-13.0, -78.0, -12.0, -77.0)));
    }

    #[test]
    fn test_intersection() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(5.0, -5.0, 15.0, 5.0);

        assert_eq!(
            a.intersection(&b),
            Some(BoundingBox::new(5.0, 0.0, 10.0, 5.0))
        );
        assert_eq!(a.intersection(&BoundingBox::new(11.0, 11.0, 12.0, 12.0)), None);
    }

    #[test]
    fn test_ring_is_closed() {
        let ring = BoundingBox::new(1.0, 2.0, 3.0, 4.0).ring();
        assert_eq!(ring.len(), 5);
        assert_eq!(ring.first(), ring.last());
        assert_eq!(ring[2], (3.0, 4.0));
    }
}
