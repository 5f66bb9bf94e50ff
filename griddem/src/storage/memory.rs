//! In-memory storage encodings.
//!
//! Each buffer is indexed by `row * width + col` and encodes "no data" in-band
//! with a sentinel that can never be produced by a stored value.

/// Sentinel used by [`FloatStorage`]: the most negative finite `f32`.
pub const FLOAT_NULL: f32 = -f32::MAX;

/// Sentinel used by [`ScaledIntStorage`].
pub const SCALED_INT_NULL: i32 = i32::MIN;

/// Sentinel used by [`ShortStorage`]. Same value SRTM uses for voids.
pub const SHORT_NULL: i16 = i16::MIN;

/// Encode an elevation as a 32-bit float, keeping clear of [`FLOAT_NULL`].
pub(crate) fn encode_f32(value: Option<f64>) -> f32 {
    match value {
        Some(v) if v.is_finite() => {
            let stored = v as f32;
            if stored <= FLOAT_NULL {
                // One ulp towards zero from -f32::MAX
                f32::from_bits(FLOAT_NULL.to_bits() - 1)
            } else if stored.is_infinite() {
                f32::MAX
            } else {
                stored
            }
        }
        _ => FLOAT_NULL,
    }
}

pub(crate) fn decode_f32(stored: f32) -> Option<f64> {
    if stored == FLOAT_NULL || stored.is_nan() {
        None
    } else {
        Some(stored as f64)
    }
}

/// Encode `round(value * scale)`, saturating above [`SCALED_INT_NULL`].
pub(crate) fn encode_scaled_i32(value: Option<f64>, scale: f64) -> i32 {
    match value {
        Some(v) if v.is_finite() => {
            let scaled = (v * scale).round();
            scaled.clamp((SCALED_INT_NULL + 1) as f64, i32::MAX as f64) as i32
        }
        _ => SCALED_INT_NULL,
    }
}

pub(crate) fn decode_scaled_i32(stored: i32, scale: f64) -> Option<f64> {
    if stored == SCALED_INT_NULL {
        None
    } else {
        Some(stored as f64 / scale)
    }
}

/// Encode `round(value * scale)` into 16 bits, saturating above [`SHORT_NULL`].
pub(crate) fn encode_scaled_i16(value: Option<f64>, scale: f64) -> i16 {
    match value {
        Some(v) if v.is_finite() => {
            let scaled = (v * scale).round();
            scaled.clamp((SHORT_NULL + 1) as f64, i16::MAX as f64) as i16
        }
        _ => SHORT_NULL,
    }
}

pub(crate) fn decode_scaled_i16(stored: i16, scale: f64) -> Option<f64> {
    if stored == SHORT_NULL {
        None
    } else {
        Some(stored as f64 / scale)
    }
}

/// 8-byte IEEE-754 cells. Null is NaN; values are stored unchanged.
#[derive(Debug, Clone)]
pub struct DoubleStorage {
    cells: Vec<f64>,
}

impl DoubleStorage {
    pub fn new(len: usize) -> Self {
        Self {
            cells: vec![f64::NAN; len],
        }
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<f64> {
        let v = self.cells[index];
        if v.is_nan() {
            None
        } else {
            Some(v)
        }
    }

    #[inline]
    pub fn set(&mut self, index: usize, value: Option<f64>) {
        self.cells[index] = match value {
            Some(v) if v.is_finite() => v,
            _ => f64::NAN,
        };
    }

    pub fn clear(&mut self) {
        self.cells.fill(f64::NAN);
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// 4-byte float cells. Null is `-f32::MAX`.
#[derive(Debug, Clone)]
pub struct FloatStorage {
    cells: Vec<f32>,
}

impl FloatStorage {
    pub fn new(len: usize) -> Self {
        Self {
            cells: vec![FLOAT_NULL; len],
        }
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<f64> {
        decode_f32(self.cells[index])
    }

    #[inline]
    pub fn set(&mut self, index: usize, value: Option<f64>) {
        self.cells[index] = encode_f32(value);
    }

    pub fn clear(&mut self) {
        self.cells.fill(FLOAT_NULL);
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// 4-byte fixed-point cells: `stored = round(value * scale)`. Null is `i32::MIN`.
#[derive(Debug, Clone)]
pub struct ScaledIntStorage {
    cells: Vec<i32>,
    scale: f64,
}

impl ScaledIntStorage {
    /// Create an all-null buffer.
    ///
    /// `scale` is the number of stored units per elevation unit, e.g. 1000
    /// for millimetre precision on metre elevations.
    pub fn new(len: usize, scale: f64) -> Self {
        Self {
            cells: vec![SCALED_INT_NULL; len],
            scale,
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<f64> {
        decode_scaled_i32(self.cells[index], self.scale)
    }

    #[inline]
    pub fn set(&mut self, index: usize, value: Option<f64>) {
        self.cells[index] = encode_scaled_i32(value, self.scale);
    }

    pub fn clear(&mut self) {
        self.cells.fill(SCALED_INT_NULL);
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// 2-byte integer cells: values are truncated to whole units. Null is `i16::MIN`.
#[derive(Debug, Clone)]
pub struct ShortStorage {
    cells: Vec<i16>,
}

impl ShortStorage {
    pub fn new(len: usize) -> Self {
        Self {
            cells: vec![SHORT_NULL; len],
        }
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<f64> {
        let v = self.cells[index];
        if v == SHORT_NULL {
            None
        } else {
            Some(v as f64)
        }
    }

    #[inline]
    pub fn set(&mut self, index: usize, value: Option<f64>) {
        self.cells[index] = match value {
            Some(v) if v.is_finite() => {
                v.trunc().clamp((SHORT_NULL + 1) as f64, i16::MAX as f64) as i16
            }
            _ => SHORT_NULL,
        };
    }

    pub fn clear(&mut self) {
        self.cells.fill(SHORT_NULL);
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_exact() {
        let mut storage = DoubleStorage::new(4);
        assert_eq!(storage.get(0), None);

        storage.set(1, Some(1234.56789));
        assert_eq!(storage.get(1), Some(1234.56789));

        storage.set(2, Some(f64::INFINITY));
        assert_eq!(storage.get(2), None);
    }

    #[test]
    fn test_float_precision_and_sentinel() {
        let mut storage = FloatStorage::new(3);
        storage.set(0, Some(101.25));
        assert_eq!(storage.get(0), Some(101.25));

        // A value that would collide with the sentinel is nudged off it
        storage.set(1, Some(-f32::MAX as f64));
        let v = storage.get(1).unwrap();
        assert!(v > FLOAT_NULL as f64);

        storage.set(2, Some(-1.0e300));
        assert!(storage.get(2).is_some());

        storage.set(0, None);
        assert_eq!(storage.get(0), None);
    }

    #[test]
    fn test_scaled_int_rounding() {
        let mut storage = ScaledIntStorage::new(3, 1000.0);
        storage.set(0, Some(12.3456));
        let v = storage.get(0).unwrap();
        assert!((v - 12.3456).abs() <= 1.0 / 1000.0);
        assert_eq!(v, 12.346);

        // Saturates rather than producing the sentinel
        storage.set(1, Some(-1.0e12));
        assert_eq!(storage.get(1), Some((i32::MIN + 1) as f64 / 1000.0));

        storage.set(2, Some(f64::NAN));
        assert_eq!(storage.get(2), None);
    }

    #[test]
    fn test_short_truncates() {
        let mut storage = ShortStorage::new(4);
        storage.set(0, Some(99.9));
        assert_eq!(storage.get(0), Some(99.0));

        storage.set(1, Some(-12.7));
        assert_eq!(storage.get(1), Some(-12.0));

        storage.set(2, Some(-40000.0));
        assert_eq!(storage.get(2), Some(-32767.0));

        storage.set(3, Some(40000.0));
        assert_eq!(storage.get(3), Some(32767.0));
    }

    #[test]
    fn test_clear_nulls_everything() {
        let mut storage = ShortStorage::new(2);
        storage.set(0, Some(5.0));
        storage.set(1, Some(6.0));
        storage.clear();
        assert_eq!(storage.get(0), None);
        assert_eq!(storage.get(1), None);
    }
}
