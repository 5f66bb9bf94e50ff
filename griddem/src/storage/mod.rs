//! Cell storage backends.
//!
//! An [`ElevationGrid`](crate::ElevationGrid) owns exactly one [`Storage`],
//! chosen when the grid is created. All backends share the same capability
//! set: get, set, clear and a null sentinel. Cells are addressed by the
//! linear index `row * width + col`; callers do the bounds checking.

mod file;
mod memory;

pub use file::{
    ByteOrder, CellCodec, DirectFileStorage, FileLayout, Float32Codec, RowOrder,
    ScaledInt16Codec, ScaledInt32Codec,
};
pub use memory::{
    DoubleStorage, FloatStorage, ScaledIntStorage, ShortStorage, FLOAT_NULL, SCALED_INT_NULL,
    SHORT_NULL,
};

use crate::error::Result;

/// The in-memory encodings a fresh grid can be allocated with.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum StorageKind {
    /// 8-byte floats, null = NaN.
    #[default]
    Double,
    /// 4-byte floats, null = `-f32::MAX`.
    Float,
    /// 4-byte `round(value * scale)`, null = `i32::MIN`.
    ScaledInt { scale: f64 },
    /// 2-byte truncated integers, null = `i16::MIN`.
    Short,
}

impl StorageKind {
    /// Allocate an all-null backend with `len` cells.
    pub fn allocate(self, len: usize) -> Storage {
        match self {
            StorageKind::Double => Storage::Double(DoubleStorage::new(len)),
            StorageKind::Float => Storage::Float(FloatStorage::new(len)),
            StorageKind::ScaledInt { scale } => {
                Storage::ScaledInt(ScaledIntStorage::new(len, scale))
            }
            StorageKind::Short => Storage::Short(ShortStorage::new(len)),
        }
    }
}

/// One grid's cell buffer.
#[derive(Debug)]
pub enum Storage {
    Double(DoubleStorage),
    Float(FloatStorage),
    ScaledInt(ScaledIntStorage),
    Short(ShortStorage),
    DirectFile(DirectFileStorage),
}

impl Storage {
    /// Read one cell. Only the direct-file variant can fail.
    #[inline]
    pub fn get(&self, index: usize) -> Result<Option<f64>> {
        Ok(match self {
            Storage::Double(s) => s.get(index),
            Storage::Float(s) => s.get(index),
            Storage::ScaledInt(s) => s.get(index),
            Storage::Short(s) => s.get(index),
            Storage::DirectFile(s) => return s.get(index),
        })
    }

    /// Write one cell; `None` stores the null sentinel.
    #[inline]
    pub fn set(&mut self, index: usize, value: Option<f64>) -> Result<()> {
        match self {
            Storage::Double(s) => s.set(index, value),
            Storage::Float(s) => s.set(index, value),
            Storage::ScaledInt(s) => s.set(index, value),
            Storage::Short(s) => s.set(index, value),
            Storage::DirectFile(s) => return s.set(index, value),
        }
        Ok(())
    }

    /// Null every cell.
    pub fn clear(&mut self) -> Result<()> {
        match self {
            Storage::Double(s) => s.clear(),
            Storage::Float(s) => s.clear(),
            Storage::ScaledInt(s) => s.clear(),
            Storage::Short(s) => s.clear(),
            Storage::DirectFile(s) => return s.clear(),
        }
        Ok(())
    }

    /// The sentinel's raw numeric value for this encoding.
    pub fn null_sentinel(&self) -> f64 {
        match self {
            Storage::Double(_) => f64::NAN,
            Storage::Float(_) => FLOAT_NULL as f64,
            Storage::ScaledInt(_) => SCALED_INT_NULL as f64,
            Storage::Short(_) => SHORT_NULL as f64,
            Storage::DirectFile(s) => s.codec().null_value(),
        }
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        match self {
            Storage::Double(s) => s.len(),
            Storage::Float(s) => s.len(),
            Storage::ScaledInt(s) => s.len(),
            Storage::Short(s) => s.len(),
            Storage::DirectFile(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Short name of the encoding, for logs and reports.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Storage::Double(_) => "double",
            Storage::Float(_) => "float",
            Storage::ScaledInt(_) => "scaled-int",
            Storage::Short(_) => "short",
            Storage::DirectFile(_) => "direct-file",
        }
    }

    /// Release any underlying file. In-memory variants are always open.
    pub fn close(&mut self) -> Result<()> {
        match self {
            Storage::DirectFile(s) => s.close(),
            _ => Ok(()),
        }
    }

    pub fn is_open(&self) -> bool {
        match self {
            Storage::DirectFile(s) => s.is_open(),
            _ => true,
        }
    }
}
