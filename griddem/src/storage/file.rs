//! Direct file-mapped storage.
//!
//! Cells live in a file laid out as a fixed-size header followed by
//! `width * height` fixed-width cells in row-major order. The byte encoding
//! of one cell is supplied by a [`CellCodec`]; that is the only piece a new
//! on-disk format has to provide.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use memmap2::{Mmap, MmapMut};
use tracing::debug;

use crate::error::{DemError, Result};
use crate::storage::memory::{
    decode_f32, decode_scaled_i16, decode_scaled_i32, encode_f32, encode_scaled_i16,
    encode_scaled_i32, FLOAT_NULL, SCALED_INT_NULL, SHORT_NULL,
};

/// Byte order of multi-byte cells on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    #[default]
    Big,
    Little,
}

/// Encodes and decodes one cell of an on-disk grid.
pub trait CellCodec: fmt::Debug + Send + Sync {
    /// Number of bytes one cell occupies.
    fn byte_count(&self) -> usize;

    /// Decode a cell. `bytes` has exactly [`Self::byte_count`] bytes.
    fn read_elevation(&self, bytes: &[u8]) -> Option<f64>;

    /// Encode a cell into `bytes`, which has exactly [`Self::byte_count`] bytes.
    fn write_elevation(&self, value: Option<f64>, bytes: &mut [u8]);

    /// The sentinel's numeric value as it appears on disk.
    fn null_value(&self) -> f64;
}

/// 4-byte IEEE float cells, null = `-f32::MAX`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Float32Codec {
    pub byte_order: ByteOrder,
}

impl CellCodec for Float32Codec {
    fn byte_count(&self) -> usize {
        4
    }

    fn read_elevation(&self, bytes: &[u8]) -> Option<f64> {
        let raw = [bytes[0], bytes[1], bytes[2], bytes[3]];
        let v = match self.byte_order {
            ByteOrder::Big => f32::from_be_bytes(raw),
            ByteOrder::Little => f32::from_le_bytes(raw),
        };
        decode_f32(v)
    }

    fn write_elevation(&self, value: Option<f64>, bytes: &mut [u8]) {
        let v = encode_f32(value);
        let raw = match self.byte_order {
            ByteOrder::Big => v.to_be_bytes(),
            ByteOrder::Little => v.to_le_bytes(),
        };
        bytes.copy_from_slice(&raw);
    }

    fn null_value(&self) -> f64 {
        FLOAT_NULL as f64
    }
}

/// 2-byte scaled integer cells, null = `i16::MIN`.
///
/// With `scale = 1` and big-endian order this is the SRTM `.hgt` encoding.
#[derive(Debug, Clone, Copy)]
pub struct ScaledInt16Codec {
    pub scale: f64,
    pub byte_order: ByteOrder,
}

impl CellCodec for ScaledInt16Codec {
    fn byte_count(&self) -> usize {
        2
    }

    fn read_elevation(&self, bytes: &[u8]) -> Option<f64> {
        let raw = [bytes[0], bytes[1]];
        let v = match self.byte_order {
            ByteOrder::Big => i16::from_be_bytes(raw),
            ByteOrder::Little => i16::from_le_bytes(raw),
        };
        decode_scaled_i16(v, self.scale)
    }

    fn write_elevation(&self, value: Option<f64>, bytes: &mut [u8]) {
        let v = encode_scaled_i16(value, self.scale);
        let raw = match self.byte_order {
            ByteOrder::Big => v.to_be_bytes(),
            ByteOrder::Little => v.to_le_bytes(),
        };
        bytes.copy_from_slice(&raw);
    }

    fn null_value(&self) -> f64 {
        SHORT_NULL as f64
    }
}

/// 4-byte scaled integer cells, null = `i32::MIN`.
#[derive(Debug, Clone, Copy)]
pub struct ScaledInt32Codec {
    pub scale: f64,
    pub byte_order: ByteOrder,
}

impl CellCodec for ScaledInt32Codec {
    fn byte_count(&self) -> usize {
        4
    }

    fn read_elevation(&self, bytes: &[u8]) -> Option<f64> {
        let raw = [bytes[0], bytes[1], bytes[2], bytes[3]];
        let v = match self.byte_order {
            ByteOrder::Big => i32::from_be_bytes(raw),
            ByteOrder::Little => i32::from_le_bytes(raw),
        };
        decode_scaled_i32(v, self.scale)
    }

    fn write_elevation(&self, value: Option<f64>, bytes: &mut [u8]) {
        let v = encode_scaled_i32(value, self.scale);
        let raw = match self.byte_order {
            ByteOrder::Big => v.to_be_bytes(),
            ByteOrder::Little => v.to_le_bytes(),
        };
        bytes.copy_from_slice(&raw);
    }

    fn null_value(&self) -> f64 {
        SCALED_INT_NULL as f64
    }
}

/// Which grid row is stored first in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowOrder {
    /// Grid row 0 (minimum Y) first.
    #[default]
    SouthFirst,
    /// Grid row `height - 1` (maximum Y) first, as in SRTM files.
    NorthFirst,
}

/// Placement of the cell block inside the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FileLayout {
    /// Bytes before the first cell.
    pub header_size: u64,
    pub row_order: RowOrder,
}

enum Mapping {
    ReadOnly(Mmap),
    ReadWrite(MmapMut),
}

impl Mapping {
    fn bytes(&self) -> &[u8] {
        match self {
            Mapping::ReadOnly(m) => m,
            Mapping::ReadWrite(m) => m,
        }
    }
}

/// Grid storage backed directly by a memory-mapped file.
///
/// The backend must be released with [`close`](Self::close); dropping it
/// closes it as well. Any access after close fails with
/// [`DemError::Closed`].
pub struct DirectFileStorage {
    path: PathBuf,
    width: usize,
    height: usize,
    layout: FileLayout,
    codec: Box<dyn CellCodec>,
    mapping: Option<Mapping>,
}

impl DirectFileStorage {
    /// Map an existing file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or mapped, or if it is
    /// shorter than `header_size + width * height * byte_count`.
    pub fn open<P: AsRef<Path>>(
        path: P,
        width: usize,
        height: usize,
        layout: FileLayout,
        codec: Box<dyn CellCodec>,
        writable: bool,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(DemError::FileNotFound { path });
        }
        let file = OpenOptions::new().read(true).write(writable).open(&path)?;

        let expected = required_len(width, height, &layout, codec.as_ref());
        let actual = file.metadata()?.len();
        if actual < expected {
            return Err(DemError::FileTooSmall {
                path,
                expected,
                actual,
            });
        }

        // SAFETY: the mapping is owned by this backend and never handed out;
        // concurrent modification of the file by another process is outside
        // the single-writer contract of the grid.
        let mapping = if writable {
            Mapping::ReadWrite(unsafe { MmapMut::map_mut(&file)? })
        } else {
            Mapping::ReadOnly(unsafe { Mmap::map(&file)? })
        };
        debug!(path = %path.display(), width, height, writable, "mapped elevation file");

        Ok(Self {
            path,
            width,
            height,
            layout,
            codec,
            mapping: Some(mapping),
        })
    }

    /// Create (or truncate) a file sized for the grid, fill it with nulls and
    /// map it read-write. The header bytes are zeroed.
    pub fn create<P: AsRef<Path>>(
        path: P,
        width: usize,
        height: usize,
        layout: FileLayout,
        codec: Box<dyn CellCodec>,
    ) -> Result<Self> {
        let len = required_len(width, height, &layout, codec.as_ref());
        let file = File::create(path.as_ref())?;
        file.set_len(len)?;
        drop(file);

        let mut storage = Self::open(path, width, height, layout, codec, true)?;
        storage.clear()?;
        Ok(storage)
    }

    /// Byte offset of cell `(x, y)`:
    /// `header + (row * width + x) * byte_count`, where `row` is `y` or its
    /// mirror depending on [`RowOrder`].
    pub fn cell_offset(&self, x: usize, y: usize) -> u64 {
        let row = match self.layout.row_order {
            RowOrder::SouthFirst => y,
            RowOrder::NorthFirst => self.height - 1 - y,
        };
        self.layout.header_size + ((row * self.width + x) * self.codec.byte_count()) as u64
    }

    fn index_offset(&self, index: usize) -> usize {
        self.cell_offset(index % self.width, index / self.width) as usize
    }

    fn mapping(&self) -> Result<&Mapping> {
        self.mapping.as_ref().ok_or_else(|| DemError::Closed {
            path: self.path.clone(),
        })
    }

    fn mapping_mut(&mut self) -> Result<&mut MmapMut> {
        match self.mapping.as_mut() {
            Some(Mapping::ReadWrite(m)) => Ok(m),
            Some(Mapping::ReadOnly(_)) => Err(DemError::ReadOnly {
                path: self.path.clone(),
            }),
            None => Err(DemError::Closed {
                path: self.path.clone(),
            }),
        }
    }

    pub fn get(&self, index: usize) -> Result<Option<f64>> {
        let offset = self.index_offset(index);
        let n = self.codec.byte_count();
        let bytes = self.mapping()?.bytes();
        Ok(self.codec.read_elevation(&bytes[offset..offset + n]))
    }

    pub fn set(&mut self, index: usize, value: Option<f64>) -> Result<()> {
        let offset = self.index_offset(index);
        let n = self.codec.byte_count();
        let codec = &self.codec;
        let map = match self.mapping.as_mut() {
            Some(Mapping::ReadWrite(m)) => m,
            Some(Mapping::ReadOnly(_)) => {
                return Err(DemError::ReadOnly {
                    path: self.path.clone(),
                })
            }
            None => {
                return Err(DemError::Closed {
                    path: self.path.clone(),
                })
            }
        };
        codec.write_elevation(value, &mut map[offset..offset + n]);
        Ok(())
    }

    /// Write the null sentinel into every cell.
    pub fn clear(&mut self) -> Result<()> {
        let n = self.codec.byte_count();
        let mut null = vec![0u8; n];
        self.codec.write_elevation(None, &mut null);

        let start = self.layout.header_size as usize;
        let end = start + self.width * self.height * n;
        let map = self.mapping_mut()?;
        for cell in map[start..end].chunks_exact_mut(n) {
            cell.copy_from_slice(&null);
        }
        Ok(())
    }

    /// Flush pending writes to disk. No-op for read-only mappings.
    pub fn flush(&self) -> Result<()> {
        match self.mapping()? {
            Mapping::ReadWrite(m) => Ok(m.flush()?),
            Mapping::ReadOnly(_) => Ok(()),
        }
    }

    /// Flush and unmap the file. Calling it again is harmless.
    pub fn close(&mut self) -> Result<()> {
        if let Some(mapping) = self.mapping.take() {
            if let Mapping::ReadWrite(m) = &mapping {
                m.flush()?;
            }
            debug!(path = %self.path.display(), "closed elevation file");
        }
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.mapping.is_some()
    }

    pub fn is_writable(&self) -> bool {
        matches!(self.mapping, Some(Mapping::ReadWrite(_)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn layout(&self) -> FileLayout {
        self.layout
    }

    pub fn codec(&self) -> &dyn CellCodec {
        self.codec.as_ref()
    }

    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for DirectFileStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectFileStorage")
            .field("path", &self.path)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("layout", &self.layout)
            .field("codec", &self.codec)
            .field("open", &self.is_open())
            .finish()
    }
}

impl Drop for DirectFileStorage {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to close elevation file");
        }
    }
}

fn required_len(width: usize, height: usize, layout: &FileLayout, codec: &dyn CellCodec) -> u64 {
    layout.header_size + (width * height * codec.byte_count()) as u64
}
