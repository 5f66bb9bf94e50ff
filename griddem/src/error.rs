//! Error types for the griddem library.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when working with elevation grids.
#[derive(Error, Debug)]
pub enum DemError {
    /// IO error when reading or writing files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Grid dimensions must both be positive.
    #[error("Invalid grid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    /// Cell size must be a positive, finite number.
    #[error("Invalid cell size: {0}")]
    InvalidCellSize(f64),

    /// Two grids with different cell sizes cannot be combined cell-for-cell.
    #[error("Incompatible cell size: expected {expected}, got {actual} (resample first)")]
    IncompatibleCellSize { expected: f64, actual: f64 },

    /// The direct-file backend was already closed.
    #[error("Elevation file is closed: {path}")]
    Closed { path: PathBuf },

    /// The direct-file backend was mapped read-only.
    #[error("Elevation file is read-only: {path}")]
    ReadOnly { path: PathBuf },

    /// The backend cannot perform the requested operation.
    #[error("Unsupported operation: {operation}")]
    Unsupported { operation: String },

    /// File size is not that of a square grid of 16-bit samples.
    #[error("Invalid file size: {size} bytes (expected 2*n*n, e.g. 25934402 for SRTM1 or 2884802 for SRTM3)")]
    InvalidFileSize { size: usize },

    /// File is shorter than the header plus the cells it must hold.
    #[error("File too small: {path} ({actual} bytes, need {expected})")]
    FileTooSmall {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    /// The requested grid file was not found.
    #[error("Grid file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// No reader or writer is registered for the resource.
    #[error("No reader or writer registered for: {path}")]
    UnknownFormat { path: PathBuf },

    /// The process-wide registry may only be installed once.
    #[error("IO registry already installed")]
    RegistryInstalled,

    /// Image encoding failed.
    #[error("Image error: {0}")]
    Image(String),

    /// Coordinate input could not be interpreted.
    #[error("Invalid coordinate: {message}")]
    InvalidCoordinate { message: String },
}

impl From<image::ImageError> for DemError {
    fn from(err: image::ImageError) -> Self {
        DemError::Image(err.to_string())
    }
}

/// Result type alias using [`DemError`].
pub type Result<T> = std::result::Result<T, DemError>;
