//! Error types for the grid crate.

use thiserror::Error;

/// Errors that can occur when building grids or reading and writing rasters.
#[derive(Debug, Error)]
pub enum GridError {
    /// I/O error reading or writing a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TIFF encoding or decoding error.
    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    /// Invalid GeoTIFF - missing or malformed georeferencing tags.
    #[error("Invalid GeoTIFF: {0}")]
    InvalidGeoTiff(String),

    /// A cell holds the no-data value or a non-finite number.
    #[error("No elevation data at cell ({row}, {col})")]
    NoData {
        /// Row of the offending cell.
        row: usize,
        /// Column of the offending cell.
        col: usize,
    },

    /// Two fields that must share a shape do not.
    #[error("Shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        /// Shape of the reference field (rows, cols).
        expected: (usize, usize),
        /// Shape that was supplied (rows, cols).
        found: (usize, usize),
    },

    /// A physical or geometric parameter is out of range.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The requested window does not fit inside the raster.
    #[error("Window rows {row}..{row_end}, cols {col}..{col_end} exceeds raster of {rows} x {cols}")]
    InvalidWindow {
        /// First row of the window.
        row: usize,
        /// One past the last row of the window.
        row_end: usize,
        /// First column of the window.
        col: usize,
        /// One past the last column of the window.
        col_end: usize,
        /// Raster row count.
        rows: usize,
        /// Raster column count.
        cols: usize,
    },

    /// The raster pixels are not square and no spacing override was given.
    #[error("Non-square pixels ({x} x {y}); provide an explicit spacing")]
    NonSquarePixels {
        /// Pixel size along columns.
        x: f64,
        /// Pixel size along rows.
        y: f64,
    },
}
