//! Error types for the diffusion step engine.

use thiserror::Error;

/// Errors raised before any elevation value is written.
#[derive(Debug, Error, PartialEq)]
pub enum DiffusionError {
    /// A physical constant or the grid spacing is not strictly positive.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A field does not match the elevation shape.
    #[error("Shape mismatch for {field}: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        /// Which field was wrong.
        field: &'static str,
        /// Elevation shape (rows, cols).
        expected: (usize, usize),
        /// Shape of the offending field (rows, cols).
        found: (usize, usize),
    },
}
