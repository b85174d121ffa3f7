//! Error types for the forcing crate.

use thiserror::Error;

/// Errors that can occur when loading or querying forcing data.
#[derive(Debug, Error)]
pub enum ForcingError {
    /// The series has no record for the requested year.
    #[error("Missing forcing input for year {year}")]
    MissingInput {
        /// Requested year.
        year: i32,
    },

    /// A physical parameter or forcing value is out of range.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Two records fall in the same year.
    #[error("Duplicate forcing record for year {0}")]
    DuplicateYear(i32),

    /// I/O error reading a forcing file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}
