//! Error type for simulation runs.

use thawslope_dem::GridError;
use thawslope_diffusion::DiffusionError;
use thawslope_forcing::ForcingError;
use thiserror::Error;

/// Errors that end a simulation run.
///
/// None of them are retried: the run stops and the caller decides whether to
/// abort the workflow.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Grid error: {0}")]
    Grid(#[from] GridError),

    #[error("Forcing error: {0}")]
    Forcing(#[from] ForcingError),

    #[error("Diffusion error: {0}")]
    Diffusion(#[from] DiffusionError),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Snapshot at {elapsed_years} yr is not after the previous one at {previous_years} yr")]
    SnapshotOrder { elapsed_years: f64, previous_years: f64 },

    #[error("Run already finished after {steps} steps")]
    RunFinished { steps: u64 },
}

impl RunError {
    /// Whether the underlying cause is a non-positive physical constant.
    pub fn is_invalid_parameter(&self) -> bool {
        matches!(
            self,
            RunError::InvalidParameter(_)
                | RunError::Diffusion(DiffusionError::InvalidParameter(_))
                | RunError::Forcing(ForcingError::InvalidParameter(_))
                | RunError::Grid(GridError::InvalidParameter(_))
        )
    }

    /// Whether the underlying cause is a field-shape mismatch.
    pub fn is_shape_mismatch(&self) -> bool {
        matches!(
            self,
            RunError::Diffusion(DiffusionError::ShapeMismatch { .. })
                | RunError::Grid(GridError::ShapeMismatch { .. })
        )
    }

    /// Whether the underlying cause is a year missing from the forcing series.
    pub fn is_missing_input(&self) -> bool {
        matches!(self, RunError::Forcing(ForcingError::MissingInput { .. }))
    }
}
