//! # thawslope-diffusion
//!
//! One-step update of an elevation field under depth-dependent hillslope
//! diffusion:
//!
//! ```text
//! q  = −D · (1 − exp(−H / h*)) · ∇z
//! ∂z/∂t = −∇·q
//! ```
//!
//! where `D` is the diffusivity (m²/yr), `H` the soil depth (m) and `h*` the
//! decay depth (m).
//!
//! ## Discretization
//!
//! Fluxes are evaluated on the faces between 4-connected neighbors, with the
//! damping factor averaged across each face. Faces on the domain edge carry no
//! flux (reflective boundary), so the total elevation is conserved up to
//! round-off. The update is explicit and reads only the prior state; it is
//! stable while `dt ≤ spacing² / (4·D)` (see
//! [`DiffusionParams::max_stable_dt`]).
//!
//! ## Example
//!
//! ```
//! use ndarray::Array2;
//! use thawslope_diffusion::{step, DiffusionParams};
//!
//! let elevation = Array2::from_shape_fn((1, 5), |(_, c)| c as f64);
//! let soil_depth = Array2::from_elem((1, 5), 1.0);
//! let params = DiffusionParams::new(1e-2, 1.0, 1.0)?;
//!
//! let next = step(elevation.view(), soil_depth.view(), 1.0, &params)?;
//! assert!(next[(0, 0)] > 0.0);
//! assert!(next[(0, 4)] < 4.0);
//! # Ok::<(), thawslope_diffusion::DiffusionError>(())
//! ```

mod error;
mod params;
mod stepper;

pub use error::DiffusionError;
pub use params::{DiffusionParams, MAX_SUBSTEPS};
pub use stepper::{step, StepReport, Stepper};

/// Result type for diffusion operations.
pub type Result<T> = std::result::Result<T, DiffusionError>;
