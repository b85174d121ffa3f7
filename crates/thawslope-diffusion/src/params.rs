//! Physical parameters of the transport law.

use crate::{DiffusionError, Result};

/// Diffusivity, decay depth and time step of one update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiffusionParams {
    /// Diffusivity D (m²/yr).
    pub diffusivity: f64,
    /// Decay depth h* (m).
    pub decay_depth: f64,
    /// Time step dt (yr).
    pub dt: f64,
}

impl DiffusionParams {
    /// Create and validate a parameter set.
    pub fn new(diffusivity: f64, decay_depth: f64, dt: f64) -> Result<Self> {
        let params = Self {
            diffusivity,
            decay_depth,
            dt,
        };
        params.validate()?;
        Ok(params)
    }

    /// Check that every constant is finite and strictly positive.
    pub fn validate(&self) -> Result<()> {
        positive("diffusivity", self.diffusivity)?;
        positive("decay depth", self.decay_depth)?;
        positive("time step", self.dt)?;
        Ok(())
    }

    /// Same constants with a different time step.
    pub fn with_dt(self, dt: f64) -> Result<Self> {
        Self::new(self.diffusivity, self.decay_depth, dt)
    }

    /// Transport damping `1 − exp(−H / h*)` for a soil depth `H`.
    pub fn damping(&self, soil_depth: f64) -> f64 {
        1.0 - (-soil_depth / self.decay_depth).exp()
    }

    /// Largest explicitly stable time step on a grid of `spacing` meters.
    pub fn max_stable_dt(&self, spacing: f64) -> f64 {
        spacing * spacing / (4.0 * self.diffusivity)
    }

    /// Whether `dt` is within the explicit stability bound.
    pub fn is_stable(&self, spacing: f64) -> bool {
        self.dt <= self.max_stable_dt(spacing)
    }

    /// Smallest number of equal sub-steps that keeps each one stable.
    ///
    /// Fails with `InvalidParameter` when more than [`MAX_SUBSTEPS`] would be
    /// needed.
    pub fn substeps(&self, spacing: f64) -> Result<u32> {
        positive("spacing", spacing)?;
        let bound = self.max_stable_dt(spacing);
        let ratio = (self.dt / bound).ceil();
        if !(ratio <= f64::from(MAX_SUBSTEPS)) {
            return Err(DiffusionError::InvalidParameter(format!(
                "time step {} yr needs more than {} sub-steps at {} m spacing (bound {} yr)",
                self.dt, MAX_SUBSTEPS, spacing, bound
            )));
        }

        let mut count = (ratio as u32).max(1);
        // ceil can land one short when dt / bound rounds down
        if self.dt / f64::from(count) > bound {
            count += 1;
        }
        Ok(count)
    }
}

/// Upper limit on explicit sub-steps per configured step.
pub const MAX_SUBSTEPS: u32 = 1_000_000;

pub(crate) fn positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(DiffusionError::InvalidParameter(format!(
            "{} must be positive, got {}",
            name, value
        )))
    }
}
