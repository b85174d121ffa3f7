//! Explicit face-flux update of the elevation field.

use crate::params::positive;
use crate::{DiffusionError, DiffusionParams, Result};
use ndarray::{Array2, ArrayView2, ArrayViewMut2, Zip};

/// Summary of one update.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepReport {
    /// Largest absolute elevation change of any cell (m).
    pub max_abs_change: f64,
    /// Sum of elevation changes over all cells (m); zero up to round-off.
    pub net_change: f64,
}

/// Reusable buffers for stepping a grid of fixed shape in place.
///
/// The prior elevation is copied into a scratch buffer before the update so
/// every cell reads its neighbors' old values.
#[derive(Debug, Clone)]
pub struct Stepper {
    prior: Array2<f64>,
    damping: Array2<f64>,
}

impl Stepper {
    /// Allocate buffers for a `(rows, cols)` grid.
    pub fn new(shape: (usize, usize)) -> Self {
        Self {
            prior: Array2::zeros(shape),
            damping: Array2::zeros(shape),
        }
    }

    /// Shape the buffers were allocated for.
    pub fn shape(&self) -> (usize, usize) {
        self.prior.dim()
    }

    /// Advance `elevation` by one time step of `params.dt`.
    ///
    /// Nothing is written when validation fails.
    pub fn step(
        &mut self,
        mut elevation: ArrayViewMut2<'_, f64>,
        soil_depth: ArrayView2<'_, f64>,
        spacing: f64,
        params: &DiffusionParams,
    ) -> Result<StepReport> {
        validate(elevation.view(), soil_depth, spacing, params)?;
        check_shape("scratch buffer", elevation.dim(), self.shape())?;

        self.prior.assign(&elevation);
        fill_damping(&mut self.damping, soil_depth, params);
        Ok(apply_update(
            self.prior.view(),
            self.damping.view(),
            params.diffusivity * params.dt / (spacing * spacing),
            elevation.view_mut(),
        ))
    }
}

/// Pure one-step update: returns the next elevation field.
pub fn step(
    elevation: ArrayView2<'_, f64>,
    soil_depth: ArrayView2<'_, f64>,
    spacing: f64,
    params: &DiffusionParams,
) -> Result<Array2<f64>> {
    validate(elevation, soil_depth, spacing, params)?;

    let mut damping = Array2::zeros(elevation.dim());
    fill_damping(&mut damping, soil_depth, params);

    let mut next = elevation.to_owned();
    apply_update(
        elevation,
        damping.view(),
        params.diffusivity * params.dt / (spacing * spacing),
        next.view_mut(),
    );
    Ok(next)
}

fn validate(
    elevation: ArrayView2<'_, f64>,
    soil_depth: ArrayView2<'_, f64>,
    spacing: f64,
    params: &DiffusionParams,
) -> Result<()> {
    params.validate()?;
    positive("spacing", spacing)?;
    check_shape("soil depth", elevation.dim(), soil_depth.dim())?;
    // Negative depth flips the damping sign and turns the update into anti-diffusion
    match soil_depth.iter().find(|h| !(h.is_finite() && **h >= 0.0)) {
        Some(h) => Err(DiffusionError::InvalidParameter(format!(
            "soil depth must be finite and non-negative, got {}",
            h
        ))),
        None => Ok(()),
    }
}

fn check_shape(field: &'static str, expected: (usize, usize), found: (usize, usize)) -> Result<()> {
    if expected == found {
        Ok(())
    } else {
        Err(DiffusionError::ShapeMismatch {
            field,
            expected,
            found,
        })
    }
}

fn fill_damping(damping: &mut Array2<f64>, soil_depth: ArrayView2<'_, f64>, params: &DiffusionParams) {
    Zip::from(damping)
        .and(&soil_depth)
        .for_each(|f, &h| *f = params.damping(h));
}

/// Write `prior + Δz` into `out`, where `coefficient = D·dt / spacing²`.
///
/// Each 4-connected face contributes `coefficient · f_face · (z_n − z_c)` to
/// cell c and the opposite amount to n; edge faces contribute nothing.
fn apply_update(
    prior: ArrayView2<'_, f64>,
    damping: ArrayView2<'_, f64>,
    coefficient: f64,
    mut out: ArrayViewMut2<'_, f64>,
) -> StepReport {
    let (rows, cols) = prior.dim();
    let mut report = StepReport::default();

    for r in 0..rows {
        for c in 0..cols {
            let z = prior[(r, c)];
            let f = damping[(r, c)];
            let mut exchange = 0.0;

            let mut face = |nr: usize, nc: usize| {
                let face_damping = 0.5 * (f + damping[(nr, nc)]);
                exchange += face_damping * (prior[(nr, nc)] - z);
            };
            if r > 0 {
                face(r - 1, c);
            }
            if r + 1 < rows {
                face(r + 1, c);
            }
            if c > 0 {
                face(r, c - 1);
            }
            if c + 1 < cols {
                face(r, c + 1);
            }

            let dz = coefficient * exchange;
            out[(r, c)] = z + dz;
            report.max_abs_change = report.max_abs_change.max(dz.abs());
            report.net_change += dz;
        }
    }

    report
}
