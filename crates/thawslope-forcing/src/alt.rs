//! Steady-state active-layer thickness.
//!
//! The ground surface temperature is taken as a sinusoid
//! `T(t) = T_mean + A_s sin(2πt / P)` over one year, where the air amplitude
//! `A` is damped by the snow pack as a periodic heat wave through a
//! conductive layer:
//!
//! ```text
//! A_s = A · exp(−z_snow · sqrt(π / (κ_snow · P)))
//! ```
//!
//! The thawing index `I` is the integral of the positive part of `T(t)` over
//! the year, and the thaw depth follows the Stefan solution
//!
//! ```text
//! ALT = sqrt(2 · k_thawed · I / (L · ρ_w · θ))
//! ```

use crate::series::Forcing;
use crate::{ForcingError, Result};
use std::f64::consts::PI;

/// Latent heat of fusion of water (J/kg).
const LATENT_HEAT_OF_FUSION: f64 = 3.34e5;

/// Density of water (kg/m³).
const WATER_DENSITY: f64 = 1000.0;

/// Length of the forcing period (days).
const DAYS_PER_YEAR: f64 = 365.0;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Maps one year of forcing to an active-layer thickness in meters.
pub trait ActiveLayerSolver {
    /// Active-layer thickness (m) under `forcing`.
    fn active_layer_thickness(&self, forcing: &Forcing) -> Result<f64>;
}

/// Stefan-solution active-layer solver with snow damping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StefanSolver {
    /// Thermal conductivity of thawed soil (W/m/K).
    thawed_conductivity: f64,
    /// Volumetric water content of the thawing soil (0-1].
    water_content: f64,
    /// Thermal diffusivity of snow (m²/s).
    snow_diffusivity: f64,
}

impl Default for StefanSolver {
    fn default() -> Self {
        Self {
            thawed_conductivity: 1.2,
            water_content: 0.3,
            snow_diffusivity: 2.0e-7,
        }
    }
}

impl StefanSolver {
    /// Create a solver, validating every parameter.
    pub fn new(thawed_conductivity: f64, water_content: f64, snow_diffusivity: f64) -> Result<Self> {
        if !(thawed_conductivity.is_finite() && thawed_conductivity > 0.0) {
            return Err(ForcingError::InvalidParameter(format!(
                "thawed conductivity must be positive, got {}",
                thawed_conductivity
            )));
        }
        if !(water_content.is_finite() && water_content > 0.0 && water_content <= 1.0) {
            return Err(ForcingError::InvalidParameter(format!(
                "water content must be in (0, 1], got {}",
                water_content
            )));
        }
        if !(snow_diffusivity.is_finite() && snow_diffusivity > 0.0) {
            return Err(ForcingError::InvalidParameter(format!(
                "snow diffusivity must be positive, got {}",
                snow_diffusivity
            )));
        }
        Ok(Self {
            thawed_conductivity,
            water_content,
            snow_diffusivity,
        })
    }

    /// Thermal conductivity of thawed soil (W/m/K).
    pub fn thawed_conductivity(&self) -> f64 {
        self.thawed_conductivity
    }

    /// Volumetric water content.
    pub fn water_content(&self) -> f64 {
        self.water_content
    }

    /// Snow thermal diffusivity (m²/s).
    pub fn snow_diffusivity(&self) -> f64 {
        self.snow_diffusivity
    }

    /// Ground surface amplitude after damping by `snow_thickness` meters of snow.
    pub fn surface_amplitude(&self, amplitude: f64, snow_thickness: f64) -> f64 {
        let period = DAYS_PER_YEAR * SECONDS_PER_DAY;
        let damping_depth = (self.snow_diffusivity * period / PI).sqrt();
        amplitude * (-snow_thickness / damping_depth).exp()
    }
}

impl ActiveLayerSolver for StefanSolver {
    fn active_layer_thickness(&self, forcing: &Forcing) -> Result<f64> {
        let Forcing {
            temperature_mean,
            temperature_amplitude,
            snow_thickness,
        } = *forcing;

        if !temperature_mean.is_finite() {
            return Err(ForcingError::InvalidParameter(format!(
                "temperature mean must be finite, got {}",
                temperature_mean
            )));
        }
        if !(temperature_amplitude.is_finite() && temperature_amplitude >= 0.0) {
            return Err(ForcingError::InvalidParameter(format!(
                "temperature amplitude must be non-negative, got {}",
                temperature_amplitude
            )));
        }
        if !(snow_thickness.is_finite() && snow_thickness >= 0.0) {
            return Err(ForcingError::InvalidParameter(format!(
                "snow thickness must be non-negative, got {}",
                snow_thickness
            )));
        }

        let amplitude = self.surface_amplitude(temperature_amplitude, snow_thickness);
        let index_seconds = thawing_index(temperature_mean, amplitude) * SECONDS_PER_DAY;

        Ok((2.0 * self.thawed_conductivity * index_seconds
            / (LATENT_HEAT_OF_FUSION * WATER_DENSITY * self.water_content))
            .sqrt())
    }
}

/// Thawing index (°C·days) of a sinusoidal year with the given mean and amplitude.
pub fn thawing_index(mean: f64, amplitude: f64) -> f64 {
    let amplitude = amplitude.abs();
    if mean >= amplitude {
        return mean * DAYS_PER_YEAR;
    }
    if mean <= -amplitude {
        return 0.0;
    }

    // Above zero while sin(ωt) > -mean / amplitude
    let theta = (-mean / amplitude).asin();
    DAYS_PER_YEAR / (2.0 * PI) * (mean * (PI - 2.0 * theta) + 2.0 * amplitude * theta.cos())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn forcing(mean: f64, amplitude: f64, snow: f64) -> Forcing {
        Forcing {
            temperature_mean: mean,
            temperature_amplitude: amplitude,
            snow_thickness: snow,
        }
    }

    /// Midpoint-rule integral of the positive part of the sinusoid.
    fn numeric_index(mean: f64, amplitude: f64) -> f64 {
        let n = 200_000;
        let dt = DAYS_PER_YEAR / n as f64;
        (0..n)
            .map(|i| {
                let t = (i as f64 + 0.5) * dt;
                (mean + amplitude * (2.0 * PI * t / DAYS_PER_YEAR).sin()).max(0.0) * dt
            })
            .sum()
    }

    #[test]
    fn test_thawing_index_matches_integral() {
        for &(mean, amplitude) in &[(-5.0, 15.0), (0.0, 10.0), (3.0, 12.0), (-9.5, 10.0)] {
            assert_relative_eq!(
                thawing_index(mean, amplitude),
                numeric_index(mean, amplitude),
                max_relative = 1e-4
            );
        }
    }

    #[test]
    fn test_thawing_index_limits() {
        assert_eq!(thawing_index(-20.0, 10.0), 0.0);
        assert_eq!(thawing_index(5.0, 0.0), 5.0 * DAYS_PER_YEAR);
        assert_eq!(thawing_index(-1.0, 0.0), 0.0);
    }

    #[test]
    fn test_frozen_year_has_no_active_layer() {
        let alt = StefanSolver::default()
            .active_layer_thickness(&forcing(-20.0, 10.0, 0.0))
            .unwrap();
        assert_eq!(alt, 0.0);
    }

    #[test]
    fn test_typical_interior_alaska() {
        let alt = StefanSolver::default()
            .active_layer_thickness(&forcing(-5.0, 15.0, 0.0))
            .unwrap();
        assert!(alt > 1.3 && alt < 1.45, "alt = {}", alt);
    }

    #[test]
    fn test_warmer_and_less_snow_thaws_deeper() {
        let solver = StefanSolver::default();
        let cold = solver.active_layer_thickness(&forcing(-8.0, 15.0, 0.3)).unwrap();
        let warm = solver.active_layer_thickness(&forcing(-4.0, 15.0, 0.3)).unwrap();
        assert!(warm > cold);

        let deep_snow = solver.active_layer_thickness(&forcing(-4.0, 15.0, 1.0)).unwrap();
        assert!(deep_snow < warm);
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(StefanSolver::new(0.0, 0.3, 2e-7).is_err());
        assert!(StefanSolver::new(1.0, 1.5, 2e-7).is_err());
        assert!(StefanSolver::new(1.0, 0.3, -1.0).is_err());

        let solver = StefanSolver::default();
        assert!(matches!(
            solver.active_layer_thickness(&forcing(-5.0, -1.0, 0.0)),
            Err(ForcingError::InvalidParameter(_))
        ));
        assert!(matches!(
            solver.active_layer_thickness(&forcing(f64::NAN, 10.0, 0.0)),
            Err(ForcingError::InvalidParameter(_))
        ));
    }
}
