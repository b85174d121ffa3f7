//! Config-driven workflow: build the grid, resolve soil depth, run, export.

use crate::config::{ForcingFormat, SimulationConfig, SoilConfig, TerrainConfig};
use crate::export::{export_snapshots, ExportTarget, Manifest};
use crate::simulation::{RunOutput, RunState, SimulationRun};
use crate::Result;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use thawslope_dem::{Grid, Raster};
use thawslope_forcing::{ActiveLayerSolver, ForcingLookup, ForcingSeries, MonthlyForcing};
use thawslope_metrics::MetricLabels;
use tracing::info;

/// Build the initial grid (without soil) from a terrain description.
pub fn build_grid(terrain: &TerrainConfig) -> Result<Grid> {
    let grid = match terrain {
        TerrainConfig::Geotiff {
            path,
            spacing_m,
            window,
        } => {
            let mut raster = Raster::from_file(path)?;
            if let Some(window) = window {
                raster = raster.window(*window)?;
            }
            raster.into_grid(*spacing_m)?
        }
        TerrainConfig::Flat {
            rows,
            cols,
            spacing_m,
            elevation,
        } => Grid::flat(*rows, *cols, *spacing_m, *elevation)?,
        TerrainConfig::Ramp {
            rows,
            cols,
            spacing_m,
            slope,
        } => Grid::ramp(*rows, *cols, *spacing_m, *slope)?,
    };
    info!(
        "Loaded {} terrain: {}x{} cells at {} m",
        terrain.label(),
        grid.rows(),
        grid.cols(),
        grid.spacing()
    );
    Ok(grid)
}

/// Load a forcing file as an annual series.
pub fn load_forcing(path: &Path, format: ForcingFormat, snow_density_ratio: f64) -> Result<ForcingSeries> {
    let series = match format {
        ForcingFormat::Annual => ForcingSeries::from_json_file(path)?,
        ForcingFormat::Monthly => MonthlyForcing::from_json_file(path)?.aggregate_annual(snow_density_ratio)?,
    };
    info!("Loaded {} forcing years from {}", series.len(), path.display());
    Ok(series)
}

/// Active-layer thickness for one year of forcing.
pub fn active_layer_depth(
    lookup: &dyn ForcingLookup,
    solver: &dyn ActiveLayerSolver,
    year: i32,
) -> Result<f64> {
    let forcing = lookup.forcing_for_year(year)?;
    let depth = solver.active_layer_thickness(&forcing)?;
    info!(
        "Active layer {:.3} m for {} (mean {:.2} °C, amplitude {:.2} °C, snow {:.2} m)",
        depth, year, forcing.temperature_mean, forcing.temperature_amplitude, forcing.snow_thickness
    );
    Ok(depth)
}

/// Uniform soil depth described by the soil section.
pub fn resolve_soil_depth(soil: &SoilConfig) -> Result<f64> {
    match soil {
        SoilConfig::Uniform { depth_m } => Ok(*depth_m),
        SoilConfig::ActiveLayer {
            forcing,
            format,
            year,
            solver,
            snow_density_ratio,
        } => {
            let series = load_forcing(forcing, *format, *snow_density_ratio)?;
            let solver = solver.build()?;
            active_layer_depth(&series, &solver, *year)
        }
    }
}

/// Build a ready-to-step run from a config.
pub fn prepare_run(config: &SimulationConfig) -> Result<SimulationRun> {
    config.validate()?;
    let depth = resolve_soil_depth(&config.soil)?;
    let grid = build_grid(&config.terrain)?.with_uniform_soil(depth)?;
    let run = SimulationRun::new(
        grid,
        config.diffusion.params()?,
        config.run.steps,
        config.run.snapshot_interval,
        config.run.snapshot_kind,
    )?
    .with_metric_labels(MetricLabels::new(&config.name, config.terrain.label()));
    Ok(run)
}

/// Result of [`execute`].
#[derive(Debug)]
pub struct RunSummary {
    pub state: RunState,
    pub steps_completed: u64,
    pub elapsed_years: f64,
    pub manifest: Manifest,
}

/// Run a config to completion (or cancellation) and export its snapshots.
///
/// Snapshots captured before a cancellation are still exported.
pub fn execute(config: &SimulationConfig, cancel: &AtomicBool) -> Result<RunSummary> {
    let mut run = prepare_run(config)?;
    let state = run.run(cancel)?;
    let elapsed_years = run.elapsed_years();

    let RunOutput {
        grid,
        snapshots,
        steps_completed,
        ..
    } = run.into_output();
    let target = ExportTarget {
        dir: config.output.dir.clone(),
        prefix: config.output.prefix.clone(),
        spacing: grid.spacing(),
        origin: grid.origin(),
    };
    let manifest = export_snapshots(&config.name, &snapshots, &target)?;

    info!(
        "Run '{}' {:?} after {} steps ({} yr)",
        config.name, state, steps_completed, elapsed_years
    );
    Ok(RunSummary {
        state,
        steps_completed,
        elapsed_years,
        manifest,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use thawslope_forcing::{Forcing, ForcingError, StefanSolver};

    struct FixedForcing(Forcing);

    impl ForcingLookup for FixedForcing {
        fn forcing_for_year(&self, year: i32) -> thawslope_forcing::Result<Forcing> {
            if year == 2000 {
                Ok(self.0)
            } else {
                Err(ForcingError::MissingInput { year })
            }
        }
    }

    #[test]
    fn test_active_layer_depth_through_traits() {
        let lookup = FixedForcing(Forcing {
            temperature_mean: -5.0,
            temperature_amplitude: 15.0,
            snow_thickness: 0.0,
        });
        let solver = StefanSolver::default();
        let depth = active_layer_depth(&lookup, &solver, 2000).unwrap();
        assert!(depth > 1.3 && depth < 1.45, "depth = {depth}");

        let err = active_layer_depth(&lookup, &solver, 1999).unwrap_err();
        assert!(err.is_missing_input());
    }

    #[test]
    fn test_build_ramp_grid() {
        let grid = build_grid(&TerrainConfig::Ramp {
            rows: 2,
            cols: 4,
            spacing_m: 10.0,
            slope: 0.5,
        })
        .unwrap();
        assert_eq!(grid.shape(), (2, 4));
        assert_abs_diff_eq!(grid.elevation()[[1, 3]], 15.0);
    }

    #[test]
    fn test_uniform_soil_depth() {
        assert_eq!(resolve_soil_depth(&SoilConfig::Uniform { depth_m: 0.7 }).unwrap(), 0.7);
    }
}
