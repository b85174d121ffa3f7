//! YAML run configuration.
//!
//! ```yaml
//! name: toolik_hillslope
//! terrain:
//!   source: geotiff
//!   path: dem/toolik_30m.tif
//!   window: { row: 100, col: 250, rows: 200, cols: 200 }
//! soil:
//!   kind: active_layer
//!   forcing: forcing/era5_monthly.json
//!   format: monthly
//!   year: 2015
//! diffusion:
//!   diffusivity: 1.0e-2
//!   decay_depth: 1.0
//!   dt_years: 1.0
//! run:
//!   steps: 1000
//!   snapshot_interval: 100
//!   snapshot_kind: difference
//! output:
//!   dir: output/toolik
//! ```
//!
//! Relative paths are resolved against the directory of the config file.

use crate::snapshot::SnapshotKind;
use crate::{Result, RunError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thawslope_dem::Window;
use thawslope_diffusion::DiffusionParams;
use thawslope_forcing::{StefanSolver, DEFAULT_SNOW_DENSITY_RATIO};

/// Complete configuration of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationConfig {
    /// Run name, used in logs and metric labels.
    #[serde(default = "default_name")]
    pub name: String,
    /// Initial elevation source.
    pub terrain: TerrainConfig,
    /// Soil depth source.
    pub soil: SoilConfig,
    /// Transport law constants.
    #[serde(default)]
    pub diffusion: DiffusionConfig,
    /// Step count and snapshot cadence.
    pub run: RunConfig,
    /// Where snapshots go.
    #[serde(default)]
    pub output: OutputConfig,
}

fn default_name() -> String {
    "thawslope".to_string()
}

/// Initial elevation source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum TerrainConfig {
    /// A GeoTIFF DEM, optionally clipped to a window.
    Geotiff {
        path: PathBuf,
        /// Cell size override in meters (required for non-square pixels).
        #[serde(default)]
        spacing_m: Option<f64>,
        #[serde(default)]
        window: Option<Window>,
    },
    /// A flat surface.
    Flat {
        rows: usize,
        cols: usize,
        spacing_m: f64,
        elevation: f64,
    },
    /// A west-to-east ramp rising `slope` meters per meter.
    Ramp {
        rows: usize,
        cols: usize,
        spacing_m: f64,
        slope: f64,
    },
}

impl TerrainConfig {
    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            TerrainConfig::Geotiff { .. } => "geotiff",
            TerrainConfig::Flat { .. } => "flat",
            TerrainConfig::Ramp { .. } => "ramp",
        }
    }
}

/// Soil depth source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SoilConfig {
    /// The same soil depth everywhere.
    Uniform { depth_m: f64 },
    /// Active-layer thickness evaluated from forcing for one year.
    ActiveLayer {
        forcing: PathBuf,
        #[serde(default)]
        format: ForcingFormat,
        year: i32,
        #[serde(default)]
        solver: SolverConfig,
        /// Snow-to-water density ratio for monthly SWE conversion.
        #[serde(default = "default_snow_density_ratio")]
        snow_density_ratio: f64,
    },
}

fn default_snow_density_ratio() -> f64 {
    DEFAULT_SNOW_DENSITY_RATIO
}

/// Layout of a forcing file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForcingFormat {
    /// One record per year with mean, amplitude and snow thickness.
    #[default]
    Annual,
    /// One record per month with temperature and SWE.
    Monthly,
}

/// Stefan solver constants.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SolverConfig {
    /// W/m/K
    pub thawed_conductivity: f64,
    pub water_content: f64,
    /// m²/s
    pub snow_diffusivity: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        let solver = StefanSolver::default();
        Self {
            thawed_conductivity: solver.thawed_conductivity(),
            water_content: solver.water_content(),
            snow_diffusivity: solver.snow_diffusivity(),
        }
    }
}

impl SolverConfig {
    /// Build the solver, validating the constants.
    pub fn build(&self) -> Result<StefanSolver> {
        Ok(StefanSolver::new(
            self.thawed_conductivity,
            self.water_content,
            self.snow_diffusivity,
        )?)
    }
}

/// Transport law constants.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct DiffusionConfig {
    /// m²/yr
    pub diffusivity: f64,
    /// m
    pub decay_depth: f64,
    pub dt_years: f64,
}

impl Default for DiffusionConfig {
    fn default() -> Self {
        Self {
            diffusivity: 1e-2,
            decay_depth: 1.0,
            dt_years: 1.0,
        }
    }
}

impl DiffusionConfig {
    /// Validated parameters.
    pub fn params(&self) -> Result<DiffusionParams> {
        Ok(DiffusionParams::new(self.diffusivity, self.decay_depth, self.dt_years)?)
    }
}

/// Step count and snapshot cadence.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Number of steps of `dt_years` each.
    pub steps: u64,
    /// Capture a snapshot every this many steps.
    pub snapshot_interval: u64,
    #[serde(default)]
    pub snapshot_kind: SnapshotKind,
}

/// Output location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    /// File name prefix for snapshot rasters.
    pub prefix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
            prefix: "elevation".to_string(),
        }
    }
}

impl SimulationConfig {
    /// Parse a YAML document. Paths are left as written.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: SimulationConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a YAML file, resolving relative paths against its directory.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml_str(&text)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    /// Make every relative path absolute with respect to `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        if let TerrainConfig::Geotiff { path, .. } = &mut self.terrain {
            resolve(path);
        }
        if let SoilConfig::ActiveLayer { forcing, .. } = &mut self.soil {
            resolve(forcing);
        }
        resolve(&mut self.output.dir);
    }

    /// Reject values that can never produce a run.
    pub fn validate(&self) -> Result<()> {
        self.diffusion.params()?;
        if self.run.steps == 0 {
            return Err(RunError::InvalidParameter("run.steps must be at least 1".to_string()));
        }
        if self.run.snapshot_interval == 0 {
            return Err(RunError::InvalidParameter(
                "run.snapshot_interval must be at least 1".to_string(),
            ));
        }
        if let SoilConfig::Uniform { depth_m } = self.soil {
            if !(depth_m.is_finite() && depth_m >= 0.0) {
                return Err(RunError::InvalidParameter(format!(
                    "soil.depth_m must be non-negative, got {}",
                    depth_m
                )));
            }
        }
        Ok(())
    }
}
