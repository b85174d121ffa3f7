//! # thawslope-runner
//!
//! Drives hillslope evolution runs: reads a YAML config, builds the initial
//! grid, resolves soil depth from climate forcing, steps the diffusion update
//! and exports snapshots.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::atomic::AtomicBool;
//! use thawslope_runner::{execute, SimulationConfig};
//!
//! let config = SimulationConfig::from_yaml_file("runs/toolik.yaml")?;
//! let summary = execute(&config, &AtomicBool::new(false))?;
//! println!("{} snapshots written", summary.manifest.snapshots.len());
//! # Ok::<(), thawslope_runner::RunError>(())
//! ```
//!
//! Runs can also be driven step by step:
//!
//! ```
//! use thawslope_dem::Grid;
//! use thawslope_diffusion::DiffusionParams;
//! use thawslope_runner::{RunState, SimulationRun, SnapshotKind};
//!
//! let grid = Grid::ramp(4, 8, 1.0, 0.5)?.with_uniform_soil(1.0)?;
//! let params = DiffusionParams::new(1e-2, 1.0, 1.0)?;
//! let mut run = SimulationRun::new(grid, params, 3, 1, SnapshotKind::Difference)?;
//! while run.state() != RunState::Finished {
//!     run.step()?;
//! }
//! assert_eq!(run.snapshots().len(), 4);
//! # Ok::<(), thawslope_runner::RunError>(())
//! ```

pub mod config;
mod error;
pub mod export;
pub mod simulation;
pub mod snapshot;
pub mod workflow;

pub use config::{
    DiffusionConfig, ForcingFormat, OutputConfig, RunConfig, SimulationConfig, SoilConfig,
    SolverConfig, TerrainConfig,
};
pub use error::RunError;
pub use export::{export_snapshots, ExportTarget, Manifest, ManifestEntry, MANIFEST_FILE};
pub use simulation::{RunOutput, RunState, SimulationRun};
pub use snapshot::{Snapshot, SnapshotKind, SnapshotSeries};
pub use workflow::{execute, prepare_run, RunSummary};

/// Result type for run operations.
pub type Result<T> = std::result::Result<T, RunError>;
