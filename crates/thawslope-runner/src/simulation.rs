//! Time loop over the diffusion update.
//!
//! A [`SimulationRun`] owns the grid for its whole lifetime. Each call to
//! [`SimulationRun::step`] advances simulated time by one configured `dt`,
//! split into as many explicit sub-steps as the stability bound requires, and
//! captures a snapshot when one is due. Step 0 and the final step are always
//! captured.
//!
//! ```text
//!   Ready ──step()──▶ Running ──last step──▶ Finished
//!                        │
//!                        └──cancel flag──▶ Cancelled
//! ```

use crate::snapshot::{Snapshot, SnapshotKind, SnapshotSeries};
use crate::{Result, RunError};
use ndarray::Array2;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use thawslope_dem::Grid;
use thawslope_diffusion::{DiffusionParams, StepReport, Stepper};
use thawslope_metrics::{metric_defs, MetricLabels};
use tracing::{debug, info, info_span, warn};

/// Lifecycle of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Constructed, no step taken yet.
    Ready,
    /// At least one step taken, more remaining.
    Running,
    /// All configured steps completed.
    Finished,
    /// Stopped early by the cancel flag.
    Cancelled,
}

impl RunState {
    /// Whether no further steps may be taken.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Finished | RunState::Cancelled)
    }
}

/// A hillslope evolution run over a fixed number of steps.
#[derive(Debug)]
pub struct SimulationRun {
    grid: Grid,
    initial: Array2<f64>,
    params: DiffusionParams,
    substep_params: DiffusionParams,
    substeps: u32,
    stepper: Stepper,
    total_steps: u64,
    snapshot_interval: u64,
    snapshot_kind: SnapshotKind,
    steps_completed: u64,
    state: RunState,
    snapshots: SnapshotSeries,
    labels: Vec<(&'static str, String)>,
}

/// What a run leaves behind.
#[derive(Debug)]
pub struct RunOutput {
    /// Grid after the last completed step.
    pub grid: Grid,
    /// Captured snapshots, oldest first.
    pub snapshots: SnapshotSeries,
    /// `Finished` or `Cancelled` (or `Ready`/`Running` if never driven to the end).
    pub state: RunState,
    pub steps_completed: u64,
}

impl SimulationRun {
    /// Set up a run and capture the initial snapshot.
    ///
    /// `params.dt` is the configured step. When it exceeds the explicit
    /// stability bound for the grid spacing, every step is split into equal
    /// stable sub-steps.
    pub fn new(
        grid: Grid,
        params: DiffusionParams,
        total_steps: u64,
        snapshot_interval: u64,
        snapshot_kind: SnapshotKind,
    ) -> Result<Self> {
        params.validate()?;
        if total_steps == 0 {
            return Err(RunError::InvalidParameter("total steps must be at least 1".to_string()));
        }
        if snapshot_interval == 0 {
            return Err(RunError::InvalidParameter(
                "snapshot interval must be at least 1".to_string(),
            ));
        }

        let spacing = grid.spacing();
        let substeps = params.substeps(spacing)?;
        let substep_params = params.with_dt(params.dt / f64::from(substeps))?;
        if substeps > 1 {
            warn!(
                "dt = {} yr exceeds the stability bound {:.4} yr at {} m spacing; using {} sub-steps",
                params.dt,
                params.max_stable_dt(spacing),
                spacing,
                substeps
            );
        }

        let initial = grid.elevation().to_owned();
        let mut snapshots = SnapshotSeries::new();
        snapshots.push(Snapshot::capture(
            0,
            0.0,
            snapshot_kind,
            grid.elevation(),
            initial.view(),
        ))?;

        Ok(Self {
            stepper: Stepper::new(grid.shape()),
            grid,
            initial,
            params,
            substep_params,
            substeps,
            total_steps,
            snapshot_interval,
            snapshot_kind,
            steps_completed: 0,
            state: RunState::Ready,
            snapshots,
            labels: MetricLabels::new("thawslope", "grid").to_labels(),
        })
    }

    /// Attach run and terrain labels to emitted metrics.
    pub fn with_metric_labels(mut self, labels: MetricLabels) -> Self {
        self.labels = labels.to_labels();
        self
    }

    /// Advance by one configured time step.
    ///
    /// The returned report covers the whole step: `max_abs_change` is the
    /// largest single sub-step change, `net_change` sums all sub-steps.
    pub fn step(&mut self) -> Result<StepReport> {
        if self.state.is_terminal() {
            return Err(RunError::RunFinished {
                steps: self.steps_completed,
            });
        }

        let index = self.steps_completed + 1;
        let _span = info_span!("step", step = index).entered();
        let start = Instant::now();

        let spacing = self.grid.spacing();
        let mut report = StepReport::default();
        for _ in 0..self.substeps {
            let (elevation, soil_depth) = self.grid.elevation_and_soil_mut();
            let sub = self
                .stepper
                .step(elevation, soil_depth, spacing, &self.substep_params)?;
            report.max_abs_change = report.max_abs_change.max(sub.max_abs_change);
            report.net_change += sub.net_change;
        }

        self.steps_completed = index;
        self.state = if index == self.total_steps {
            RunState::Finished
        } else {
            RunState::Running
        };
        debug!(
            max_abs_change = report.max_abs_change,
            net_change = report.net_change,
            "step complete"
        );

        if self.state == RunState::Finished || index % self.snapshot_interval == 0 {
            self.capture()?;
        }
        self.record_metrics(&report, start);
        Ok(report)
    }

    /// Step until finished or until `cancel` is set.
    ///
    /// The flag is polled between steps, so a step is never left half done.
    /// On cancellation the current state is captured unless it already was.
    pub fn run(&mut self, cancel: &AtomicBool) -> Result<RunState> {
        if self.state.is_terminal() {
            return Err(RunError::RunFinished {
                steps: self.steps_completed,
            });
        }
        info!(
            "Running {} steps of {} yr ({} sub-steps each) on a {}x{} grid",
            self.total_steps,
            self.params.dt,
            self.substeps,
            self.grid.rows(),
            self.grid.cols()
        );

        while !self.state.is_terminal() {
            if cancel.load(Ordering::Relaxed) {
                self.cancel()?;
                break;
            }
            self.step()?;
        }
        Ok(self.state)
    }

    /// Stop the run at the current step.
    pub fn cancel(&mut self) -> Result<()> {
        if self.state.is_terminal() {
            return Ok(());
        }
        let already_captured = self
            .snapshots
            .last()
            .is_some_and(|s| s.step() == self.steps_completed);
        if !already_captured {
            self.capture()?;
        }
        self.state = RunState::Cancelled;
        warn!(
            "Run cancelled after {} of {} steps ({} yr)",
            self.steps_completed,
            self.total_steps,
            self.elapsed_years()
        );
        Ok(())
    }

    fn capture(&mut self) -> Result<()> {
        let snapshot = Snapshot::capture(
            self.steps_completed,
            self.elapsed_years(),
            self.snapshot_kind,
            self.grid.elevation(),
            self.initial.view(),
        );
        self.snapshots.push(snapshot)?;
        metrics::counter!(metric_defs::RUN_SNAPSHOTS.name, &self.labels).increment(1);
        debug!("Captured snapshot at step {}", self.steps_completed);
        Ok(())
    }

    fn record_metrics(&self, report: &StepReport, start: Instant) {
        let labels = &self.labels;
        metrics::counter!(metric_defs::RUN_STEPS.name, labels).increment(1);
        metrics::counter!(metric_defs::RUN_SUBSTEPS.name, labels).increment(u64::from(self.substeps));
        metrics::histogram!(metric_defs::RUN_STEP_TIME.name, labels)
            .record(start.elapsed().as_secs_f64() * 1e6);
        metrics::gauge!(metric_defs::RUN_MAX_ELEVATION_CHANGE.name, labels).set(report.max_abs_change);
        metrics::gauge!(metric_defs::RUN_NET_ELEVATION_CHANGE.name, labels).set(report.net_change);
        metrics::gauge!(metric_defs::RUN_ELAPSED_YEARS.name, labels).set(self.elapsed_years());
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn steps_completed(&self) -> u64 {
        self.steps_completed
    }

    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    /// Simulated years since step 0.
    pub fn elapsed_years(&self) -> f64 {
        self.steps_completed as f64 * self.params.dt
    }

    /// Explicit sub-steps per configured step.
    pub fn substeps(&self) -> u32 {
        self.substeps
    }

    pub fn params(&self) -> &DiffusionParams {
        &self.params
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn snapshots(&self) -> &SnapshotSeries {
        &self.snapshots
    }

    /// Consume the run, returning the final grid and its snapshots.
    pub fn into_output(self) -> RunOutput {
        RunOutput {
            grid: self.grid,
            snapshots: self.snapshots,
            state: self.state,
            steps_completed: self.steps_completed,
        }
    }
}
