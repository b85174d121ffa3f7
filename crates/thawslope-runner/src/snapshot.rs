//! Read-only captures of the elevation field.

use crate::{Result, RunError};
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

/// What a snapshot stores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotKind {
    /// Absolute elevation (m).
    #[default]
    Elevation,
    /// Elevation minus the initial elevation (m).
    Difference,
}

/// An immutable copy of a field at one point of simulated time.
#[derive(Debug, Clone)]
pub struct Snapshot {
    step: u64,
    elapsed_years: f64,
    kind: SnapshotKind,
    field: Array2<f64>,
}

impl Snapshot {
    /// Capture `elevation`, subtracting `initial` for difference snapshots.
    ///
    /// The inputs are only read.
    pub fn capture(
        step: u64,
        elapsed_years: f64,
        kind: SnapshotKind,
        elevation: ArrayView2<'_, f64>,
        initial: ArrayView2<'_, f64>,
    ) -> Self {
        let field = match kind {
            SnapshotKind::Elevation => elevation.to_owned(),
            SnapshotKind::Difference => &elevation - &initial,
        };
        Self {
            step,
            elapsed_years,
            kind,
            field,
        }
    }

    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn elapsed_years(&self) -> f64 {
        self.elapsed_years
    }

    pub fn kind(&self) -> SnapshotKind {
        self.kind
    }

    pub fn field(&self) -> ArrayView2<'_, f64> {
        self.field.view()
    }

    /// Minimum and maximum of the captured field.
    pub fn range(&self) -> (f64, f64) {
        self.field
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &z| (lo.min(z), hi.max(z)))
    }
}

/// Snapshots in strictly increasing elapsed time.
#[derive(Debug, Clone, Default)]
pub struct SnapshotSeries {
    snapshots: Vec<Snapshot>,
}

impl SnapshotSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a snapshot that is later than every snapshot already held.
    pub fn push(&mut self, snapshot: Snapshot) -> Result<()> {
        if let Some(last) = self.snapshots.last() {
            if snapshot.elapsed_years <= last.elapsed_years {
                return Err(RunError::SnapshotOrder {
                    elapsed_years: snapshot.elapsed_years,
                    previous_years: last.elapsed_years,
                });
            }
        }
        self.snapshots.push(snapshot);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn first(&self) -> Option<&Snapshot> {
        self.snapshots.first()
    }

    pub fn last(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Snapshot> {
        self.snapshots.iter()
    }
}

impl<'a> IntoIterator for &'a SnapshotSeries {
    type Item = &'a Snapshot;
    type IntoIter = std::slice::Iter<'a, Snapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.snapshots.iter()
    }
}
