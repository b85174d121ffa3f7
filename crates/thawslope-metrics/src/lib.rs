//! Metric declarations for the hillslope run loop.
//!
//! Every metric the runner emits is declared once in [`metric_defs`], so names
//! are never typed twice and the description and unit travel with the name.
//! Recording goes through the `metrics` facade, re-exported here; without an
//! installed recorder every call is a no-op.
//!
//! ```rust
//! use thawslope_metrics::{metric_defs, MetricLabels};
//!
//! let labels = MetricLabels::new("toolik_1000yr", "geotiff").to_labels();
//! metrics::counter!(metric_defs::RUN_STEPS.name, &labels).increment(1);
//! metrics::gauge!(metric_defs::RUN_ELAPSED_YEARS.name, &labels).set(1.0);
//! ```

pub use metrics;

use metrics::{describe_counter, describe_gauge, describe_histogram, Unit};

/// How a metric is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
    Histogram,
}

/// Name, kind, unit, description and label keys of one metric.
///
/// Built in `const` context:
///
/// ```rust
/// use thawslope_metrics::{Metric, MetricKind};
///
/// const RELAXATION: Metric = Metric::gauge("thawslope.run.relaxation_m")
///     .with_description("Elevation change still left to relax (m)")
///     .with_labels(&["run"]);
///
/// assert_eq!(RELAXATION.kind, MetricKind::Gauge);
/// assert!(RELAXATION.unit.is_none());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Metric {
    pub name: &'static str,
    pub kind: MetricKind,
    pub description: &'static str,
    /// `None` for quantities `metrics::Unit` has no variant for, such as metres or years.
    pub unit: Option<Unit>,
    pub labels: &'static [&'static str],
}

impl Metric {
    const fn of_kind(kind: MetricKind, name: &'static str) -> Self {
        Self {
            name,
            kind,
            description: "",
            unit: None,
            labels: &[],
        }
    }

    pub const fn counter(name: &'static str) -> Self {
        Self::of_kind(MetricKind::Counter, name)
    }

    pub const fn gauge(name: &'static str) -> Self {
        Self::of_kind(MetricKind::Gauge, name)
    }

    pub const fn histogram(name: &'static str) -> Self {
        Self::of_kind(MetricKind::Histogram, name)
    }

    pub const fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub const fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }

    pub const fn with_labels(mut self, labels: &'static [&'static str]) -> Self {
        self.labels = labels;
        self
    }

    /// Register the description, and the unit if any, with the installed recorder.
    pub fn describe(&self) {
        match (self.kind, self.unit) {
            (MetricKind::Counter, Some(unit)) => describe_counter!(self.name, unit, self.description),
            (MetricKind::Counter, None) => describe_counter!(self.name, self.description),
            (MetricKind::Gauge, Some(unit)) => describe_gauge!(self.name, unit, self.description),
            (MetricKind::Gauge, None) => describe_gauge!(self.name, self.description),
            (MetricKind::Histogram, Some(unit)) => describe_histogram!(self.name, unit, self.description),
            (MetricKind::Histogram, None) => describe_histogram!(self.name, self.description),
        }
    }
}

/// Metrics emitted by `SimulationRun`. All carry the [`LABEL_KEYS`] labels.
///
/// [`LABEL_KEYS`]: metric_defs::LABEL_KEYS
pub mod metric_defs {
    use super::{Metric, Unit};

    pub const LABEL_KEYS: [&str; 2] = ["run", "terrain"];

    pub const RUN_STEPS: Metric = Metric::counter("thawslope.run.steps")
        .with_description("Completed simulation steps")
        .with_unit(Unit::Count)
        .with_labels(&LABEL_KEYS);

    /// Explicit sub-steps; exceeds `RUN_STEPS` when dt is above the stability bound.
    pub const RUN_SUBSTEPS: Metric = Metric::counter("thawslope.run.substeps")
        .with_description("Explicit diffusion sub-steps executed")
        .with_unit(Unit::Count)
        .with_labels(&LABEL_KEYS);

    pub const RUN_SNAPSHOTS: Metric = Metric::counter("thawslope.run.snapshots")
        .with_description("Snapshots captured, including step 0")
        .with_unit(Unit::Count)
        .with_labels(&LABEL_KEYS);

    pub const RUN_STEP_TIME: Metric = Metric::histogram("thawslope.run.step_time_us")
        .with_description("Wall-clock time of one simulation step")
        .with_unit(Unit::Microseconds)
        .with_labels(&LABEL_KEYS);

    pub const RUN_MAX_ELEVATION_CHANGE: Metric = Metric::gauge("thawslope.run.max_elevation_change_m")
        .with_description("Largest absolute cell elevation change in the latest step (m)")
        .with_labels(&LABEL_KEYS);

    /// Should stay at zero up to round-off under reflective edges.
    pub const RUN_NET_ELEVATION_CHANGE: Metric = Metric::gauge("thawslope.run.net_elevation_change_m")
        .with_description("Sum of cell elevation changes in the latest step (m)")
        .with_labels(&LABEL_KEYS);

    pub const RUN_ELAPSED_YEARS: Metric = Metric::gauge("thawslope.run.elapsed_years")
        .with_description("Simulated years elapsed")
        .with_labels(&LABEL_KEYS);

    pub const ALL: [Metric; 7] = [
        RUN_STEPS,
        RUN_SUBSTEPS,
        RUN_SNAPSHOTS,
        RUN_STEP_TIME,
        RUN_MAX_ELEVATION_CHANGE,
        RUN_NET_ELEVATION_CHANGE,
        RUN_ELAPSED_YEARS,
    ];
}

/// Run name and terrain source attached to every run metric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricLabels {
    pub run: String,
    /// `geotiff`, `flat` or `ramp`.
    pub terrain: String,
}

impl MetricLabels {
    pub fn new(run: impl Into<String>, terrain: impl Into<String>) -> Self {
        Self {
            run: run.into(),
            terrain: terrain.into(),
        }
    }

    /// Key/value pairs in [`metric_defs::LABEL_KEYS`] order.
    pub fn to_labels(&self) -> Vec<(&'static str, String)> {
        let [run, terrain] = metric_defs::LABEL_KEYS;
        vec![(run, self.run.clone()), (terrain, self.terrain.clone())]
    }
}

/// Describe every run metric. Call once after installing a recorder.
pub fn describe_metrics() {
    metric_defs::ALL.iter().for_each(Metric::describe);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_follow_key_order() {
        let labels = MetricLabels::new("toolik", "flat").to_labels();
        assert_eq!(
            labels,
            vec![("run", "toolik".to_string()), ("terrain", "flat".to_string())]
        );
    }

    #[test]
    fn test_definitions() {
        assert_eq!(metric_defs::RUN_STEPS.kind, MetricKind::Counter);
        assert_eq!(metric_defs::RUN_STEP_TIME.kind, MetricKind::Histogram);
        assert_eq!(metric_defs::RUN_STEP_TIME.unit, Some(Unit::Microseconds));
        assert_eq!(metric_defs::RUN_ELAPSED_YEARS.kind, MetricKind::Gauge);
        assert!(metric_defs::ALL.iter().all(|m| m.name.starts_with("thawslope.run.")));
        assert!(metric_defs::ALL
            .iter()
            .all(|m| m.labels == metric_defs::LABEL_KEYS.as_slice() && !m.description.is_empty()));
    }

    #[test]
    fn test_metre_and_year_gauges_have_no_unit() {
        for m in [
            metric_defs::RUN_MAX_ELEVATION_CHANGE,
            metric_defs::RUN_NET_ELEVATION_CHANGE,
            metric_defs::RUN_ELAPSED_YEARS,
        ] {
            assert_eq!(m.unit, None, "{}", m.name);
        }
        assert_eq!(metric_defs::RUN_STEPS.unit, Some(Unit::Count));
    }

    #[test]
    fn test_names_unique() {
        let mut names: Vec<&str> = metric_defs::ALL.iter().map(|m| m.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), metric_defs::ALL.len());
    }

    #[test]
    fn test_describe_without_recorder() {
        describe_metrics();
    }
}
