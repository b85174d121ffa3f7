//! Monthly reanalysis records and their aggregation into annual forcing.

use crate::series::{ForcingRecord, ForcingSeries};
use crate::{ForcingError, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::warn;

/// Default ratio of snow density to water density.
pub const DEFAULT_SNOW_DENSITY_RATIO: f64 = 0.3;

/// One month of air temperature and snow water equivalent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MonthlyRecord {
    /// Any day within the month.
    pub timestamp: NaiveDate,
    /// Monthly mean 2 m air temperature (°C).
    pub temperature: f64,
    /// Snow water equivalent (m of water).
    pub snow_water_equivalent: f64,
}

/// A monthly forcing series as delivered by the reanalysis download.
#[derive(Debug, Clone, Default)]
pub struct MonthlyForcing {
    records: Vec<MonthlyRecord>,
}

impl MonthlyForcing {
    /// Wrap a list of monthly records.
    pub fn new(records: Vec<MonthlyRecord>) -> Self {
        Self { records }
    }

    /// Load a JSON array of [`MonthlyRecord`]s.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::new(serde_json::from_str(&text)?))
    }

    /// The raw monthly records.
    pub fn records(&self) -> &[MonthlyRecord] {
        &self.records
    }

    /// Aggregate complete calendar years into an annual series.
    ///
    /// Per year: mean of the twelve monthly temperatures, amplitude as half of
    /// the warmest-minus-coldest spread, and snow thickness as the peak SWE
    /// divided by `snow_density_ratio`. Years without all twelve months are
    /// skipped.
    pub fn aggregate_annual(&self, snow_density_ratio: f64) -> Result<ForcingSeries> {
        if !(snow_density_ratio.is_finite() && snow_density_ratio > 0.0) {
            return Err(ForcingError::InvalidParameter(format!(
                "snow density ratio must be positive, got {}",
                snow_density_ratio
            )));
        }

        let mut by_year: BTreeMap<i32, BTreeMap<u32, MonthlyRecord>> = BTreeMap::new();
        for record in &self.records {
            let months = by_year.entry(record.timestamp.year()).or_default();
            if months.insert(record.timestamp.month(), *record).is_some() {
                return Err(ForcingError::InvalidParameter(format!(
                    "duplicate monthly record for {}-{:02}",
                    record.timestamp.year(),
                    record.timestamp.month()
                )));
            }
        }

        let mut annual = Vec::with_capacity(by_year.len());
        for (year, months) in by_year {
            if months.len() != 12 {
                warn!(year, months = months.len(), "skipping incomplete forcing year");
                continue;
            }

            let temperatures: Vec<f64> = months.values().map(|m| m.temperature).collect();
            let mean = temperatures.iter().sum::<f64>() / temperatures.len() as f64;
            let (coldest, warmest) = temperatures
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &t| (lo.min(t), hi.max(t)));
            let peak_swe = months
                .values()
                .map(|m| m.snow_water_equivalent)
                .fold(0.0_f64, f64::max);

            let timestamp = NaiveDate::from_ymd_opt(year, 1, 1)
                .ok_or_else(|| ForcingError::InvalidParameter(format!("year {} out of range", year)))?;

            annual.push(ForcingRecord {
                timestamp,
                temperature_mean: mean,
                temperature_amplitude: (warmest - coldest) / 2.0,
                snow_thickness: peak_swe / snow_density_ratio,
            });
        }

        ForcingSeries::from_records(annual)
    }
}
