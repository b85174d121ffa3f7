//! Annual forcing series and the year lookup interface.

use crate::{ForcingError, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// The three forcing values consumed per simulated year.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Forcing {
    /// Mean annual air temperature (°C).
    pub temperature_mean: f64,
    /// Half the annual temperature range (°C).
    pub temperature_amplitude: f64,
    /// Snow thickness (m).
    pub snow_thickness: f64,
}

/// One record of an annual forcing series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForcingRecord {
    /// Start of the period the record covers.
    pub timestamp: NaiveDate,
    /// Mean air temperature (°C).
    pub temperature_mean: f64,
    /// Temperature amplitude (°C).
    pub temperature_amplitude: f64,
    /// Snow thickness (m).
    pub snow_thickness: f64,
}

impl ForcingRecord {
    /// Calendar year of the record.
    pub fn year(&self) -> i32 {
        self.timestamp.year()
    }

    /// The forcing values without the timestamp.
    pub fn forcing(&self) -> Forcing {
        Forcing {
            temperature_mean: self.temperature_mean,
            temperature_amplitude: self.temperature_amplitude,
            snow_thickness: self.snow_thickness,
        }
    }
}

/// Read-only access to forcing by year.
pub trait ForcingLookup {
    /// Forcing for `year`, or [`ForcingError::MissingInput`].
    fn forcing_for_year(&self, year: i32) -> Result<Forcing>;
}

/// An ordered, immutable series of annual forcing records.
#[derive(Debug, Clone, Default)]
pub struct ForcingSeries {
    records: BTreeMap<i32, ForcingRecord>,
}

impl ForcingSeries {
    /// Build a series, rejecting two records in the same year.
    pub fn from_records<I>(records: I) -> Result<Self>
    where
        I: IntoIterator<Item = ForcingRecord>,
    {
        let mut by_year = BTreeMap::new();
        for record in records {
            let year = record.year();
            if by_year.insert(year, record).is_some() {
                return Err(ForcingError::DuplicateYear(year));
            }
        }
        Ok(Self { records: by_year })
    }

    /// Load a JSON array of [`ForcingRecord`]s.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Parse a JSON array of [`ForcingRecord`]s.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let records: Vec<ForcingRecord> = serde_json::from_str(text)?;
        Self::from_records(records)
    }

    /// Records in timestamp order.
    pub fn records(&self) -> impl Iterator<Item = &ForcingRecord> {
        self.records.values()
    }

    /// Years covered, ascending.
    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.records.keys().copied()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the series has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl ForcingLookup for ForcingSeries {
    fn forcing_for_year(&self, year: i32) -> Result<Forcing> {
        self.records
            .get(&year)
            .map(ForcingRecord::forcing)
            .ok_or(ForcingError::MissingInput { year })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(year: i32, mean: f64) -> ForcingRecord {
        ForcingRecord {
            timestamp: NaiveDate::from_ymd_opt(year, 1, 1).unwrap(),
            temperature_mean: mean,
            temperature_amplitude: 15.0,
            snow_thickness: 0.4,
        }
    }

    #[test]
    fn test_lookup_and_missing_year() {
        let series = ForcingSeries::from_records(vec![record(2001, -4.0), record(2000, -5.0)]).unwrap();

        let forcing = series.forcing_for_year(2000).unwrap();
        assert_eq!(forcing.temperature_mean, -5.0);
        assert_eq!(forcing.temperature_amplitude, 15.0);
        assert_eq!(forcing.snow_thickness, 0.4);

        match series.forcing_for_year(1999) {
            Err(ForcingError::MissingInput { year }) => assert_eq!(year, 1999),
            other => panic!("expected MissingInput, got {other:?}"),
        }
    }

    #[test]
    fn test_records_are_ordered() {
        let series =
            ForcingSeries::from_records(vec![record(2003, 0.0), record(2001, 0.0), record(2002, 0.0)]).unwrap();
        let years: Vec<i32> = series.years().collect();
        assert_eq!(years, vec![2001, 2002, 2003]);
        assert_eq!(series.len(), 3);
    }

    #[test]
    fn test_duplicate_year_rejected() {
        let mut second = record(2000, -3.0);
        second.timestamp = NaiveDate::from_ymd_opt(2000, 6, 1).unwrap();
        let err = ForcingSeries::from_records(vec![record(2000, -5.0), second]).unwrap_err();
        assert!(matches!(err, ForcingError::DuplicateYear(2000)));
    }

    #[test]
    fn test_from_json() {
        let json = r#"[
            {"timestamp": "1990-01-01", "temperature_mean": -6.5, "temperature_amplitude": 17.0, "snow_thickness": 0.55}
        ]"#;
        let series = ForcingSeries::from_json_str(json).unwrap();
        assert_eq!(series.forcing_for_year(1990).unwrap().temperature_mean, -6.5);

        let bad = r#"[{"timestamp": "1990-01-01", "temperature_mean": -6.5}]"#;
        assert!(matches!(ForcingSeries::from_json_str(bad), Err(ForcingError::Json(_))));
    }
}
