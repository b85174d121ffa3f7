//! Integration tests for forcing files and the active-layer solver.

use std::fs;

use thawslope_forcing::{
    ActiveLayerSolver, ForcingError, ForcingLookup, ForcingSeries, MonthlyForcing, StefanSolver,
};

/// Twelve months of a cold continental climate, as a JSON array.
fn monthly_json(year: i32) -> String {
    let temps = [-24.0, -21.0, -14.0, -4.0, 4.0, 11.0, 14.0, 11.0, 4.0, -5.0, -16.0, -22.0];
    let swe = [0.09, 0.11, 0.13, 0.10, 0.01, 0.0, 0.0, 0.0, 0.0, 0.02, 0.05, 0.07];
    let entries: Vec<String> = (0..12)
        .map(|m| {
            format!(
                r#"{{"timestamp": "{}-{:02}-01", "temperature": {}, "snow_water_equivalent": {}}}"#,
                year,
                m + 1,
                temps[m],
                swe[m]
            )
        })
        .collect();
    format!("[{}]", entries.join(","))
}

#[test]
fn test_monthly_file_to_active_layer() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("monthly.json");
    fs::write(&path, monthly_json(2012)).unwrap();

    let series = MonthlyForcing::from_json_file(&path)
        .unwrap()
        .aggregate_annual(0.3)
        .unwrap();
    assert_eq!(series.len(), 1);

    let forcing = series.forcing_for_year(2012).unwrap();
    assert!(forcing.temperature_mean < 0.0);
    assert!(forcing.snow_thickness > 0.4);

    let alt = StefanSolver::default().active_layer_thickness(&forcing).unwrap();
    assert!(alt > 0.2 && alt < 2.5, "alt = {}", alt);
}

#[test]
fn test_annual_file_lookup() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("annual.json");
    fs::write(
        &path,
        r#"[
            {"timestamp": "2000-01-01", "temperature_mean": -5.0, "temperature_amplitude": 15.0, "snow_thickness": 0.3},
            {"timestamp": "2001-01-01", "temperature_mean": -4.5, "temperature_amplitude": 14.0, "snow_thickness": 0.5}
        ]"#,
    )
    .unwrap();

    let series = ForcingSeries::from_json_file(&path).unwrap();
    assert_eq!(series.forcing_for_year(2001).unwrap().snow_thickness, 0.5);
    assert!(matches!(
        series.forcing_for_year(2002),
        Err(ForcingError::MissingInput { year: 2002 })
    ));
}

#[test]
fn test_missing_file_is_io_error() {
    assert!(matches!(
        ForcingSeries::from_json_file("no/such/forcing.json"),
        Err(ForcingError::Io(_))
    ));
}
