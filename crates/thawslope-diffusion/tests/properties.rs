//! Behavioural properties of the diffusion step engine.
//!
//! These cover flat-field idempotence, mass conservation under the reflective
//! boundary, linear scaling with diffusivity, the deep-soil limit, parameter
//! validation, and the small end-to-end grids used as reference cases.

use approx::{assert_abs_diff_eq, assert_relative_eq};
use ndarray::Array2;
use thawslope_diffusion::{step, DiffusionError, DiffusionParams, Stepper};

/// A rough, deterministic test surface.
fn rough_surface(rows: usize, cols: usize) -> Array2<f64> {
    Array2::from_shape_fn((rows, cols), |(r, c)| {
        let (x, y) = (c as f64, r as f64);
        50.0 + 3.0 * (0.7 * x).sin() + 2.0 * (1.3 * y).cos() + 0.25 * ((r * 31 + c * 17) % 7) as f64
    })
}

#[test]
fn test_flat_field_stays_flat_after_one_step() {
    let elevation = Array2::from_elem((3, 3), 100.0);
    let soil = Array2::from_elem((3, 3), 1.0);
    let params = DiffusionParams::new(1e-2, 1.0, 1.0).unwrap();

    let next = step(elevation.view(), soil.view(), 30.0, &params).unwrap();
    for &z in next.iter() {
        assert_abs_diff_eq!(z, 100.0, epsilon = 1e-9);
    }
}

#[test]
fn test_flat_field_stays_flat_after_1000_steps() {
    let mut elevation = Array2::from_elem((3, 3), 100.0);
    let soil = Array2::from_elem((3, 3), 1.0);
    let params = DiffusionParams::new(1e-2, 1.0, 1.0).unwrap();
    let mut stepper = Stepper::new((3, 3));

    for _ in 0..1000 {
        stepper
            .step(elevation.view_mut(), soil.view(), 30.0, &params)
            .unwrap();
    }
    for &z in elevation.iter() {
        assert_abs_diff_eq!(z, 100.0, epsilon = 1e-9);
    }
}

#[test]
fn test_reflective_boundary_conserves_mass() {
    let elevation = rough_surface(12, 17);
    let soil = Array2::from_shape_fn((12, 17), |(r, c)| 0.3 + 0.05 * ((r + 2 * c) % 9) as f64);
    let params = DiffusionParams::new(0.2, 0.8, 1.0).unwrap();

    let mut current = elevation.clone();
    for _ in 0..50 {
        current = step(current.view(), soil.view(), 1.0, &params).unwrap();
    }

    let before: f64 = elevation.sum();
    let after: f64 = current.sum();
    assert_abs_diff_eq!(after, before, epsilon = 1e-8);
    assert!(current != elevation, "surface should have evolved");
}

#[test]
fn test_change_scales_linearly_with_diffusivity() {
    let elevation = Array2::from_shape_fn((4, 8), |(_, c)| 2.0 * c as f64);
    let soil = Array2::from_elem((4, 8), 0.7);
    let single = DiffusionParams::new(1e-2, 1.0, 1.0).unwrap();
    let double = DiffusionParams::new(2e-2, 1.0, 1.0).unwrap();

    let a = step(elevation.view(), soil.view(), 1.0, &single).unwrap() - &elevation;
    let b = step(elevation.view(), soil.view(), 1.0, &double).unwrap() - &elevation;

    let mut compared = 0;
    for (da, db) in a.iter().zip(b.iter()) {
        if da.abs() > 1e-15 {
            assert_relative_eq!(*db, 2.0 * da, max_relative = 1e-9);
            compared += 1;
        } else {
            assert_abs_diff_eq!(*db, 0.0, epsilon = 1e-15);
        }
    }
    assert!(compared > 0);
}

#[test]
fn test_deep_soil_approaches_undamped_rate() {
    let elevation = rough_surface(6, 6);
    let params = DiffusionParams::new(5e-2, 1.0, 1.0).unwrap();
    let undamped_soil = Array2::from_elem((6, 6), f64::INFINITY);
    let undamped = step(elevation.view(), undamped_soil.view(), 1.0, &params).unwrap() - &elevation;

    let mut previous_gap = f64::INFINITY;
    for depth in [0.5, 1.0, 2.0, 5.0, 20.0] {
        let soil = Array2::from_elem((6, 6), depth);
        let damped = step(elevation.view(), soil.view(), 1.0, &params).unwrap() - &elevation;
        let gap = (&undamped - &damped).iter().fold(0.0_f64, |m, d| m.max(d.abs()));
        assert!(gap < previous_gap, "gap should shrink as soil deepens");
        previous_gap = gap;
    }
    assert!(previous_gap < 1e-8);
}

#[test]
fn test_invalid_parameters_rejected() {
    for (d, h, dt) in [(0.0, 1.0, 1.0), (-1.0, 1.0, 1.0), (1e-2, 0.0, 1.0), (1e-2, 1.0, -1.0)] {
        assert!(matches!(
            DiffusionParams::new(d, h, dt),
            Err(DiffusionError::InvalidParameter(_))
        ));

        // Constructed directly, the step itself refuses them
        let params = DiffusionParams {
            diffusivity: d,
            decay_depth: h,
            dt,
        };
        let elevation = Array2::from_elem((2, 2), 1.0);
        assert!(matches!(
            step(elevation.view(), elevation.view(), 1.0, &params),
            Err(DiffusionError::InvalidParameter(_))
        ));
    }
}

#[test]
fn test_shape_mismatch_rejected() {
    let elevation = Array2::from_elem((3, 3), 1.0);
    let soil = Array2::from_elem((3, 4), 1.0);
    let params = DiffusionParams::new(1e-2, 1.0, 1.0).unwrap();

    let err = step(elevation.view(), soil.view(), 1.0, &params).unwrap_err();
    assert_eq!(
        err,
        DiffusionError::ShapeMismatch {
            field: "soil depth",
            expected: (3, 3),
            found: (3, 4),
        }
    );
}

#[test]
fn test_one_dimensional_ramp_smooths_downhill() {
    let elevation = Array2::from_shape_fn((1, 5), |(_, c)| c as f64);
    let soil = Array2::from_elem((1, 5), 1.0);
    let params = DiffusionParams::new(1e-2, 1.0, 1.0).unwrap();

    let next = step(elevation.view(), soil.view(), 1.0, &params).unwrap();
    let expected_shift = 1e-2 * (1.0 - (-1.0f64).exp());

    // The low end fills in, the high end wears down
    assert_abs_diff_eq!(next[(0, 0)], expected_shift, epsilon = 1e-12);
    assert_abs_diff_eq!(next[(0, 4)], 4.0 - expected_shift, epsilon = 1e-12);

    // Interior cells already sit at their neighbors' mean, so they hold
    for c in 1..4 {
        let neighbor_mean = 0.5 * (elevation[(0, c - 1)] + elevation[(0, c + 1)]);
        assert_abs_diff_eq!(elevation[(0, c)], neighbor_mean, epsilon = 1e-12);
        assert_abs_diff_eq!(next[(0, c)], c as f64, epsilon = 1e-12);
    }
}

#[test]
fn test_one_dimensional_kink_moves_toward_neighbor_mean() {
    // Peak at column 2, trough at column 4
    let elevation = Array2::from_shape_vec((1, 6), vec![0.0, 1.0, 3.0, 1.0, 0.0, 1.0]).unwrap();
    let soil = Array2::from_elem((1, 6), 2.0);
    let params = DiffusionParams::new(1e-2, 1.0, 1.0).unwrap();

    let next = step(elevation.view(), soil.view(), 1.0, &params).unwrap();

    assert!(next[(0, 2)] < elevation[(0, 2)], "peak decreases");
    assert!(next[(0, 4)] > elevation[(0, 4)], "trough increases");
    for c in 1..5 {
        let mean = 0.5 * (elevation[(0, c - 1)] + elevation[(0, c + 1)]);
        let before = (elevation[(0, c)] - mean).abs();
        let after = (next[(0, c)] - mean).abs();
        assert!(after <= before + 1e-12, "column {} moved away from its neighbor mean", c);
    }
}

#[test]
fn test_negative_or_nan_soil_is_rejected_without_writing() {
    let mut elevation = Array2::from_shape_fn((1, 5), |(_, c)| c as f64);
    let params = DiffusionParams::new(1e-2, 1.0, 1.0).unwrap();
    let mut stepper = Stepper::new((1, 5));

    for bad in [-5.0, f64::NAN, f64::INFINITY] {
        let mut soil = Array2::from_elem((1, 5), 1.0);
        soil[(0, 2)] = bad;
        assert!(matches!(
            step(elevation.view(), soil.view(), 1.0, &params),
            Err(DiffusionError::InvalidParameter(_))
        ));
        assert!(matches!(
            stepper.step(elevation.view_mut(), soil.view(), 1.0, &params),
            Err(DiffusionError::InvalidParameter(_))
        ));
    }
    assert_eq!(elevation.row(0).to_vec(), vec![0.0, 1.0, 2.0, 3.0, 4.0]);
}

#[test]
fn test_zero_soil_does_not_move_surface() {
    let elevation = Array2::from_shape_fn((1, 5), |(_, c)| c as f64);
    let soil = Array2::zeros((1, 5));
    let params = DiffusionParams::new(1e-2, 1.0, 1.0).unwrap();

    let next = step(elevation.view(), soil.view(), 1.0, &params).unwrap();
    assert_eq!(next, elevation);
}
