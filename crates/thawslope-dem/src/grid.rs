//! Fixed-resolution grid state.

use crate::{GridError, Result};
use ndarray::{Array2, ArrayView2, ArrayViewMut2};

/// North-west corner of the grid in raster CRS units.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Origin {
    /// Easting (or longitude) of the west edge.
    pub x: f64,
    /// Northing (or latitude) of the north edge.
    pub y: f64,
}

/// The state of a single cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellState {
    /// Surface elevation in meters.
    pub elevation: f64,
    /// Mobile soil depth in meters.
    pub soil_depth: f64,
    /// Soil production rate.
    pub production_rate: f64,
}

/// A rectangular grid of cells with elevation, soil depth and production rate.
///
/// Row 0 is the northern edge and column 0 the western edge. Shape and spacing
/// are fixed at construction: only elevation values can be mutated afterwards,
/// and only through views that cannot resize the underlying array.
#[derive(Debug, Clone)]
pub struct Grid {
    elevation: Array2<f64>,
    soil_depth: Array2<f64>,
    production_rate: Array2<f64>,
    /// Cell size in meters (square cells).
    spacing: f64,
    origin: Origin,
}

impl Grid {
    /// Create a grid from an elevation field with zero soil depth and production.
    pub fn new(elevation: Array2<f64>, spacing: f64) -> Result<Self> {
        if !(spacing.is_finite() && spacing > 0.0) {
            return Err(GridError::InvalidParameter(format!(
                "spacing must be positive, got {}",
                spacing
            )));
        }
        let (rows, cols) = elevation.dim();
        if rows == 0 || cols == 0 {
            return Err(GridError::InvalidParameter(format!(
                "grid must have at least one cell, got {} x {}",
                rows, cols
            )));
        }

        Ok(Self {
            soil_depth: Array2::zeros((rows, cols)),
            production_rate: Array2::zeros((rows, cols)),
            elevation,
            spacing,
            origin: Origin::default(),
        })
    }

    /// Create a grid where every cell has the same elevation.
    pub fn flat(rows: usize, cols: usize, spacing: f64, elevation: f64) -> Result<Self> {
        Self::new(Array2::from_elem((rows, cols), elevation), spacing)
    }

    /// Create a west-to-east ramp: elevation = column * spacing * slope.
    pub fn ramp(rows: usize, cols: usize, spacing: f64, slope: f64) -> Result<Self> {
        let elevation = Array2::from_shape_fn((rows, cols), |(_, col)| col as f64 * spacing * slope);
        Self::new(elevation, spacing)
    }

    /// Set the georeferenced origin.
    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    /// Replace the soil depth field. Every depth must be finite and non-negative.
    pub fn with_soil_depth(mut self, soil_depth: Array2<f64>) -> Result<Self> {
        self.check_shape(soil_depth.dim())?;
        if let Some(((row, col), depth)) = soil_depth
            .indexed_iter()
            .find(|(_, h)| !(h.is_finite() && **h >= 0.0))
        {
            return Err(GridError::InvalidParameter(format!(
                "soil depth at ({}, {}) must be non-negative, got {}",
                row, col, depth
            )));
        }
        self.soil_depth = soil_depth;
        Ok(self)
    }

    /// Hold soil depth and production rate at one value everywhere.
    ///
    /// Used with an active-layer thickness evaluated upstream.
    pub fn with_uniform_soil(mut self, depth: f64) -> Result<Self> {
        if !(depth.is_finite() && depth >= 0.0) {
            return Err(GridError::InvalidParameter(format!(
                "soil depth must be non-negative, got {}",
                depth
            )));
        }
        self.soil_depth.fill(depth);
        self.production_rate.fill(depth);
        Ok(self)
    }

    fn check_shape(&self, found: (usize, usize)) -> Result<()> {
        let expected = self.shape();
        if found != expected {
            return Err(GridError::ShapeMismatch { expected, found });
        }
        Ok(())
    }

    /// Shape as (rows, cols).
    pub fn shape(&self) -> (usize, usize) {
        self.elevation.dim()
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.elevation.nrows()
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.elevation.ncols()
    }

    /// Cell size in meters.
    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    /// North-west origin.
    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// Elevation field.
    pub fn elevation(&self) -> ArrayView2<'_, f64> {
        self.elevation.view()
    }

    /// Soil depth field.
    pub fn soil_depth(&self) -> ArrayView2<'_, f64> {
        self.soil_depth.view()
    }

    /// Soil production rate field.
    pub fn production_rate(&self) -> ArrayView2<'_, f64> {
        self.production_rate.view()
    }

    /// Split borrow: mutable elevation alongside read-only soil depth.
    pub fn elevation_and_soil_mut(&mut self) -> (ArrayViewMut2<'_, f64>, ArrayView2<'_, f64>) {
        (self.elevation.view_mut(), self.soil_depth.view())
    }

    /// State of one cell, or `None` when out of range.
    pub fn cell(&self, row: usize, col: usize) -> Option<CellState> {
        Some(CellState {
            elevation: *self.elevation.get((row, col))?,
            soil_depth: self.soil_depth[(row, col)],
            production_rate: self.production_rate[(row, col)],
        })
    }

    /// Sum of all elevations times cell area, in cubic meters.
    pub fn volume(&self) -> f64 {
        self.elevation.sum() * self.spacing * self.spacing
    }

    /// Minimum and maximum elevation.
    pub fn elevation_range(&self) -> (f64, f64) {
        self.elevation
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &z| (lo.min(z), hi.max(z)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_flat_grid() {
        let grid = Grid::flat(3, 4, 30.0, 100.0).unwrap();
        assert_eq!(grid.shape(), (3, 4));
        assert_eq!(grid.spacing(), 30.0);
        assert!(grid.elevation().iter().all(|&z| z == 100.0));
        assert!(grid.soil_depth().iter().all(|&h| h == 0.0));
    }

    #[test]
    fn test_ramp_grid() {
        let grid = Grid::ramp(1, 5, 1.0, 1.0).unwrap();
        let row: Vec<f64> = grid.elevation().row(0).to_vec();
        assert_eq!(row, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_rejects_bad_spacing_and_empty() {
        assert!(matches!(
            Grid::flat(2, 2, 0.0, 1.0),
            Err(GridError::InvalidParameter(_))
        ));
        assert!(matches!(
            Grid::flat(2, 2, f64::NAN, 1.0),
            Err(GridError::InvalidParameter(_))
        ));
        assert!(matches!(
            Grid::flat(0, 2, 1.0, 1.0),
            Err(GridError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_soil_shape_mismatch() {
        let grid = Grid::flat(3, 3, 1.0, 0.0).unwrap();
        let err = grid.with_soil_depth(Array2::zeros((2, 3))).unwrap_err();
        match err {
            GridError::ShapeMismatch { expected, found } => {
                assert_eq!(expected, (3, 3));
                assert_eq!(found, (2, 3));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_uniform_soil_sets_both_fields() {
        let grid = Grid::flat(2, 2, 1.0, 0.0)
            .unwrap()
            .with_uniform_soil(0.75)
            .unwrap();
        let cell = grid.cell(1, 1).unwrap();
        assert_eq!(cell.soil_depth, 0.75);
        assert_eq!(cell.production_rate, 0.75);
        assert!(grid.cell(2, 0).is_none());
        assert!(Grid::flat(2, 2, 1.0, 0.0).unwrap().with_uniform_soil(-1.0).is_err());
    }

    #[test]
    fn test_soil_field_rejects_negative_and_nan() {
        let grid = Grid::ramp(1, 5, 1.0, 1.0).unwrap();
        let mut soil = Array2::from_elem((1, 5), 0.5);
        soil[(0, 3)] = -5.0;
        let err = grid.clone().with_soil_depth(soil.clone()).unwrap_err();
        assert!(matches!(err, GridError::InvalidParameter(ref msg) if msg.contains("(0, 3)")));

        soil[(0, 3)] = f64::NAN;
        assert!(matches!(
            grid.clone().with_soil_depth(soil.clone()),
            Err(GridError::InvalidParameter(_))
        ));

        soil[(0, 3)] = 0.0;
        let grid = grid.with_soil_depth(soil).unwrap();
        assert_eq!(grid.cell(0, 3).unwrap().soil_depth, 0.0);
        assert_eq!(grid.cell(0, 4).unwrap().soil_depth, 0.5);
    }

    #[test]
    fn test_volume_and_range() {
        let grid = Grid::ramp(2, 3, 2.0, 0.5).unwrap();
        // Elevations per row: 0, 1, 2
        assert_abs_diff_eq!(grid.volume(), 6.0 * 4.0, epsilon = 1e-12);
        assert_eq!(grid.elevation_range(), (0.0, 2.0));
    }
}
