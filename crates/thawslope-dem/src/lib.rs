//! # thawslope-dem
//!
//! Grid state and raster I/O for hillslope simulations.
//!
//! This crate provides:
//! - [`Grid`] - a fixed-shape, fixed-spacing mesh carrying elevation, soil depth
//!   and soil production rate per cell
//! - [`Raster`] - a georeferenced 2-D field decoded from a GeoTIFF file
//! - [`write_geotiff`] - export of a float field as a georeferenced GeoTIFF
//!
//! ## Overview
//!
//! Elevation rasters are read with their ModelTiepoint (tag 33922) and
//! ModelPixelScale (tag 33550) tags, which give the north-west origin and the
//! cell size. A raster becomes a [`Grid`] once the cell size is known to be
//! square (or is overridden) and every cell holds valid data.
//!
//! ## Example
//!
//! ```no_run
//! use thawslope_dem::{Raster, Window};
//!
//! let raster = Raster::from_file("dem_data/study_area.tif")?;
//! let clipped = raster.window(Window { row: 0, col: 0, rows: 200, cols: 200 })?;
//! let grid = clipped.into_grid(None)?.with_uniform_soil(0.6)?;
//! println!("{} x {} cells at {} m", grid.rows(), grid.cols(), grid.spacing());
//! # Ok::<(), thawslope_dem::GridError>(())
//! ```

mod error;
mod grid;
mod raster;
mod writer;

pub use error::GridError;
pub use grid::{CellState, Grid, Origin};
pub use raster::{Raster, Window};
pub use writer::write_geotiff;

/// Result type for grid and raster operations.
pub type Result<T> = std::result::Result<T, GridError>;
