//! Georeferenced raster decoded from a GeoTIFF file.

use crate::grid::{Grid, Origin};
use crate::{GridError, Result};
use ndarray::{s, Array2};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::tags::Tag;
use tracing::debug;

/// Relative tolerance when deciding whether pixels are square.
const SQUARE_PIXEL_TOLERANCE: f64 = 1e-6;

/// A rectangular sub-region of a raster, in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Window {
    /// First row (north edge).
    pub row: usize,
    /// First column (west edge).
    pub col: usize,
    /// Number of rows.
    pub rows: usize,
    /// Number of columns.
    pub cols: usize,
}

/// A single-band raster with its georeferencing.
#[derive(Debug, Clone)]
pub struct Raster {
    /// Values in row-major order (north to south, west to east).
    data: Array2<f64>,
    /// North-west corner.
    origin: Origin,
    /// Pixel size (x, y) in CRS units.
    pixel_scale: (f64, f64),
    /// No-data value (cells equal to this are treated as missing).
    no_data_value: Option<f64>,
}

impl Raster {
    /// Build a raster from an in-memory array.
    pub fn from_array(data: Array2<f64>, origin: Origin, pixel_scale: (f64, f64)) -> Self {
        Self {
            data,
            origin,
            pixel_scale,
            no_data_value: None,
        }
    }

    /// Set the no-data marker.
    pub fn with_no_data(mut self, no_data_value: f64) -> Self {
        self.no_data_value = Some(no_data_value);
        self
    }

    /// Load a raster from a GeoTIFF file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let mut decoder = Decoder::new(file)?;

        // Allow study-area DEMs larger than the decoder defaults
        let mut limits = Limits::default();
        limits.decoding_buffer_size = 1024 * 1024 * 1024; // 1 GB
        limits.intermediate_buffer_size = 1024 * 1024 * 1024; // 1 GB
        limits.ifd_value_size = 1024 * 1024 * 1024;
        decoder = decoder.with_limits(limits);

        let (width, height) = decoder.dimensions()?;
        let (origin, pixel_scale) = Self::read_georeference(&mut decoder)?;
        let values = Self::decode_samples(&mut decoder)?;
        let no_data_value = Self::read_nodata_value(&mut decoder);

        let data = Array2::from_shape_vec((height as usize, width as usize), values).map_err(|e| {
            GridError::InvalidGeoTiff(format!("{}: sample count does not match dimensions: {}", path.display(), e))
        })?;

        debug!(
            path = %path.display(),
            rows = height,
            cols = width,
            scale_x = pixel_scale.0,
            scale_y = pixel_scale.1,
            "loaded raster"
        );

        Ok(Self {
            data,
            origin,
            pixel_scale,
            no_data_value,
        })
    }

    /// Read the origin and pixel size from GeoTIFF tags.
    fn read_georeference<R: std::io::Read + std::io::Seek>(
        decoder: &mut Decoder<R>,
    ) -> Result<(Origin, (f64, f64))> {
        let tiepoint = decoder
            .get_tag_f64_vec(Tag::ModelTiepointTag)
            .map_err(|_| GridError::InvalidGeoTiff("missing ModelTiepoint tag".to_string()))?;
        let scale = decoder
            .get_tag_f64_vec(Tag::ModelPixelScaleTag)
            .map_err(|_| GridError::InvalidGeoTiff("missing ModelPixelScale tag".to_string()))?;

        if tiepoint.len() < 6 || scale.len() < 2 {
            return Err(GridError::InvalidGeoTiff(format!(
                "expected 6 tiepoint and 2 scale values, got {} and {}",
                tiepoint.len(),
                scale.len()
            )));
        }

        // Tiepoint format: [i, j, k, x, y, z]; shift to the pixel (0, 0) corner
        let (i, j) = (tiepoint[0], tiepoint[1]);
        let origin = Origin {
            x: tiepoint[3] - i * scale[0],
            y: tiepoint[4] + j * scale[1],
        };

        Ok((origin, (scale[0], scale[1])))
    }

    /// Decode samples of any supported type as f64.
    fn decode_samples<R: std::io::Read + std::io::Seek>(decoder: &mut Decoder<R>) -> Result<Vec<f64>> {
        let result = decoder.read_image()?;

        Ok(match result {
            DecodingResult::F32(data) => data.into_iter().map(f64::from).collect(),
            DecodingResult::F64(data) => data,
            DecodingResult::I16(data) => data.into_iter().map(f64::from).collect(),
            DecodingResult::I32(data) => data.into_iter().map(f64::from).collect(),
            DecodingResult::U16(data) => data.into_iter().map(f64::from).collect(),
            DecodingResult::U32(data) => data.into_iter().map(f64::from).collect(),
            DecodingResult::U8(data) => data.into_iter().map(f64::from).collect(),
            DecodingResult::I8(data) => data.into_iter().map(f64::from).collect(),
            DecodingResult::U64(data) => data.into_iter().map(|v| v as f64).collect(),
            DecodingResult::I64(data) => data.into_iter().map(|v| v as f64).collect(),
        })
    }

    /// Try to read the no-data value from the GDAL_NODATA tag.
    fn read_nodata_value<R: std::io::Read + std::io::Seek>(decoder: &mut Decoder<R>) -> Option<f64> {
        decoder
            .get_tag_ascii_string(Tag::GdalNodata)
            .ok()
            .and_then(|s| s.trim_end_matches('\0').trim().parse().ok())
    }

    /// Dimensions as (rows, cols).
    pub fn dimensions(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// North-west corner.
    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// Pixel size (x, y) in CRS units.
    pub fn pixel_scale(&self) -> (f64, f64) {
        self.pixel_scale
    }

    /// Raw values.
    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    /// No-data marker, if any.
    pub fn no_data_value(&self) -> Option<f64> {
        self.no_data_value
    }

    /// Cut out a sub-region; the origin moves with the window.
    pub fn window(&self, window: Window) -> Result<Raster> {
        let (rows, cols) = self.dimensions();
        let row_end = window.row.saturating_add(window.rows);
        let col_end = window.col.saturating_add(window.cols);
        if window.rows == 0 || window.cols == 0 || row_end > rows || col_end > cols {
            return Err(GridError::InvalidWindow {
                row: window.row,
                row_end,
                col: window.col,
                col_end,
                rows,
                cols,
            });
        }

        let data = self
            .data
            .slice(s![window.row..row_end, window.col..col_end])
            .to_owned();
        let origin = Origin {
            x: self.origin.x + window.col as f64 * self.pixel_scale.0,
            y: self.origin.y - window.row as f64 * self.pixel_scale.1,
        };

        Ok(Raster {
            data,
            origin,
            pixel_scale: self.pixel_scale,
            no_data_value: self.no_data_value,
        })
    }

    /// Convert to a [`Grid`].
    ///
    /// `spacing` overrides the pixel scale (for example when the raster is in a
    /// geographic CRS). Without it the pixels must be square. Any no-data or
    /// non-finite cell is an error.
    pub fn into_grid(self, spacing: Option<f64>) -> Result<Grid> {
        let spacing = match spacing {
            Some(spacing) => spacing,
            None => {
                let (x, y) = self.pixel_scale;
                let tolerance = SQUARE_PIXEL_TOLERANCE * x.abs().max(y.abs());
                if (x.abs() - y.abs()).abs() > tolerance {
                    return Err(GridError::NonSquarePixels { x, y });
                }
                x.abs()
            }
        };

        for ((row, col), &value) in self.data.indexed_iter() {
            let is_nodata = self
                .no_data_value
                .map(|nodata| (value - nodata).abs() < 0.001)
                .unwrap_or(false);
            if is_nodata || !value.is_finite() {
                return Err(GridError::NoData { row, col });
            }
        }

        Ok(Grid::new(self.data, spacing)?.with_origin(self.origin))
    }
}
