//! Single-band raster grid

use crate::raster::crs::GeoKeys;
use crate::utils::error::{DemError, Result};

/// Sample type a raster is stored with on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelType {
    UInt8,
    UInt16,
    Int16,
    Int32,
    Float32,
    Float64,
}

/// North-up affine transform. `pixel_height` is negative for north-up data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub origin_y: f64,
    pub pixel_width: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
        }
    }

    /// Transform of the window whose top-left cell is (`row`, `col`).
    pub fn offset(&self, row: usize, col: usize) -> Self {
        Self {
            origin_x: self.origin_x + col as f64 * self.pixel_width,
            origin_y: self.origin_y + row as f64 * self.pixel_height,
            ..*self
        }
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, -1.0)
    }
}

/// A georeferenced grid, values in row-major order.
///
/// Values are held as `f64` whatever the on-disk type; `pixel_type` decides
/// how they are written back.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
    transform: GeoTransform,
    geokeys: Option<GeoKeys>,
    nodata: Option<f64>,
    pixel_type: PixelType,
}

impl Raster {
    pub fn from_vec(data: Vec<f64>, rows: usize, cols: usize, pixel_type: PixelType) -> Result<Self> {
        if rows == 0 || cols == 0 || data.len() != rows * cols {
            return Err(DemError::raster(format!(
                "Invalid raster dimensions: {} values for {}x{} grid",
                data.len(),
                rows,
                cols
            )));
        }

        Ok(Self {
            rows,
            cols,
            data,
            transform: GeoTransform::default(),
            geokeys: None,
            nodata: None,
            pixel_type,
        })
    }

    /// Build from row slices; every row must have the same length.
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R], pixel_type: PixelType) -> Result<Self> {
        let cols = rows.first().map(|r| r.as_ref().len()).unwrap_or(0);
        let mut data = Vec::with_capacity(rows.len() * cols);
        for (idx, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != cols {
                return Err(DemError::raster(format!(
                    "Row {} has {} values, expected {}",
                    idx,
                    row.len(),
                    cols
                )));
            }
            data.extend_from_slice(row);
        }
        Self::from_vec(data, rows.len(), cols, pixel_type)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.rows && col < self.cols {
            Some(self.data[row * self.cols + col])
        } else {
            None
        }
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.data.chunks(self.cols).map(<[f64]>::to_vec).collect()
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn set_transform(&mut self, transform: GeoTransform) {
        self.transform = transform;
    }

    pub fn epsg(&self) -> Option<u16> {
        self.geokeys.as_ref().and_then(GeoKeys::epsg)
    }

    /// Set a projected CRS by EPSG code. Use `set_geokeys` for anything else.
    pub fn set_epsg(&mut self, epsg: Option<u16>) {
        self.geokeys = epsg.map(GeoKeys::projected);
    }

    pub fn geokeys(&self) -> Option<&GeoKeys> {
        self.geokeys.as_ref()
    }

    pub fn set_geokeys(&mut self, geokeys: Option<GeoKeys>) {
        self.geokeys = geokeys;
    }

    pub fn nodata(&self) -> Option<f64> {
        self.nodata
    }

    pub fn set_nodata(&mut self, nodata: Option<f64>) {
        self.nodata = nodata;
    }

    pub fn pixel_type(&self) -> PixelType {
        self.pixel_type
    }

    pub fn is_nodata(&self, value: f64) -> bool {
        match self.nodata {
            Some(nd) if nd.is_nan() => value.is_nan(),
            Some(nd) => value == nd,
            None => false,
        }
    }

    /// New raster with the same georeferencing and nodata, values mapped by `f`.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Raster {
        Raster {
            data: self.data.iter().map(|&v| f(v)).collect(),
            ..self.clone()
        }
    }

    /// Sub-grid of `height` x `width` cells starting at (`row`, `col`).
    pub fn window(&self, row: usize, col: usize, height: usize, width: usize) -> Result<Raster> {
        if height == 0 || width == 0 || row + height > self.rows || col + width > self.cols {
            return Err(DemError::raster(format!(
                "Window {}x{} at ({}, {}) does not fit in {}x{} raster",
                height, width, row, col, self.rows, self.cols
            )));
        }

        let mut data = Vec::with_capacity(height * width);
        for r in row..row + height {
            let start = r * self.cols + col;
            data.extend_from_slice(&self.data[start..start + width]);
        }

        Ok(Raster {
            rows: height,
            cols: width,
            data,
            transform: self.transform.offset(row, col),
            ..self.clone()
        })
    }
}
