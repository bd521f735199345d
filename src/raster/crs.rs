//! Coordinate reference systems as GeoTIFF GeoKeys
//!
//! Keys read from a file are kept verbatim (directory, double and ASCII
//! params) so a raster written back out carries the same CRS, including
//! user-defined ones that have no EPSG code.

pub const GT_MODEL_TYPE_KEY: u16 = 1024;
pub const GT_RASTER_TYPE_KEY: u16 = 1025;
pub const GEOGRAPHIC_TYPE_KEY: u16 = 2048;
pub const PROJECTED_CS_TYPE_KEY: u16 = 3072;

/// GeoTIFF's "user-defined" marker; not an EPSG code.
pub const USER_DEFINED: u16 = 32767;

const MODEL_TYPE_PROJECTED: u16 = 1;
const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
const RASTER_PIXEL_IS_AREA: u16 = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct GeoKeys {
    /// GeoKeyDirectory: a 4-short header, then (key, location, count, value) entries.
    pub directory: Vec<u16>,
    pub double_params: Vec<f64>,
    pub ascii_params: String,
}

impl GeoKeys {
    /// Projected CRS with the given EPSG code, e.g. 27700.
    pub fn projected(epsg: u16) -> Self {
        Self::from_entries(&[
            [GT_MODEL_TYPE_KEY, 0, 1, MODEL_TYPE_PROJECTED],
            [GT_RASTER_TYPE_KEY, 0, 1, RASTER_PIXEL_IS_AREA],
            [PROJECTED_CS_TYPE_KEY, 0, 1, epsg],
        ])
    }

    /// Geographic (lat/lon) CRS with the given EPSG code, e.g. 4326.
    pub fn geographic(epsg: u16) -> Self {
        Self::from_entries(&[
            [GT_MODEL_TYPE_KEY, 0, 1, MODEL_TYPE_GEOGRAPHIC],
            [GT_RASTER_TYPE_KEY, 0, 1, RASTER_PIXEL_IS_AREA],
            [GEOGRAPHIC_TYPE_KEY, 0, 1, epsg],
        ])
    }

    fn from_entries(entries: &[[u16; 4]]) -> Self {
        let mut directory = vec![1, 1, 0, entries.len() as u16];
        directory.extend(entries.iter().flatten());
        Self {
            directory,
            double_params: Vec::new(),
            ascii_params: String::new(),
        }
    }

    /// Value of a key stored inline in the directory (location 0).
    pub fn short_value(&self, key: u16) -> Option<u16> {
        self.directory
            .get(4..)?
            .chunks_exact(4)
            .find(|entry| entry[0] == key && entry[1] == 0)
            .map(|entry| entry[3])
    }

    /// EPSG code of the CRS: the projected one if set, otherwise the geographic one.
    pub fn epsg(&self) -> Option<u16> {
        [PROJECTED_CS_TYPE_KEY, GEOGRAPHIC_TYPE_KEY]
            .into_iter()
            .filter_map(|key| self.short_value(key))
            .find(|&code| code != USER_DEFINED)
    }

    pub fn is_geographic(&self) -> bool {
        self.short_value(GT_MODEL_TYPE_KEY) == Some(MODEL_TYPE_GEOGRAPHIC)
    }
}
