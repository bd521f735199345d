//! Native GeoTIFF handling for the steps that don't shell out

pub mod crs;
pub mod dummy;
pub mod geotiff;
pub mod grid;
pub mod trim;

pub use crs::GeoKeys;
pub use geotiff::{read_geotiff, read_geotiff_as_array, write_geotiff};
pub use grid::{GeoTransform, PixelType, Raster};
pub use trim::trim_geotiff_edge;
