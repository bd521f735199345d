//! Small GeoTIFF fixtures built from in-memory grids
//!
//! Used by the test suite and by the `make_dummy_dem` binary to give
//! TauDEM/gdaldem something tiny to chew on.

use crate::raster::geotiff::write_geotiff;
use crate::raster::{GeoTransform, PixelType, Raster};
use crate::utils::error::Result;
use std::path::Path;

pub const DUMMY_PIXEL_SIZE: f64 = 10.0;

/// EPSG code of the British National Grid.
pub const BRITISH_NATIONAL_GRID: u16 = 27700;

/// Charing Cross (51.5081364 N, 0.1269505 W) in British National Grid metres.
pub const CHARING_CROSS_BNG: (f64, f64) = (530_047.0, 180_423.0);

/// The 5x5 test DEM. The 1 in the second row is a pit.
pub const HYDRO_INCORRECT_DEM: [[i32; 5]; 5] = [
    [2, 2, 2, 3, 2],
    [2, 1, 2, 3, 4],
    [2, 2, 2, 3, 2],
    [3, 3, 4, 4, 3],
    [2, 2, 3, 3, 2],
];

/// The same DEM once pit removal has run.
pub const HYDRO_CORRECT_DEM: [[i32; 5]; 5] = [
    [2, 2, 2, 3, 2],
    [2, 2, 2, 3, 4],
    [2, 2, 2, 3, 2],
    [3, 3, 4, 4, 3],
    [2, 2, 3, 3, 2],
];

/// Write `rows` as an Int32 GeoTIFF with 10 m cells in British National
/// Grid, its top-left corner on Charing Cross.
pub fn create_dummy_geotiff_from_array<P, R>(path: P, rows: &[R]) -> Result<()>
where
    P: AsRef<Path>,
    R: AsRef<[i32]>,
{
    let rows: Vec<Vec<f64>> = rows
        .iter()
        .map(|row| row.as_ref().iter().map(|&v| f64::from(v)).collect())
        .collect();

    let mut raster = Raster::from_rows(&rows, PixelType::Int32)?;
    let (x, y) = CHARING_CROSS_BNG;
    raster.set_transform(GeoTransform::new(x, y, DUMMY_PIXEL_SIZE, -DUMMY_PIXEL_SIZE));
    raster.set_epsg(Some(BRITISH_NATIONAL_GRID));

    write_geotiff(&raster, path)
}

pub fn make_dummy_hydro_incorrect_dem<P: AsRef<Path>>(path: P) -> Result<()> {
    create_dummy_geotiff_from_array(path, &HYDRO_INCORRECT_DEM)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::geotiff::read_geotiff;
    use tempfile::TempDir;

    #[test]
    fn test_dummy_dem_is_georeferenced_int32() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("dummy.tif");

        make_dummy_hydro_incorrect_dem(&path).unwrap();
        let raster = read_geotiff(&path).unwrap();

        assert_eq!(raster.shape(), (5, 5));
        assert_eq!(raster.get(1, 1), Some(1.0));
        assert_eq!(raster.pixel_type(), PixelType::Int32);
        assert_eq!(raster.epsg(), Some(BRITISH_NATIONAL_GRID));
        assert_eq!(raster.transform().origin_x, CHARING_CROSS_BNG.0);
        assert_eq!(raster.transform().pixel_height, -DUMMY_PIXEL_SIZE);
    }

    #[test]
    fn test_pit_is_the_only_difference() {
        let diffs: usize = HYDRO_INCORRECT_DEM
            .iter()
            .flatten()
            .zip(HYDRO_CORRECT_DEM.iter().flatten())
            .filter(|(a, b)| a != b)
            .count();
        assert_eq!(diffs, 1);
    }
}
