//! Trim the outermost cells from a GeoTIFF

use crate::raster::geotiff::{read_geotiff, write_geotiff};
use crate::utils::error::{DemError, Result};
use crate::utils::paths::temp_sibling;
use std::fs;
use std::path::Path;

/// Write `tgt` as `src` with `n` cells removed from each edge.
///
/// `tgt` may be the same path as `src`; the new file is written next to the
/// target and renamed over it.
pub fn trim_geotiff_edge<P: AsRef<Path>, Q: AsRef<Path>>(src: P, tgt: Q, n: usize) -> Result<()> {
    let (src, tgt) = (src.as_ref(), tgt.as_ref());
    let raster = read_geotiff(src)?;
    let (rows, cols) = raster.shape();

    // at least one cell must survive in each direction
    if n >= rows.div_ceil(2) || n >= cols.div_ceil(2) {
        return Err(DemError::InvalidConfigValueError {
            field: "trim".to_string(),
            value: n.to_string(),
            reason: format!("Cannot trim {} cells from each edge of a {}x{} raster", n, rows, cols),
        });
    }

    let trimmed = raster.window(n, n, rows - n * 2, cols - n * 2)?;

    let tmp = temp_sibling(tgt, "trim");
    if let Err(e) = write_geotiff(&trimmed, &tmp) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    fs::rename(&tmp, tgt)?;

    tracing::debug!(
        "Trimmed {} cell(s) from {} ({}x{} -> {}x{}) into {}",
        n,
        src.display(),
        rows,
        cols,
        trimmed.rows(),
        trimmed.cols(),
        tgt.display()
    );
    Ok(())
}
