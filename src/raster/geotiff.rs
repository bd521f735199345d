//! GeoTIFF reading and writing with the `tiff` crate
//!
//! Only what the derivation steps need: one band, a north-up transform from
//! ModelPixelScale + ModelTiepoint, the GeoKey directory and its params
//! (copied through as-is) and GDAL's nodata tag. Files are written uncompressed.

use crate::raster::crs::GeoKeys;
use crate::raster::{GeoTransform, PixelType, Raster};
use crate::utils::error::{DemError, Result};
use std::fs::File;
use std::io::{BufReader, Read, Seek, Write};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::encoder::colortype::{self, ColorType};
use tiff::encoder::{TiffEncoder, TiffValue};
use tiff::tags::Tag;

/// Read band 1 of a GeoTIFF.
pub fn read_geotiff<P: AsRef<Path>>(path: P) -> Result<Raster> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(DemError::missing_input(path));
    }
    let file = File::open(path)?;
    decode_geotiff(BufReader::new(file))
}

/// Grid values of a GeoTIFF as rows, top row first.
pub fn read_geotiff_as_array<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<f64>>> {
    Ok(read_geotiff(path)?.to_rows())
}

fn decode_geotiff<R: Read + Seek>(reader: R) -> Result<Raster> {
    // DEM tiles routinely exceed the decoder's default 256 MiB buffer cap.
    let mut decoder = Decoder::new(reader)?.with_limits(Limits::unlimited());
    let (width, height) = decoder.dimensions()?;
    let (rows, cols) = (height as usize, width as usize);

    let (data, pixel_type) = match decoder.read_image()? {
        DecodingResult::U8(buf) => (to_f64(buf), PixelType::UInt8),
        DecodingResult::U16(buf) => (to_f64(buf), PixelType::UInt16),
        DecodingResult::I8(buf) => (to_f64(buf), PixelType::Int16),
        DecodingResult::I16(buf) => (to_f64(buf), PixelType::Int16),
        DecodingResult::U32(buf) => (buf.into_iter().map(f64::from).collect(), PixelType::Float64),
        DecodingResult::I32(buf) => (to_f64(buf), PixelType::Int32),
        DecodingResult::F32(buf) => (to_f64(buf), PixelType::Float32),
        DecodingResult::F64(buf) => (buf, PixelType::Float64),
        DecodingResult::U64(buf) => (buf.into_iter().map(|v| v as f64).collect(), PixelType::Float64),
        DecodingResult::I64(buf) => (buf.into_iter().map(|v| v as f64).collect(), PixelType::Float64),
        #[allow(unreachable_patterns)]
        _ => return Err(DemError::raster("Unsupported TIFF sample format")),
    };

    if data.len() != rows * cols {
        return Err(DemError::raster(format!(
            "Expected a single band of {}x{} values, found {} samples",
            rows,
            cols,
            data.len()
        )));
    }

    let mut raster = Raster::from_vec(data, rows, cols, pixel_type)?;

    if let Some(transform) = read_geotransform(&mut decoder) {
        raster.set_transform(transform);
    }
    raster.set_geokeys(read_geokeys(&mut decoder));
    raster.set_nodata(read_nodata(&mut decoder));

    Ok(raster)
}

fn to_f64<T: Into<f64>>(buf: Vec<T>) -> Vec<f64> {
    buf.into_iter().map(Into::into).collect()
}

fn read_geotransform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<GeoTransform> {
    let scale = decoder.get_tag_f64_vec(Tag::ModelPixelScaleTag).ok()?;
    let tiepoint = decoder.get_tag_f64_vec(Tag::ModelTiepointTag).ok()?;

    if scale.len() < 2 || tiepoint.len() < 6 {
        return None;
    }

    // tiepoint: [I, J, K, X, Y, Z]
    let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
    let origin_y = tiepoint[4] + tiepoint[1] * scale[1];
    Some(GeoTransform::new(origin_x, origin_y, scale[0], -scale[1]))
}

fn read_geokeys<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<GeoKeys> {
    let directory = decoder.get_tag_u16_vec(Tag::GeoKeyDirectoryTag).ok()?;
    if directory.len() < 4 {
        return None;
    }

    Some(GeoKeys {
        directory,
        double_params: decoder.get_tag_f64_vec(Tag::GeoDoubleParamsTag).unwrap_or_default(),
        ascii_params: decoder.get_tag_ascii_string(Tag::GeoAsciiParamsTag).unwrap_or_default(),
    })
}

fn read_nodata<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<f64> {
    let text = decoder.get_tag_ascii_string(Tag::GdalNodata).ok()?;
    let text = text.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    match text.to_ascii_lowercase().as_str() {
        "nan" | "-nan" => Some(f64::NAN),
        other => other.parse().ok(),
    }
}

/// Write a raster as a single-band GeoTIFF in its own pixel type.
pub fn write_geotiff<P: AsRef<Path>>(raster: &Raster, path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    encode_geotiff(raster, file)
}

fn encode_geotiff<W: Write + Seek>(raster: &Raster, writer: W) -> Result<()> {
    let mut encoder = TiffEncoder::new(writer)?;

    match raster.pixel_type() {
        PixelType::UInt8 => write_image::<_, colortype::Gray8>(&mut encoder, raster, |v| v.round() as u8),
        PixelType::UInt16 => write_image::<_, colortype::Gray16>(&mut encoder, raster, |v| v.round() as u16),
        PixelType::Int16 => write_image::<_, colortype::GrayI16>(&mut encoder, raster, |v| v.round() as i16),
        PixelType::Int32 => write_image::<_, colortype::GrayI32>(&mut encoder, raster, |v| v.round() as i32),
        PixelType::Float32 => write_image::<_, colortype::Gray32Float>(&mut encoder, raster, |v| v as f32),
        PixelType::Float64 => write_image::<_, colortype::Gray64Float>(&mut encoder, raster, |v| v),
    }
}

fn write_image<W, C>(encoder: &mut TiffEncoder<W>, raster: &Raster, convert: impl Fn(f64) -> C::Inner) -> Result<()>
where
    W: Write + Seek,
    C: ColorType,
    [C::Inner]: TiffValue,
{
    let data: Vec<C::Inner> = raster.data().iter().map(|&v| convert(v)).collect();
    let mut image = encoder.new_image::<C>(raster.cols() as u32, raster.rows() as u32)?;

    let gt = raster.transform();
    let scale = [gt.pixel_width, gt.pixel_height.abs(), 0.0];
    image.encoder().write_tag(Tag::ModelPixelScaleTag, &scale[..])?;

    let tiepoint = [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
    image.encoder().write_tag(Tag::ModelTiepointTag, &tiepoint[..])?;

    if let Some(keys) = raster.geokeys() {
        image.encoder().write_tag(Tag::GeoKeyDirectoryTag, keys.directory.as_slice())?;
        if !keys.double_params.is_empty() {
            image.encoder().write_tag(Tag::GeoDoubleParamsTag, keys.double_params.as_slice())?;
        }
        if !keys.ascii_params.is_empty() {
            image.encoder().write_tag(Tag::GeoAsciiParamsTag, keys.ascii_params.as_str())?;
        }
    }

    if let Some(nodata) = raster.nodata() {
        let text = if nodata.is_nan() { "nan".to_string() } else { nodata.to_string() };
        image.encoder().write_tag(Tag::GdalNodata, text.as_str())?;
    }

    image.write_data(&data)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn georeferenced(pixel_type: PixelType) -> Raster {
        let mut raster = Raster::from_rows(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]], pixel_type).unwrap();
        raster.set_transform(GeoTransform::new(530_000.0, 180_000.0, 10.0, -10.0));
        raster.set_epsg(Some(27700));
        raster
    }

    #[test]
    fn test_int32_geotiff_keeps_values_and_georeferencing() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("grid.tif");
        let raster = georeferenced(PixelType::Int32);

        write_geotiff(&raster, &path).unwrap();
        let read = read_geotiff(&path).unwrap();

        assert_eq!(read.shape(), (2, 3));
        assert_eq!(read.to_rows(), vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
        assert_eq!(read.pixel_type(), PixelType::Int32);
        assert_eq!(read.transform(), raster.transform());
        assert_eq!(read.epsg(), Some(27700));
        assert_eq!(read.nodata(), None);
    }

    #[test]
    fn test_float32_geotiff_keeps_nodata() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("aspect.tif");
        let mut raster = georeferenced(PixelType::Float32);
        raster.set_nodata(Some(-9999.0));

        write_geotiff(&raster, &path).unwrap();
        let read = read_geotiff(&path).unwrap();

        assert_eq!(read.pixel_type(), PixelType::Float32);
        assert_eq!(read.nodata(), Some(-9999.0));
    }

    #[test]
    fn test_read_missing_file() {
        let err = read_geotiff("/nonexistent/dem.tif").unwrap_err();
        assert!(matches!(err, DemError::MissingInput { .. }));
    }

    #[test]
    fn test_read_non_tiff_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("not-a.tif");
        std::fs::write(&path, b"ncols 5\nnrows 5\n").unwrap();

        assert!(read_geotiff(&path).is_err());
    }

    #[test]
    fn test_geographic_crs_stays_geographic() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("wgs84.tif");
        let mut raster = Raster::from_rows(&[[90.0, 270.0], [10.0, 200.0]], PixelType::Float32).unwrap();
        raster.set_transform(GeoTransform::new(-0.13, 51.51, 0.0001, -0.0001));
        raster.set_geokeys(Some(GeoKeys::geographic(4326)));

        write_geotiff(&raster, &path).unwrap();
        let read = read_geotiff(&path).unwrap();

        let keys = read.geokeys().unwrap();
        assert!(keys.is_geographic());
        assert_eq!(keys.short_value(crate::raster::crs::PROJECTED_CS_TYPE_KEY), None);
        assert_eq!(read.epsg(), Some(4326));
    }

    #[test]
    fn test_user_defined_crs_params_are_carried_through() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("custom.tif");
        let keys = GeoKeys {
            // model projected, raster area, citation in ascii params, user-defined projection
            directory: vec![
                1, 1, 0, 4, //
                1024, 0, 1, 1, //
                1025, 0, 1, 1, //
                1026, 34737, 11, 0, //
                3072, 0, 1, 32767,
            ],
            double_params: vec![6_378_137.0, 298.257_223_563],
            ascii_params: "Local grid|".to_string(),
        };
        let mut raster = georeferenced(PixelType::Float32);
        raster.set_geokeys(Some(keys.clone()));

        write_geotiff(&raster, &path).unwrap();
        let read = read_geotiff(&path).unwrap();

        assert_eq!(read.geokeys(), Some(&keys));
        assert_eq!(read.epsg(), None);
    }

    #[test]
    fn test_no_crs_writes_no_geokeys() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("plain.tif");
        let raster = Raster::from_rows(&[[1.0, 2.0]], PixelType::UInt8).unwrap();

        write_geotiff(&raster, &path).unwrap();
        let read = read_geotiff(&path).unwrap();

        assert!(read.geokeys().is_none());
        assert_eq!(read.transform(), &GeoTransform::default());
    }

    #[test]
    fn test_large_tile_reads_past_default_decoder_limit() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("large.tif");
        // 5800 x 5800 f64 is just over tiff's default 256 MiB decoding buffer
        let (rows, cols) = (5800, 5800);
        let raster = Raster::from_vec(vec![1.5; rows * cols], rows, cols, PixelType::Float64).unwrap();

        write_geotiff(&raster, &path).unwrap();
        drop(raster);
        let read = read_geotiff(&path).unwrap();

        assert_eq!(read.shape(), (rows, cols));
        assert_eq!(read.get(rows - 1, cols - 1), Some(1.5));
    }
}
