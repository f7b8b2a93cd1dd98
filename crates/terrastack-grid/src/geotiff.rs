//! GeoTIFF elevation source loading.

use crate::{ElevationGrid, GridError, GridTransform, Result};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::tags::Tag;

/// GeoTIFF tag holding the model tie point ([i, j, k, x, y, z]).
const TAG_MODEL_TIEPOINT: u16 = 33922;
/// GeoTIFF tag holding the pixel scale ([sx, sy, sz]).
const TAG_MODEL_PIXEL_SCALE: u16 = 33550;
/// GDAL's ASCII nodata tag.
const TAG_GDAL_NODATA: u16 = 42113;

/// Load a single-band elevation raster from a GeoTIFF file.
///
/// The grid's nodata sentinels are normalized to NaN. Pass
/// `explicit_floor = true` when the caller supplied an elevation floor, so
/// negative (below sea level) samples are kept instead of treated as water.
pub fn load_geotiff<P: AsRef<Path>>(path: P, explicit_floor: bool) -> Result<ElevationGrid> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;
    let mut decoder = Decoder::new(file)?;

    // Allow large rasters: a 1/3 arc-second tile is ~116M f32 samples.
    let mut limits = Limits::default();
    limits.decoding_buffer_size = 1024 * 1024 * 1024;
    limits.intermediate_buffer_size = 1024 * 1024 * 1024;
    limits.ifd_value_size = 1024 * 1024 * 1024;
    decoder = decoder.with_limits(limits);

    let (width, height) = decoder.dimensions()?;
    let transform = read_geotransform(&mut decoder)?;
    let data = decode_elevation_data(&mut decoder)?;
    let no_data_value = read_nodata_value(&mut decoder);

    tracing::debug!(
        path = %path.display(),
        width,
        height,
        nodata = ?no_data_value,
        "loaded GeoTIFF source"
    );

    let mut grid = ElevationGrid::new(data, width as usize, height as usize, transform)?;
    grid.normalize_no_data(no_data_value, explicit_floor);
    Ok(grid)
}

/// Read the geotransform from the ModelTiepoint / ModelPixelScale tags.
fn read_geotransform<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
) -> Result<GridTransform> {
    let tiepoint = decoder.get_tag_f64_vec(Tag::Unknown(TAG_MODEL_TIEPOINT));
    let pixel_scale = decoder.get_tag_f64_vec(Tag::Unknown(TAG_MODEL_PIXEL_SCALE));

    if let (Ok(tiepoint), Ok(scale)) = (tiepoint, pixel_scale) {
        if tiepoint.len() >= 6 && scale.len() >= 2 {
            // Tiepoint format: [i, j, k, x, y, z] anchoring pixel (i, j) at
            // world (x, y). For north-up rasters that is the top-left corner.
            return Ok(GridTransform {
                origin_x: tiepoint[3] - tiepoint[0] * scale[0],
                origin_y: tiepoint[4] + tiepoint[1] * scale[1],
                cell_size: scale[0],
            });
        }
    }

    Err(GridError::InvalidGeoTiff(
        "missing ModelTiepoint/ModelPixelScale tags".to_string(),
    ))
}

/// Decode elevation samples, widening any integer band to f32.
fn decode_elevation_data<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
) -> Result<Vec<f32>> {
    let result = decoder.read_image()?;

    match result {
        DecodingResult::F32(data) => Ok(data),
        DecodingResult::F64(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
        DecodingResult::I16(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
        DecodingResult::I32(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
        DecodingResult::U16(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
        DecodingResult::U32(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
        DecodingResult::U8(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
        DecodingResult::I8(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
        DecodingResult::U64(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
        DecodingResult::I64(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
    }
}

/// Try to read the no-data value from the GDAL_NODATA ASCII tag.
fn read_nodata_value<R: std::io::Read + std::io::Seek>(decoder: &mut Decoder<R>) -> Option<f32> {
    decoder
        .get_tag_ascii_string(Tag::Unknown(TAG_GDAL_NODATA))
        .ok()
        .and_then(|s| s.trim().parse().ok())
}
