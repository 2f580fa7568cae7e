//! Burn-in rasterization of tagged polygons into a single-channel grid.

use gdal::raster::{rasterize, Buffer};
use gdal::vector::Geometry;
use gdal::{DriverManager, GeoTransform};
use ndarray::Array2;

use crate::errors::{LabelError, Result};

/// Value assigned to pixels covered by no polygon.
pub const BACKGROUND: u8 = 0;

/// Burns `geometries` into a `(height, width)` grid aligned to
/// `geo_transform`, assigning each geometry's burn value to the pixels
/// whose centers it covers.
///
/// Where polygons overlap, the geometry appearing later in the slice wins
/// (the burn uses REPLACE merge semantics, so the slice order is the
/// documented tie-break order). Pixels covered by nothing keep
/// `background`. Zero geometries short-circuits to an all-background grid;
/// a degenerate zero-area polygon covers no pixel centers and contributes
/// nothing.
pub fn burn_band(
    geometries: &[Geometry],
    burn_values: &[f64],
    width: usize,
    height: usize,
    geo_transform: &GeoTransform,
    background: u8,
) -> Result<Array2<u8>> {
    assert_eq!(geometries.len(), burn_values.len());

    let driver = DriverManager::get_driver_by_name("MEM")?;
    let mut dataset =
        driver.create_with_band_type::<u8, _>("", width as isize, height as isize, 1)?;
    dataset.set_geo_transform(geo_transform)?;
    if background != 0 {
        let fill = Buffer::new((width, height), vec![background; width * height]);
        dataset.rasterband(1)?.write((0, 0), (width, height), &fill)?;
    }
    if !geometries.is_empty() {
        rasterize(&mut dataset, &[1], geometries, burn_values, None)?;
    }

    let grid = dataset.rasterband(1)?.read_band_as::<u8>()?;
    Array2::from_shape_vec((height, width), grid.data).map_err(|_| LabelError::DimensionMismatch {
        expected: (width, height),
        actual: grid.size,
    })
}
