//! Masks an image raster with the validity mask of its label raster, so
//! pixels that carry no label (nodata in every label band) read zero in the
//! masked copy.

use std::path::{Path, PathBuf};

use gdal::raster::Buffer;
use gdal::{Dataset, DriverManager};

use crate::errors::{LabelError, Result};
use crate::utils::derive_output_name;

/// Filename suffix of masked image rasters: `<tile>_raster.tif`.
pub const MASKED_SUFFIX: &str = "_raster.tif";

/// Multiplies the first three bands of `image_path` by the per-band
/// validity mask of `label_path` and writes the result as a new u16 GTiff
/// next to the image. Neither input is modified. Returns the written path.
///
/// GDAL exposes validity as 0/255; dividing by 255 turns it into the 0/1
/// factor the multiply needs.
pub fn mask_raster(image_path: &Path, label_path: &Path) -> Result<PathBuf> {
    let label = Dataset::open(label_path)?;
    let image = Dataset::open(image_path)?;
    let (width, height) = image.raster_size();
    if label.raster_size() != (width, height) {
        return Err(LabelError::DimensionMismatch {
            expected: (width, height),
            actual: label.raster_size(),
        });
    }

    let out_path = derive_output_name(image_path, MASKED_SUFFIX);
    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let mut out =
        driver.create_with_band_type::<u16, _>(&out_path, width as isize, height as isize, 3)?;
    out.set_geo_transform(&image.geo_transform()?)?;
    out.set_spatial_ref(&image.spatial_ref()?)?;

    for index in 1..=3isize {
        let label_band = label.rasterband(index)?;
        let mask_band = label_band.open_mask_band()?;
        let mask = mask_band.read_band_as::<u8>()?;
        let values = image.rasterband(index)?.read_band_as::<u16>()?;

        let masked: Vec<u16> = values
            .data
            .iter()
            .zip(mask.data.iter())
            .map(|(value, flag)| value * u16::from(flag / 255))
            .collect();
        let mut out_band = out.rasterband(index)?;
        out_band.write((0, 0), (width, height), &Buffer::new((width, height), masked))?;
    }
    log::info!("wrote masked raster '{}'", out_path.display());
    Ok(out_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_tiff<T: gdal::raster::GdalType + Copy>(
        path: &Path,
        width: usize,
        height: usize,
        bands: isize,
        fill: T,
        nodata: Option<f64>,
    ) {
        let driver = DriverManager::get_driver_by_name("GTiff").unwrap();
        let mut dataset = driver
            .create_with_band_type::<T, _>(path, width as isize, height as isize, bands)
            .unwrap();
        dataset
            .set_geo_transform(&[0.0, 1.0, 0.0, 0.0, 0.0, 1.0])
            .unwrap();
        dataset
            .set_spatial_ref(&gdal::spatial_ref::SpatialRef::from_epsg(4326).unwrap())
            .unwrap();
        for index in 1..=bands {
            let mut band = dataset.rasterband(index).unwrap();
            let buffer = Buffer::new((width, height), vec![fill; width * height]);
            band.write((0, 0), (width, height), &buffer).unwrap();
            if let Some(value) = nodata {
                band.set_no_data_value(Some(value)).unwrap();
            }
        }
    }

    #[test]
    fn test_mask_zeroes_unlabeled_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let image_path = dir.path().join("t9_B08.tif");
        let label_path = dir.path().join("t9_labels.tif");
        write_tiff::<u16>(&image_path, 100, 100, 3, 50, None);

        // Label with a 10x10 nodata hole in the top-left corner.
        let driver = DriverManager::get_driver_by_name("GTiff").unwrap();
        let mut label = driver
            .create_with_band_type::<u8, _>(&label_path, 100, 100, 3)
            .unwrap();
        label
            .set_geo_transform(&[0.0, 1.0, 0.0, 0.0, 0.0, 1.0])
            .unwrap();
        label
            .set_spatial_ref(&gdal::spatial_ref::SpatialRef::from_epsg(4326).unwrap())
            .unwrap();
        for (index, color) in [(1, 200u8), (2, 10), (3, 10)] {
            let mut data = vec![color; 100 * 100];
            for row in 0..10 {
                for col in 0..10 {
                    data[row * 100 + col] = 0;
                }
            }
            let mut band = label.rasterband(index).unwrap();
            band.write((0, 0), (100, 100), &Buffer::new((100, 100), data))
                .unwrap();
            band.set_no_data_value(Some(0.0)).unwrap();
        }
        drop(label);

        let out = mask_raster(&image_path, &label_path).unwrap();
        assert_eq!(out.file_name().unwrap(), "t9_raster.tif");

        let masked = Dataset::open(&out).unwrap();
        assert_eq!(masked.raster_size(), (100, 100));
        for index in 1..=3isize {
            let data = masked.rasterband(index).unwrap().read_band_as::<u16>().unwrap();
            for row in 0..100 {
                for col in 0..100 {
                    let expected = if row < 10 && col < 10 { 0 } else { 50 };
                    assert_eq!(data.data[row * 100 + col], expected, "band {index} at ({row}, {col})");
                }
            }
        }
    }

    #[test]
    fn test_mask_rejects_mismatched_sizes() {
        let dir = tempfile::tempdir().unwrap();
        let image_path = dir.path().join("a_B01.tif");
        let label_path = dir.path().join("a_labels.tif");
        write_tiff::<u16>(&image_path, 50, 50, 3, 7, None);
        write_tiff::<u8>(&label_path, 40, 50, 3, 7, Some(0.0));
        assert!(matches!(
            mask_raster(&image_path, &label_path),
            Err(LabelError::DimensionMismatch { .. })
        ));
    }
}
