//! Label-image assembly: color resolution, per-channel burning, and the
//! tile-level orchestration that writes a georeferenced label raster.

use std::path::{Path, PathBuf};

use gdal::raster::Buffer;
use gdal::DriverManager;
use ndarray::{Array3, ArrayView2, Axis};

use crate::clip::clip_to_bounds;
use crate::colors::ColorLookup;
use crate::errors::{LabelError, Result};
use crate::raster::{burn_band, BACKGROUND};
use crate::tile::TileInfo;
use crate::utils::derive_output_name;
use crate::vector::{normalize, read_units, reproject, same_srs, srs_label, UnitPolygons, UNIT_FIELD};

/// Filename suffix of label rasters: `<tile>_labels.tif`.
pub const LABEL_SUFFIX: &str = "_labels.tif";

/// A 3-channel (R, G, B) pixel grid co-registered with its source tile.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelImage {
    /// Shape `(3, height, width)`, band order R, G, B.
    pub pixels: Array3<u8>,
}

impl LabelImage {
    pub fn width(&self) -> usize {
        self.pixels.shape()[2]
    }

    pub fn height(&self) -> usize {
        self.pixels.shape()[1]
    }

    /// One color channel as a `(height, width)` view; 0 = R, 1 = G, 2 = B.
    pub fn channel(&self, index: usize) -> ArrayView2<u8> {
        self.pixels.index_axis(Axis(0), index)
    }
}

/// Rasterizes a clipped, normalized dataset into a [`LabelImage`] aligned to
/// `tile`.
///
/// Colors are resolved for every record before any burning so an unknown
/// unit aborts without partial work. Each channel is burned independently
/// with the channel component of each record's color; pixels covered by no
/// record read `(0, 0, 0)`.
pub fn label_image(
    dataset: UnitPolygons,
    lookup: &ColorLookup,
    tile: &TileInfo,
) -> Result<LabelImage> {
    if let Some(srs) = &dataset.srs {
        if !same_srs(srs, &tile.spatial_ref) {
            return Err(LabelError::CrsMismatch {
                left: srs_label(Some(srs)),
                right: srs_label(Some(&tile.spatial_ref)),
            });
        }
    }

    let mut geometries = Vec::with_capacity(dataset.records.len());
    let mut colors = Vec::with_capacity(dataset.records.len());
    for record in dataset.records {
        colors.push(lookup.get(&record.unit)?);
        geometries.push(record.geometry);
    }

    let burn = |values: Vec<f64>| {
        burn_band(
            &geometries,
            &values,
            tile.width,
            tile.height,
            &tile.geo_transform,
            BACKGROUND,
        )
    };
    let r = burn(colors.iter().map(|c| f64::from(c.r)).collect())?;
    let g = burn(colors.iter().map(|c| f64::from(c.g)).collect())?;
    let b = burn(colors.iter().map(|c| f64::from(c.b)).collect())?;

    let pixels = ndarray::stack(Axis(0), &[r.view(), g.view(), b.view()]).map_err(|_| {
        LabelError::DimensionMismatch {
            expected: (tile.width, tile.height),
            actual: (r.shape()[1], r.shape()[0]),
        }
    })?;
    Ok(LabelImage { pixels })
}

/// Writes `image` as a 3-band GTiff reusing the tile's transform and CRS.
///
/// Each band gets nodata 0, which is what later drives the validity mask
/// used by [`crate::mask::mask_raster`].
pub fn write_label_image(image: &LabelImage, tile: &TileInfo, path: &Path) -> Result<()> {
    let (width, height) = (image.width(), image.height());
    if (width, height) != (tile.width, tile.height) {
        return Err(LabelError::DimensionMismatch {
            expected: (tile.width, tile.height),
            actual: (width, height),
        });
    }

    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let mut dataset =
        driver.create_with_band_type::<u8, _>(path, width as isize, height as isize, 3)?;
    dataset.set_geo_transform(&tile.geo_transform)?;
    dataset.set_spatial_ref(&tile.spatial_ref)?;
    for channel in 0..3 {
        let data: Vec<u8> = image.channel(channel).iter().copied().collect();
        let buffer = Buffer::new((width, height), data);
        let mut band = dataset.rasterband(channel as isize + 1)?;
        band.write((0, 0), (width, height), &buffer)?;
        band.set_no_data_value(Some(f64::from(BACKGROUND)))?;
    }
    Ok(())
}

/// Full labeling pipeline for one tile.
///
/// Loads the vector source (with remote fallback), flattens compound
/// geometries, reprojects into the tile CRS when the source CRS differs,
/// clips to the tile footprint, resolves colors, burns the three channels,
/// and writes `<first-token-of-tile>_labels.tif` next to the tile. Returns
/// the written path. Any failing step aborts the tile before the writer
/// runs, so no partial output is left behind.
pub fn generate_label_raster<P, Q>(
    raster_path: P,
    vector_source: &str,
    color_table: Q,
) -> Result<PathBuf>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let raster_path = raster_path.as_ref();
    let tile = TileInfo::from_path(raster_path)?;
    log::info!(
        "labeling '{}' ({}x{}, {})",
        raster_path.display(),
        tile.width,
        tile.height,
        srs_label(Some(&tile.spatial_ref))
    );

    let units = read_units(vector_source, UNIT_FIELD)?;
    let units = normalize(units)?;
    let needs_reprojection = match &units.srs {
        Some(srs) => !same_srs(srs, &tile.spatial_ref),
        None => false,
    };
    let units = if needs_reprojection {
        log::debug!(
            "reprojecting {} records from {} to {}",
            units.len(),
            srs_label(units.srs.as_ref()),
            srs_label(Some(&tile.spatial_ref))
        );
        reproject(units, &tile.spatial_ref)?
    } else {
        UnitPolygons {
            records: units.records,
            srs: Some(tile.spatial_ref.clone()),
        }
    };

    let clipped = clip_to_bounds(units, &tile.footprint()?)?;
    log::info!("{} polygons intersect the tile footprint", clipped.len());

    let lookup = ColorLookup::load(color_table)?;
    let image = label_image(clipped, &lookup, &tile)?;

    let out_path = derive_output_name(raster_path, LABEL_SUFFIX);
    write_label_image(&image, &tile, &out_path)?;
    log::info!("wrote label raster '{}'", out_path.display());
    Ok(out_path)
}
