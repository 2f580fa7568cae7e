//! Georeferencing of one raster tile: pixel dimensions, affine transform,
//! CRS, and the CRS-space footprint used for clipping.

use std::path::{Path, PathBuf};

use gdal::spatial_ref::SpatialRef;
use gdal::vector::Geometry;
use gdal::{Dataset, GeoTransform, GeoTransformEx};
use gdal_sys::OGRwkbGeometryType;

use crate::errors::Result;

/// Metadata of a raster tile, read once and invariant for a processing run.
///
/// A label image built against a `TileInfo` shares its width, height,
/// transform, and CRS, so the two rasters are pixel-for-pixel co-registered.
#[derive(Debug)]
pub struct TileInfo {
    pub path: PathBuf,
    pub width: usize,
    pub height: usize,
    pub geo_transform: GeoTransform,
    pub spatial_ref: SpatialRef,
}

impl TileInfo {
    /// Reads the georeferencing of the raster at `path`.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<TileInfo> {
        let path = path.as_ref();
        let dataset = Dataset::open(path)?;
        let (width, height) = dataset.raster_size();
        Ok(TileInfo {
            path: path.to_path_buf(),
            width,
            height,
            geo_transform: dataset.geo_transform()?,
            spatial_ref: dataset.spatial_ref()?,
        })
    }

    /// The tile's footprint in CRS space.
    ///
    /// All four pixel-space corners are mapped through the affine transform,
    /// so a rotated transform still yields the correct quadrilateral.
    pub fn footprint(&self) -> Result<Geometry> {
        let (w, h) = (self.width as f64, self.height as f64);
        let corners = [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h), (0.0, 0.0)];
        let mut ring = Geometry::empty(OGRwkbGeometryType::wkbLinearRing)?;
        for (i, (pixel, line)) in corners.iter().enumerate() {
            let (x, y) = self.geo_transform.apply(*pixel, *line);
            ring.set_point_2d(i, (x, y));
        }
        let mut footprint = Geometry::empty(OGRwkbGeometryType::wkbPolygon)?;
        footprint.add_geometry(ring)?;
        footprint.set_spatial_ref(self.spatial_ref.clone());
        Ok(footprint)
    }
}
