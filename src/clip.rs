//! Spatial clipping of a vector dataset to a bounding region.

use std::convert::TryInto;

use gdal::vector::{Geometry, ToGdal};

use crate::errors::Result;
use crate::vector::{UnitPolygons, VectorRecord};

/// Clips `dataset` to `bounds`, both in the same CRS.
///
/// Records that do not intersect the bounds are excluded. Kept records have
/// their geometry replaced by the intersection with the bounds; polygonal
/// intersection products are split into one record per simple polygon, and
/// lower-dimensional or zero-area residue from boundary touches is dropped.
/// The input records are consumed, not mutated, and the output preserves
/// both the input order and the input CRS.
///
/// This is a linear scan with no spatial index, which is fine for per-tile
/// vector extracts; large inputs would want an R-tree in front of it.
pub fn clip_to_bounds(dataset: UnitPolygons, bounds: &Geometry) -> Result<UnitPolygons> {
    let mut kept = Vec::new();
    for record in dataset.records {
        if !record.geometry.intersects(bounds) && !record.geometry.contains(bounds) {
            continue;
        }
        let clipped = match record.geometry.intersection(bounds) {
            Some(clipped) if !clipped.is_empty() => clipped,
            _ => continue,
        };
        for part in polygonal_parts(&clipped)? {
            if part.area() > 0.0 {
                kept.push(VectorRecord {
                    geometry: part,
                    unit: record.unit.clone(),
                });
            }
        }
    }
    log::debug!("clip kept {} records", kept.len());
    Ok(UnitPolygons {
        records: kept,
        srs: dataset.srs,
    })
}

/// Extracts the simple polygons of a geometry, recursing into collections.
fn polygonal_parts(geometry: &Geometry) -> Result<Vec<Geometry>> {
    let shape: geo_types::Geometry<f64> = geometry.try_into()?;
    let mut parts = Vec::new();
    collect_polygons(shape, &mut parts)?;
    Ok(parts)
}

fn collect_polygons(shape: geo_types::Geometry<f64>, out: &mut Vec<Geometry>) -> Result<()> {
    match shape {
        geo_types::Geometry::Polygon(polygon) => {
            out.push(geo_types::Geometry::Polygon(polygon).to_gdal()?);
        }
        geo_types::Geometry::MultiPolygon(parts) => {
            for polygon in parts.0 {
                out.push(geo_types::Geometry::Polygon(polygon).to_gdal()?);
            }
        }
        geo_types::Geometry::GeometryCollection(members) => {
            for member in members.0 {
                collect_polygons(member, out)?;
            }
        }
        // Points and lines from boundary touches carry no area.
        _ => {}
    }
    Ok(())
}
