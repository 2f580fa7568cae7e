//! Vector-side data model: loading unit polygons, flattening compound
//! geometries, and reprojecting a dataset into a raster's CRS.

use std::convert::TryInto;
use std::path::Path;

use gdal::spatial_ref::{CoordTransform, SpatialRef};
use gdal::vector::{Geometry, LayerAccess, ToGdal};
use gdal::Dataset;

use crate::errors::{LabelError, Result};

/// Remote copy of the Arizona map-unit polygons, opened through `/vsicurl/`
/// when the local source cannot be read.
pub const UNIT_POLYGONS_FALLBACK_URL: &str =
    "https://raw.githubusercontent.com/azgs/geologic-map-of-arizona/gh-pages/data/MapUnitPolys.geojson";

/// Attribute field carrying the geologic-unit identifier.
pub const UNIT_FIELD: &str = "mapunit";

/// One polygon tagged with its map-unit identifier.
///
/// Records are replaced, never mutated: clipping and reprojection build new
/// records from old ones.
#[derive(Debug)]
pub struct VectorRecord {
    pub geometry: Geometry,
    pub unit: String,
}

/// An ordered collection of records sharing one declared CRS.
///
/// The `Vec` order is the source file's feature order; it is also the
/// tie-break order for rasterization (later records win on overlap), which
/// makes the burn-in ordering explicit rather than incidental.
#[derive(Debug)]
pub struct UnitPolygons {
    pub records: Vec<VectorRecord>,
    pub srs: Option<SpatialRef>,
}

impl UnitPolygons {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// True when two spatial references describe the same CRS.
pub fn same_srs(left: &SpatialRef, right: &SpatialRef) -> bool {
    (unsafe { gdal_sys::OSRIsSame(left.to_c_hsrs(), right.to_c_hsrs()) }) != 0
}

/// Human-readable CRS tag for error messages, e.g. `EPSG:32612`.
pub fn srs_label(srs: Option<&SpatialRef>) -> String {
    match srs {
        Some(srs) => match (srs.auth_name(), srs.auth_code()) {
            (Ok(name), Ok(code)) => format!("{name}:{code}"),
            _ => srs.name().unwrap_or_else(|_| "<unnamed>".to_string()),
        },
        None => "<undeclared>".to_string(),
    }
}

/// Reads unit polygons from `source` (layer 0), taking the unit identifier
/// from `unit_field`.
///
/// If the local source cannot be opened, one attempt is made against
/// [`UNIT_POLYGONS_FALLBACK_URL`] through GDAL's `/vsicurl/` filesystem;
/// both failing is [`LabelError::ResourceUnavailable`].
pub fn read_units(source: &str, unit_field: &str) -> Result<UnitPolygons> {
    let mut dataset = match Dataset::open(Path::new(source)) {
        Ok(dataset) => dataset,
        Err(err) => {
            let fallback = format!("/vsicurl/{UNIT_POLYGONS_FALLBACK_URL}");
            log::warn!("vector source '{source}' not readable ({err}), opening '{fallback}'");
            Dataset::open(Path::new(&fallback)).map_err(|_| LabelError::ResourceUnavailable {
                primary: source.to_string(),
                fallback: UNIT_POLYGONS_FALLBACK_URL.to_string(),
            })?
        }
    };

    let mut layer = dataset.layer(0)?;
    let mut records = Vec::with_capacity(layer.feature_count() as usize);
    let mut srs: Option<SpatialRef> = None;
    for feature in layer.features() {
        let fid = feature.fid().unwrap_or_default();
        // A field name absent from the layer schema surfaces as a GDAL
        // error; treat it the same as a null value.
        let unit = feature
            .field(unit_field)
            .ok()
            .flatten()
            .and_then(|value| value.into_string())
            .ok_or_else(|| LabelError::MissingField {
                fid,
                field: unit_field.to_string(),
            })?;
        let geometry = feature.geometry().ok_or_else(|| LabelError::MissingField {
            fid,
            field: "geometry".to_string(),
        })?;
        if srs.is_none() {
            srs = geometry.spatial_ref();
        }
        // Detach from the feature by round-tripping through geo-types.
        let shape: geo_types::Geometry<f64> = geometry.try_into()?;
        records.push(VectorRecord {
            geometry: shape.to_gdal()?,
            unit,
        });
    }
    log::debug!(
        "read {} unit polygons from '{}' ({})",
        records.len(),
        source,
        srs_label(srs.as_ref())
    );
    Ok(UnitPolygons { records, srs })
}

/// Flattens the dataset so every record holds a simple polygon.
///
/// Polygon records pass through unchanged; a MultiPolygon record emits one
/// record per constituent polygon, each duplicating the source record's unit
/// attribute. Any other geometry kind is [`LabelError::UnsupportedGeometry`].
/// Output count >= input count; the CRS is preserved.
pub fn normalize(dataset: UnitPolygons) -> Result<UnitPolygons> {
    let mut flat = Vec::with_capacity(dataset.records.len());
    for record in dataset.records {
        let shape: geo_types::Geometry<f64> = (&record.geometry).try_into()?;
        match shape {
            geo_types::Geometry::Polygon(_) => flat.push(record),
            geo_types::Geometry::MultiPolygon(parts) => {
                for part in parts.0 {
                    flat.push(VectorRecord {
                        geometry: geo_types::Geometry::Polygon(part).to_gdal()?,
                        unit: record.unit.clone(),
                    });
                }
            }
            other => {
                return Err(LabelError::UnsupportedGeometry {
                    found: geometry_kind(&other).to_string(),
                })
            }
        }
    }
    Ok(UnitPolygons {
        records: flat,
        srs: dataset.srs,
    })
}

/// Reprojects every record into `target`, yielding a new dataset.
///
/// Both sides are forced to traditional GIS (x = easting/longitude) axis
/// order before the transform is built, so lon/lat sources line up with
/// projected rasters. A dataset without a declared CRS cannot be
/// reprojected.
pub fn reproject(dataset: UnitPolygons, target: &SpatialRef) -> Result<UnitPolygons> {
    let source = match &dataset.srs {
        Some(srs) => srs.clone(),
        None => {
            return Err(LabelError::CrsMismatch {
                left: srs_label(None),
                right: srs_label(Some(target)),
            })
        }
    };
    let target = target.clone();
    source.set_axis_mapping_strategy(gdal_sys::OSRAxisMappingStrategy::OAMS_TRADITIONAL_GIS_ORDER);
    target.set_axis_mapping_strategy(gdal_sys::OSRAxisMappingStrategy::OAMS_TRADITIONAL_GIS_ORDER);
    let transform = CoordTransform::new(&source, &target)?;

    let records = dataset
        .records
        .into_iter()
        .map(|record| {
            Ok(VectorRecord {
                geometry: record.geometry.transform(&transform)?,
                unit: record.unit,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(UnitPolygons {
        records,
        srs: Some(target),
    })
}

pub(crate) fn geometry_kind(shape: &geo_types::Geometry<f64>) -> &'static str {
    match shape {
        geo_types::Geometry::Point(_) => "Point",
        geo_types::Geometry::Line(_) => "Line",
        geo_types::Geometry::LineString(_) => "LineString",
        geo_types::Geometry::Polygon(_) => "Polygon",
        geo_types::Geometry::MultiPoint(_) => "MultiPoint",
        geo_types::Geometry::MultiLineString(_) => "MultiLineString",
        geo_types::Geometry::MultiPolygon(_) => "MultiPolygon",
        geo_types::Geometry::GeometryCollection(_) => "GeometryCollection",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn record(wkt: &str, unit: &str) -> VectorRecord {
        VectorRecord {
            geometry: Geometry::from_wkt(wkt).unwrap(),
            unit: unit.to_string(),
        }
    }

    #[test]
    fn test_normalize_flattens_multipolygons() {
        let dataset = UnitPolygons {
            records: vec![
                record("POLYGON ((0 0, 4 0, 4 4, 0 4, 0 0))", "Qy"),
                record(
                    "MULTIPOLYGON (((10 10, 12 10, 12 12, 10 12, 10 10)), ((20 20, 21 20, 21 21, 20 21, 20 20)))",
                    "Xg",
                ),
            ],
            srs: None,
        };
        let flat = normalize(dataset).unwrap();
        assert_eq!(flat.len(), 3);
        assert_eq!(flat.records[0].unit, "Qy");
        assert_eq!(flat.records[1].unit, "Xg");
        assert_eq!(flat.records[2].unit, "Xg");
        assert_eq!(flat.records[1].geometry.area(), 4.0);
        assert_eq!(flat.records[2].geometry.area(), 1.0);
    }

    #[test]
    fn test_normalize_rejects_other_kinds() {
        let dataset = UnitPolygons {
            records: vec![record("LINESTRING (0 0, 1 1)", "Qy")],
            srs: None,
        };
        assert!(matches!(
            normalize(dataset),
            Err(LabelError::UnsupportedGeometry { found }) if found == "LineString"
        ));
    }

    #[test]
    fn test_reproject_requires_declared_crs() {
        let dataset = UnitPolygons {
            records: vec![],
            srs: None,
        };
        let target = SpatialRef::from_epsg(3857).unwrap();
        assert!(matches!(
            reproject(dataset, &target),
            Err(LabelError::CrsMismatch { .. })
        ));
    }

    #[test]
    fn test_reproject_to_web_mercator() {
        let dataset = UnitPolygons {
            records: vec![record("POLYGON ((0 0, 1 0, 1 1, 0 1, 0 0))", "Qy")],
            srs: Some(SpatialRef::from_epsg(4326).unwrap()),
        };
        let target = SpatialRef::from_epsg(3857).unwrap();
        let projected = reproject(dataset, &target).unwrap();
        assert_eq!(projected.len(), 1);
        assert!(same_srs(projected.srs.as_ref().unwrap(), &target));

        let shape: geo_types::Geometry<f64> =
            (&projected.records[0].geometry).try_into().unwrap();
        let polygon = match shape {
            geo_types::Geometry::Polygon(p) => p,
            other => panic!("expected polygon, got {}", geometry_kind(&other)),
        };
        let xs: Vec<f64> = polygon.exterior().coords().map(|c| c.x).collect();
        // One degree of longitude at the equator in web-mercator metres.
        let dx = xs.iter().cloned().fold(f64::MIN, f64::max);
        assert!((dx - 111_319.49079327357).abs() < 1e-3, "dx = {dx}");
    }

    #[test]
    fn test_read_units_from_geojson() {
        let geojson = r#"{
  "type": "FeatureCollection",
  "features": [
    {
      "type": "Feature",
      "properties": { "mapunit": "Qy" },
      "geometry": {
        "type": "Polygon",
        "coordinates": [[[0, 0], [2, 0], [2, 2], [0, 2], [0, 0]]]
      }
    },
    {
      "type": "Feature",
      "properties": { "mapunit": "Xg" },
      "geometry": {
        "type": "MultiPolygon",
        "coordinates": [
          [[[3, 3], [4, 3], [4, 4], [3, 4], [3, 3]]],
          [[[5, 5], [6, 5], [6, 6], [5, 6], [5, 5]]]
        ]
      }
    }
  ]
}"#;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("units.geojson");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(geojson.as_bytes())
            .unwrap();

        let dataset = read_units(path.to_str().unwrap(), UNIT_FIELD).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.records[0].unit, "Qy");
        assert!(dataset.srs.is_some());

        let flat = normalize(dataset).unwrap();
        assert_eq!(flat.len(), 3);
    }

    #[test]
    fn test_read_units_missing_field() {
        let geojson = r#"{
  "type": "FeatureCollection",
  "features": [
    {
      "type": "Feature",
      "properties": { "name": "no unit here" },
      "geometry": {
        "type": "Polygon",
        "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 1], [0, 0]]]
      }
    }
  ]
}"#;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("units.geojson");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(geojson.as_bytes())
            .unwrap();

        assert!(matches!(
            read_units(path.to_str().unwrap(), UNIT_FIELD),
            Err(LabelError::MissingField { .. })
        ));
    }
}
