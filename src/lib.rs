//! Rasterization of labeled geologic-unit polygons into label images that
//! are co-registered with an existing raster tile.
//!
//! The pipeline reads a polygon layer whose features carry a map-unit
//! identifier, reprojects and clips it to a tile's footprint, burns each
//! unit's color into a 3-band grid, and writes the grid as a GTiff sharing
//! the tile's geotransform and CRS. A second step multiplies the tile's
//! bands by the label raster's validity mask so unlabeled pixels read zero.
//!
//! ```no_run
//! use geolabel::{generate_label_raster, mask_raster};
//!
//! fn run() -> geolabel::Result<()> {
//!     let labels = generate_label_raster(
//!         "tiles/t42_B04.tif",
//!         "units/geologic_units.geojson",
//!         "units/colors.csv",
//!     )?;
//!     mask_raster("tiles/t42_B04.tif".as_ref(), &labels)?;
//!     Ok(())
//! }
//! ```

pub mod clip;
pub mod colors;
pub mod errors;
pub mod label;
pub mod mask;
pub mod raster;
pub mod tile;
pub mod utils;
pub mod vector;

pub use clip::clip_to_bounds;
pub use colors::{ColorLookup, Rgb};
pub use errors::{LabelError, Result};
pub use label::{generate_label_raster, label_image, write_label_image, LabelImage, LABEL_SUFFIX};
pub use mask::{mask_raster, MASKED_SUFFIX};
pub use raster::{burn_band, BACKGROUND};
pub use tile::TileInfo;
pub use utils::derive_output_name;
pub use vector::{normalize, read_units, reproject, UnitPolygons, VectorRecord, UNIT_FIELD};
