//! Error taxonomy for the labeling pipeline.

use thiserror::Error;

/// Errors raised while turning a vector map into a label raster.
///
/// Every variant names the offending input (path, unit identifier, or
/// resource URL) in its `Display` text so per-tile failures can be logged
/// by a batch driver without further context.
#[derive(Debug, Error)]
pub enum LabelError {
    /// Neither the local source nor the remote fallback could be read.
    #[error("neither '{primary}' nor fallback '{fallback}' could be read")]
    ResourceUnavailable { primary: String, fallback: String },

    /// A geometry kind other than Polygon or MultiPolygon was encountered.
    #[error("unsupported geometry kind '{found}', expected Polygon or MultiPolygon")]
    UnsupportedGeometry { found: String },

    /// A record's map-unit identifier has no entry in the color table.
    #[error("map unit '{0}' has no entry in the color table")]
    UnknownUnit(String),

    /// A color descriptor was present but not three integers in 0..=255.
    #[error("map unit '{unit}' has a malformed color descriptor '{descriptor}'")]
    InvalidColor { unit: String, descriptor: String },

    /// The reference table lacks a required column.
    #[error("color table has no '{0}' column")]
    MissingColumn(&'static str),

    /// A feature is missing the unit-identifier field.
    #[error("feature {fid} has no usable '{field}' field")]
    MissingField { fid: u64, field: String },

    /// Two inputs declare differing coordinate reference systems.
    #[error("coordinate reference systems differ: '{left}' vs '{right}'")]
    CrsMismatch { left: String, right: String },

    /// A pixel grid does not have the shape the source raster declares.
    #[error("grid shape {actual:?} does not match raster shape {expected:?} (width, height)")]
    DimensionMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error(transparent)]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("color table could not be parsed: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LabelError>;
