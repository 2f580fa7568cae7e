//! Lookup table mapping geologic map units to their area-fill colors.
//!
//! The reference table is a CSV with (at least) a `mapunit` column and an
//! `areafillrgb` column holding three semicolon-separated channel values,
//! e.g. `"200;10;10"`. Rows without a fill color (legend headings and the
//! like) are skipped; a malformed non-empty descriptor is a hard error.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::errors::{LabelError, Result};

/// Remote copy of the Arizona description-of-map-units table, fetched when
/// the local table cannot be read.
pub const COLOR_TABLE_FALLBACK_URL: &str =
    "https://raw.githubusercontent.com/azgs/geologic-map-of-arizona/gh-pages/data/DescriptionOfMapUnits.csv";

const UNIT_COLUMN: &str = "mapunit";
const COLOR_COLUMN: &str = "areafillrgb";

/// An 8-bit RGB triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Parses a composite `"R;G;B"` descriptor.
    fn parse(unit: &str, descriptor: &str) -> Result<Rgb> {
        let parts: Vec<&str> = descriptor.split(';').collect();
        let channel = |i: usize| -> Option<u8> { parts.get(i)?.trim().parse().ok() };
        match (parts.len(), channel(0), channel(1), channel(2)) {
            (3, Some(r), Some(g), Some(b)) => Ok(Rgb { r, g, b }),
            _ => Err(LabelError::InvalidColor {
                unit: unit.to_string(),
                descriptor: descriptor.to_string(),
            }),
        }
    }
}

/// Resolves a map-unit identifier to its `(R, G, B)` fill color.
///
/// Built once per run; lookups are O(1) and deterministic. The table is
/// read-only after construction and may be shared across tiles.
#[derive(Debug, Clone)]
pub struct ColorLookup {
    entries: HashMap<String, Rgb>,
}

impl ColorLookup {
    /// Loads the table from `primary`, falling back to one fetch of
    /// [`COLOR_TABLE_FALLBACK_URL`] if the local file cannot be opened.
    pub fn load<P: AsRef<Path>>(primary: P) -> Result<ColorLookup> {
        Self::load_with_fallback(primary, COLOR_TABLE_FALLBACK_URL)
    }

    /// Two-stage load: try the local path, then the given fallback URL.
    ///
    /// Only the "cannot open/fetch" condition triggers the fallback; a table
    /// that opens but fails to parse is reported as a parse error.
    pub fn load_with_fallback<P: AsRef<Path>>(primary: P, fallback: &str) -> Result<ColorLookup> {
        let primary = primary.as_ref();
        match File::open(primary) {
            Ok(file) => Self::from_reader(file),
            Err(err) => {
                log::warn!(
                    "color table '{}' not readable ({}), fetching '{}'",
                    primary.display(),
                    err,
                    fallback
                );
                let response =
                    ureq::get(fallback)
                        .call()
                        .map_err(|_| LabelError::ResourceUnavailable {
                            primary: primary.display().to_string(),
                            fallback: fallback.to_string(),
                        })?;
                Self::from_reader(response.into_reader())
            }
        }
    }

    /// Builds the table from CSV text. Header names are matched
    /// case-insensitively; later duplicate keys replace earlier ones.
    pub fn from_reader<R: Read>(reader: R) -> Result<ColorLookup> {
        let mut csv = csv::Reader::from_reader(reader);
        let mut position = |name: &'static str| -> Result<usize> {
            Ok(csv
                .headers()?
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .ok_or(LabelError::MissingColumn(name))?)
        };
        let unit_idx = position(UNIT_COLUMN)?;
        let color_idx = position(COLOR_COLUMN)?;

        let mut entries = HashMap::new();
        for record in csv.records() {
            let record = record?;
            let unit = record.get(unit_idx).unwrap_or("").trim();
            let descriptor = record.get(color_idx).unwrap_or("").trim();
            if unit.is_empty() || descriptor.is_empty() {
                continue;
            }
            entries.insert(unit.to_string(), Rgb::parse(unit, descriptor)?);
        }
        log::debug!("color lookup built with {} entries", entries.len());
        Ok(ColorLookup { entries })
    }

    /// Resolves `unit` to its color; an absent identifier is [`LabelError::UnknownUnit`].
    pub fn get(&self, unit: &str) -> Result<Rgb> {
        self.entries
            .get(unit)
            .copied()
            .ok_or_else(|| LabelError::UnknownUnit(unit.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
