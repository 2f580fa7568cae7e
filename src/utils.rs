use std::path::{Path, PathBuf};

/// Derives an output filename from a source raster path.
///
/// The output name is the first underscore-delimited token of the source
/// file stem plus `suffix`, placed in the source's directory:
/// `tiles/t042_B04_2020.tif` + `_labels.tif` -> `tiles/t042_labels.tif`.
/// A stem without underscores is used whole.
pub fn derive_output_name(source: &Path, suffix: &str) -> PathBuf {
    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let token = stem.split('_').next().unwrap_or(stem);
    let file_name = format!("{token}{suffix}");
    match source.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join(file_name),
        _ => PathBuf::from(file_name),
    }
}
