#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Readers for the three run inputs.
//!
//! - [`stations`]: GBFS `station_information.json` feeds or a flat CSV
//!   station directory.
//! - [`neighborhoods`]: a `GeoJSON` `FeatureCollection` of polygon or
//!   multipolygon boundaries with configurable property names.
//! - [`trips`]: operator trip CSV exports, plain or gzip-compressed.
//!
//! Every reader fails on the first record with a missing or unusable
//! required field, returning a [`MalformedInputError`] that names it.

pub mod neighborhoods;
pub mod progress;
pub mod stations;
pub mod trips;

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

pub use bike_map_station_models::MalformedInputError;
use thiserror::Error;

/// Errors that can occur while reading input files.
#[derive(Debug, Error)]
pub enum IngestError {
    /// File I/O failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV structure could not be read.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON could not be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// `GeoJSON` could not be parsed.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// A record is missing a required field or has an unusable value.
    #[error(transparent)]
    Malformed(#[from] MalformedInputError),

    /// The file extension does not identify a supported input format.
    #[error("Unsupported input file: {path}")]
    UnsupportedFile {
        /// Offending path.
        path: String,
    },
}

/// Lower-cased extension of `path`, ignoring a trailing `.gz`.
fn data_extension(path: &Path) -> Option<String> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    if extension == "gz" {
        return data_extension(Path::new(path.file_stem()?));
    }
    Some(extension)
}

/// Opens `path` for buffered reading, decompressing `.gz` files.
fn open_input(path: &Path) -> Result<Box<dyn Read>, IngestError> {
    let file = BufReader::new(File::open(path)?);
    let gzipped = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("gz"));

    if gzipped {
        Ok(Box::new(flate2::read::GzDecoder::new(file)))
    } else {
        Ok(Box::new(file))
    }
}

/// Display name used in record labels.
fn file_label(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}

/// Returns `value` unless it is absent or blank.
fn required(
    record: &str,
    field: &str,
    value: Option<String>,
) -> Result<String, MalformedInputError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(MalformedInputError::missing(record, field)),
    }
}
