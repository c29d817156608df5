//! Station directory readers.
//!
//! Two layouts are accepted:
//!
//! - a GBFS `station_information.json` feed, where stations live under
//!   `data.stations` with `station_id`, `short_name`, `name`, `lon` and
//!   `lat` keys;
//! - a flat CSV with `station_id`, `short_code`, `name`, `longitude` and
//!   `latitude` columns (`short_name`, `lon` and `lat` are accepted as
//!   column aliases).

use std::io::Read;
use std::path::Path;

use bike_map_station_models::{MalformedInputError, Station};
use serde::Deserialize;
use serde_json::Value;

use crate::{IngestError, data_extension, file_label, open_input, required};

#[derive(Deserialize)]
struct GbfsFeed {
    data: GbfsData,
}

#[derive(Deserialize)]
struct GbfsData {
    stations: Vec<Value>,
}

#[derive(Deserialize)]
struct RawStation {
    station_id: Option<String>,
    #[serde(alias = "short_name")]
    short_code: Option<String>,
    name: Option<String>,
    #[serde(alias = "lon")]
    longitude: Option<String>,
    #[serde(alias = "lat")]
    latitude: Option<String>,
}

/// Loads a station directory, choosing the layout from the file
/// extension (`.json` or `.csv`, optionally gzip-compressed).
///
/// # Errors
///
/// Returns [`IngestError`] if the file cannot be read, has an
/// unsupported extension, or contains a malformed station.
pub fn load_stations(path: &Path) -> Result<Vec<Station>, IngestError> {
    let reader = open_input(path)?;
    let stations = match data_extension(path).as_deref() {
        Some("json") => read_gbfs_stations(reader)?,
        Some("csv") => read_station_csv(reader, &file_label(path))?,
        _ => {
            return Err(IngestError::UnsupportedFile {
                path: path.display().to_string(),
            });
        }
    };

    log::info!("Loaded {} stations from {}", stations.len(), path.display());
    Ok(stations)
}

/// Reads stations from a GBFS `station_information` document.
///
/// Numeric station ids are accepted and converted to text.
///
/// # Errors
///
/// Returns [`IngestError::Json`] if the document is not a GBFS feed, or
/// [`IngestError::Malformed`] for the first unusable station.
pub fn read_gbfs_stations<R: Read>(reader: R) -> Result<Vec<Station>, IngestError> {
    let feed: GbfsFeed = serde_json::from_reader(reader)?;

    feed.data
        .stations
        .iter()
        .enumerate()
        .map(|(i, raw)| {
            let record = format!("station #{}", i + 1);
            let station = Station {
                station_id: required(&record, "station_id", text(raw.get("station_id")))?,
                short_code: required(&record, "short_name", text(raw.get("short_name")))?,
                name: required(&record, "name", text(raw.get("name")))?,
                longitude: number(&record, "lon", raw.get("lon"))?,
                latitude: number(&record, "lat", raw.get("lat"))?,
            };
            station.validate()?;
            Ok::<_, IngestError>(station)
        })
        .collect()
}

/// Reads stations from a CSV directory. `label` names the source in
/// error messages.
///
/// # Errors
///
/// Returns [`IngestError::Csv`] if the CSV cannot be parsed, or
/// [`IngestError::Malformed`] for the first unusable row.
pub fn read_station_csv<R: Read>(reader: R, label: &str) -> Result<Vec<Station>, IngestError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut stations = Vec::new();

    for (i, row) in csv_reader.deserialize::<RawStation>().enumerate() {
        let row = row?;
        let record = format!("{label} row {}", i + 1);
        let station = Station {
            station_id: required(&record, "station_id", row.station_id)?,
            short_code: required(&record, "short_code", row.short_code)?,
            name: required(&record, "name", row.name)?,
            longitude: parse_coordinate(&record, "longitude", row.longitude)?,
            latitude: parse_coordinate(&record, "latitude", row.latitude)?,
        };
        station.validate()?;
        stations.push(station);
    }

    Ok(stations)
}

fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn number(record: &str, field: &str, value: Option<&Value>) -> Result<f64, MalformedInputError> {
    match value {
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| MalformedInputError::new(record, field, "is not a number")),
        Some(Value::String(s)) => parse_coordinate(record, field, Some(s.clone())),
        _ => Err(MalformedInputError::missing(record, field)),
    }
}

fn parse_coordinate(
    record: &str,
    field: &str,
    value: Option<String>,
) -> Result<f64, MalformedInputError> {
    let raw = required(record, field, value)?;
    raw.parse::<f64>()
        .map_err(|_| MalformedInputError::new(record, field, format!("is not a number: {raw}")))
}
