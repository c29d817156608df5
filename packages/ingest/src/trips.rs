//! Trip log reader.
//!
//! Operator exports are CSV files, usually one per month and often
//! gzip-compressed. Current exports name their columns `started_at`,
//! `ended_at`, `start_station_id`, `end_station_id` and
//! `member_casual`; the internal names (`start_time`, `stop_time`,
//! `start_short_code`, `stop_short_code`, `rider_type`) are accepted as
//! well. Extra columns are ignored.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use bike_map_station_models::{MalformedInputError, RiderType, TripRecord};
use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::progress::ProgressCallback;
use crate::{IngestError, file_label, open_input, required};

/// Timestamp layouts seen in trip exports, tried in order.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Rows between progress updates.
const PROGRESS_BATCH: u64 = 10_000;

#[derive(Deserialize)]
struct RawTrip {
    ride_id: Option<String>,
    #[serde(alias = "started_at")]
    start_time: Option<String>,
    #[serde(alias = "ended_at")]
    stop_time: Option<String>,
    #[serde(alias = "start_station_id")]
    start_short_code: Option<String>,
    #[serde(alias = "end_station_id")]
    stop_short_code: Option<String>,
    #[serde(alias = "member_casual")]
    rider_type: Option<String>,
}

/// Parses a local trip timestamp. Fractional seconds are accepted and
/// kept.
#[must_use]
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
}

/// Loads and concatenates every trip file in `paths`, in order.
///
/// # Errors
///
/// Returns [`IngestError`] for the first file that cannot be read or
/// contains a malformed row.
pub fn load_trips(
    paths: &[PathBuf],
    progress: &Arc<dyn ProgressCallback>,
) -> Result<Vec<TripRecord>, IngestError> {
    let mut trips = Vec::new();

    for path in paths {
        let label = file_label(path);
        progress.set_message(format!("Reading {label}"));

        let before = trips.len();
        trips.extend(read_trips(open_input(path)?, &label, progress)?);
        log::info!("Read {} trips from {}", trips.len() - before, path.display());
    }

    progress.finish(format!("Read {} trips from {} files", trips.len(), paths.len()));
    Ok(trips)
}

/// Reads trips from one CSV source. `label` names the source in error
/// messages.
///
/// # Errors
///
/// Returns [`IngestError::Csv`] if the CSV cannot be parsed, or
/// [`IngestError::Malformed`] for the first row with a missing or
/// unusable field.
pub fn read_trips<R: Read>(
    reader: R,
    label: &str,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<Vec<TripRecord>, IngestError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut trips = Vec::new();
    let mut pending = 0u64;

    for (i, row) in csv_reader.deserialize::<RawTrip>().enumerate() {
        let record = format!("{label} row {}", i + 1);
        let trip = to_trip(&record, row?)?;
        trip.validate()?;
        trips.push(trip);

        pending += 1;
        if pending == PROGRESS_BATCH {
            progress.inc(pending);
            pending = 0;
        }
    }
    progress.inc(pending);

    Ok(trips)
}

fn to_trip(record: &str, row: RawTrip) -> Result<TripRecord, MalformedInputError> {
    let rider_type = match row.rider_type.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(raw.parse::<RiderType>().map_err(|_| {
            MalformedInputError::new(record, "rider_type", format!("is not a rider type: {raw}"))
        })?),
    };

    Ok(TripRecord {
        ride_id: required(record, "ride_id", row.ride_id)?,
        start_time: timestamp(record, "start_time", row.start_time)?,
        stop_time: timestamp(record, "stop_time", row.stop_time)?,
        start_short_code: required(record, "start_short_code", row.start_short_code)?,
        stop_short_code: required(record, "stop_short_code", row.stop_short_code)?,
        rider_type,
    })
}

fn timestamp(
    record: &str,
    field: &str,
    value: Option<String>,
) -> Result<NaiveDateTime, MalformedInputError> {
    let raw = required(record, field, value)?;
    parse_timestamp(&raw).ok_or_else(|| {
        MalformedInputError::new(record, field, format!("is not a timestamp: {raw}"))
    })
}
