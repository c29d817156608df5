#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Temporal aggregation and neighborhood ranking of bike trips.
//!
//! Turns raw trips into per-station hour-of-day profiles ([`hourly`]),
//! counts stations per neighborhood ([`counter`]), and dense-ranks
//! stations by ride volume within each neighborhood ([`rank`]). All
//! stages are pure functions over in-memory records; [`validate_inputs`]
//! is expected to run first.

pub mod config;
pub mod counter;
pub mod hourly;
pub mod rank;

use std::collections::BTreeSet;

use bike_map_station_models::{MalformedInputError, Neighborhood, Station, TripRecord};
use chrono::NaiveDate;
use thiserror::Error;

pub use config::{SummarizeConfig, TripWindow};

/// Errors that can occur before or during summarization.
#[derive(Debug, Error)]
pub enum SummarizeError {
    /// An input record is missing a required field.
    #[error(transparent)]
    Malformed(#[from] MalformedInputError),

    /// Two directory entries share a short code.
    #[error("Duplicate station short code: {short_code}")]
    DuplicateStation {
        /// The repeated short code.
        short_code: String,
    },

    /// The configured date window ends before it starts.
    #[error("Invalid trip window: {start} is after {end}")]
    InvalidWindow {
        /// Window start.
        start: NaiveDate,
        /// Window end.
        end: NaiveDate,
    },
}

/// Validates every input record before any aggregation runs.
///
/// # Errors
///
/// Returns the first [`MalformedInputError`] found, or
/// [`SummarizeError::DuplicateStation`] if two stations share a short
/// code.
pub fn validate_inputs(
    stations: &[Station],
    neighborhoods: &[Neighborhood],
    trips: &[TripRecord],
) -> Result<(), SummarizeError> {
    let mut seen = BTreeSet::new();
    for station in stations {
        station.validate()?;
        if !seen.insert(station.short_code.as_str()) {
            return Err(SummarizeError::DuplicateStation {
                short_code: station.short_code.clone(),
            });
        }
    }

    for neighborhood in neighborhoods {
        neighborhood.validate()?;
    }

    for trip in trips {
        trip.validate()?;
    }

    log::debug!(
        "Validated {} stations, {} neighborhoods, {} trips",
        stations.len(),
        neighborhoods.len(),
        trips.len()
    );
    Ok(())
}
