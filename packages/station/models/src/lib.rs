#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Station, neighborhood, and trip record types.
//!
//! This crate defines the records that flow through the bike map
//! summarization pipeline: the station directory, neighborhood boundary
//! polygons, raw trip records, and the derived hourly profiles and
//! neighborhood rankings. Validation of raw input records lives in
//! [`validate`].

pub mod validate;

use chrono::NaiveDateTime;
use geo::MultiPolygon;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use validate::MalformedInputError;

/// A physical dock station from the station directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    /// Internal operator identifier (numeric or UUID, kept as text).
    pub station_id: String,
    /// Stable human-meaningful code used to join trips and rankings.
    pub short_code: String,
    /// Display name.
    pub name: String,
    /// WGS84 longitude.
    pub longitude: f64,
    /// WGS84 latitude.
    pub latitude: f64,
}

/// A named neighborhood polygon (e.g. an NYC NTA).
#[derive(Debug, Clone, PartialEq)]
pub struct Neighborhood {
    /// Neighborhood code (e.g. `"MN17"`).
    pub code: String,
    /// Neighborhood name.
    pub name: String,
    /// Borough (or other parent area) name.
    pub borough: String,
    /// Boundary in WGS84 longitude/latitude.
    pub boundary: MultiPolygon<f64>,
}

impl Neighborhood {
    /// Returns the identity fields of this neighborhood without geometry.
    #[must_use]
    pub fn to_ref(&self) -> NeighborhoodRef {
        NeighborhoodRef {
            code: self.code.clone(),
            name: self.name.clone(),
            borough: self.borough.clone(),
        }
    }
}

/// Neighborhood identity copied onto a station by the spatial join.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NeighborhoodRef {
    /// Neighborhood code.
    pub code: String,
    /// Neighborhood name.
    pub name: String,
    /// Borough name.
    pub borough: String,
}

/// A station with the neighborhood whose polygon contains it, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationWithNeighborhood {
    /// The station record.
    pub station: Station,
    /// Containing neighborhood, or `None` when no polygon matched.
    pub neighborhood: Option<NeighborhoodRef>,
}

impl StationWithNeighborhood {
    /// Returns the station short code.
    #[must_use]
    pub fn short_code(&self) -> &str {
        &self.station.short_code
    }

    /// Returns the containing neighborhood code, if any.
    #[must_use]
    pub fn neighborhood_code(&self) -> Option<&str> {
        self.neighborhood.as_ref().map(|n| n.code.as_str())
    }
}

/// Rider membership category.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum RiderType {
    /// Annual member (older feeds call these "Subscriber").
    #[strum(to_string = "member", serialize = "subscriber")]
    Member,
    /// Casual rider (older feeds call these "Customer").
    #[strum(to_string = "casual", serialize = "customer")]
    Casual,
}

/// Which end of a trip is considered when aggregating.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Orientation {
    /// The trip's start station and start time.
    #[default]
    Start,
    /// The trip's stop station and stop time.
    Stop,
}

/// How bucketed hourly counts are collapsed across calendar dates.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Statistic {
    /// Total rides per hour-of-day.
    #[default]
    Sum,
    /// Mean rides per hour window, rounded to one decimal.
    Mean,
}

/// A single ride.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripRecord {
    /// Operator ride identifier.
    pub ride_id: String,
    /// Local (timezone-naive) undock time.
    pub start_time: NaiveDateTime,
    /// Local (timezone-naive) dock time.
    pub stop_time: NaiveDateTime,
    /// Short code of the start station.
    pub start_short_code: String,
    /// Short code of the stop station.
    pub stop_short_code: String,
    /// Rider category, when the source provides one.
    pub rider_type: Option<RiderType>,
}

impl TripRecord {
    /// Returns the station short code at the given end of the trip.
    #[must_use]
    pub fn short_code(&self, orientation: Orientation) -> &str {
        match orientation {
            Orientation::Start => &self.start_short_code,
            Orientation::Stop => &self.stop_short_code,
        }
    }

    /// Returns the timestamp at the given end of the trip.
    #[must_use]
    pub const fn time(&self, orientation: Orientation) -> NaiveDateTime {
        match orientation {
            Orientation::Start => self.start_time,
            Orientation::Stop => self.stop_time,
        }
    }
}

/// Ride volume for one station in one hour of the day.
///
/// Hours with no rides have no row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyProfile {
    /// Station short code (taken from the trip, not the directory).
    pub short_code: String,
    /// Hour of day, 0-23.
    pub hour_of_day: u8,
    /// Summed or averaged ride count, depending on [`Statistic`].
    pub ride_count: f64,
}

/// Popularity rank of a station within its neighborhood.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationRanking {
    /// Station short code.
    pub short_code: String,
    /// Neighborhood the station was ranked within.
    pub neighborhood_code: String,
    /// Dense rank, starting at 1 for the busiest station(s).
    pub rank: u32,
    /// Trips started at this station.
    pub total_rides: u64,
    /// Distinct stations located in the neighborhood.
    pub stations_in_neighborhood: u32,
}
