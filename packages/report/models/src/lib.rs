#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Enriched station report types.
//!
//! A [`Report`] maps each station short code to its position,
//! neighborhood, popularity rank and hour-of-day profile. These types are
//! what gets written to JSON, `MessagePack` or `GeoJSON` and read back.

use std::collections::BTreeMap;

use bike_map_station_models::{NeighborhoodRef, Orientation, Statistic};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Ride count for one hour of the day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourCount {
    /// Hour of day, 0-23.
    pub hour_of_day: u8,
    /// Summed or averaged ride count.
    pub ride_count: f64,
}

/// Hour-of-day profiles keyed by station short code.
pub type HourlyProfileMap = BTreeMap<String, Vec<HourCount>>;

/// WGS84 point geometry of a station.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StationPoint {
    /// Longitude.
    pub longitude: f64,
    /// Latitude.
    pub latitude: f64,
}

/// Everything known about one station after a run.
///
/// `rank` and `total_rides` are `None` for stations that were not ranked
/// (no neighborhood, or no trips without zero-fill).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationReport {
    /// Operator station identifier.
    pub station_id: String,
    /// Station short code.
    pub short_code: String,
    /// Station name.
    pub name: String,
    /// Station position.
    pub geometry: StationPoint,
    /// Containing neighborhood.
    pub neighborhood: Option<NeighborhoodRef>,
    /// Dense popularity rank within the neighborhood.
    pub rank: Option<u32>,
    /// Rides attributed to the station.
    pub total_rides: Option<u64>,
    /// Distinct stations in the station's neighborhood.
    pub stations_in_neighborhood: Option<u32>,
    /// Observed hours only, ordered by hour.
    pub hourly: Vec<HourCount>,
}

/// How a report was produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    /// Statistic used for hourly profiles.
    pub statistic: Statistic,
    /// Trip end used for hourly profiles.
    pub orientation: Orientation,
    /// Trips received before filtering.
    pub total_trips: u64,
    /// Trips that contributed to hourly profiles.
    pub profiled_trips: u64,
    /// Trips that contributed to rankings.
    pub ranked_trips: u64,
    /// Earliest oriented timestamp among accepted trips.
    pub first_trip: Option<NaiveDateTime>,
    /// Latest oriented timestamp among accepted trips.
    pub last_trip: Option<NaiveDateTime>,
    /// Neighborhoods that contain at least one station.
    pub neighborhood_count: u32,
}

/// The enriched station dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Run description.
    pub metadata: ReportMetadata,
    /// Stations keyed by short code.
    pub stations: BTreeMap<String, StationReport>,
}

impl Report {
    /// Stations in a neighborhood, best rank first. Unranked stations
    /// come last.
    #[must_use]
    pub fn stations_in(&self, neighborhood_code: &str) -> Vec<&StationReport> {
        let mut stations: Vec<&StationReport> = self
            .stations
            .values()
            .filter(|s| {
                s.neighborhood
                    .as_ref()
                    .is_some_and(|n| n.code == neighborhood_code)
            })
            .collect();
        stations.sort_by_key(|s| (s.rank.unwrap_or(u32::MAX), s.short_code.clone()));
        stations
    }

    /// Distinct neighborhood codes present in the report.
    #[must_use]
    pub fn neighborhood_codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self
            .stations
            .values()
            .filter_map(|s| s.neighborhood.as_ref().map(|n| n.code.as_str()))
            .collect();
        codes.sort_unstable();
        codes.dedup();
        codes
    }
}
