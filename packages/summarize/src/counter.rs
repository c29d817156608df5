//! Distinct station counts per neighborhood.

use std::collections::{BTreeMap, BTreeSet};

use bike_map_station_models::StationWithNeighborhood;

/// Counts distinct station short codes in each neighborhood.
///
/// Stations without a neighborhood are not counted anywhere.
#[must_use]
pub fn stations_per_neighborhood(stations: &[StationWithNeighborhood]) -> BTreeMap<String, u32> {
    let mut members: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();

    for station in stations {
        if let Some(code) = station.neighborhood_code() {
            members.entry(code).or_default().insert(station.short_code());
        }
    }

    members
        .into_iter()
        .map(|(code, codes)| {
            (
                code.to_string(),
                u32::try_from(codes.len()).unwrap_or(u32::MAX),
            )
        })
        .collect()
}
