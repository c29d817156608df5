//! Merges spatial, ranking and hourly outputs into one record per station.
//!
//! The join key is the station short code throughout. Every station in
//! the directory appears in the report; rankings and profiles only add
//! to what is already there.

use std::collections::BTreeMap;

use bike_map_report_models::{
    HourCount, HourlyProfileMap, Report, ReportMetadata, StationPoint, StationReport,
};
use bike_map_station_models::{HourlyProfile, StationRanking, StationWithNeighborhood};
use bike_map_summarize::hourly::profiles_by_station;

/// Groups hourly profile rows into a per-station map.
#[must_use]
pub fn profile_map(profiles: &[HourlyProfile]) -> HourlyProfileMap {
    profiles_by_station(profiles)
        .into_iter()
        .map(|(short_code, rows)| {
            let hours = rows
                .into_iter()
                .map(|p| HourCount {
                    hour_of_day: p.hour_of_day,
                    ride_count: p.ride_count,
                })
                .collect();
            (short_code.to_string(), hours)
        })
        .collect()
}

/// Builds the enriched report.
///
/// Stations without a ranking keep `rank` and `total_rides` empty.
/// `stations_in_neighborhood` is filled for every located station.
/// Profiles and rankings for short codes missing from `stations` are
/// ignored here.
#[must_use]
pub fn compose_report(
    stations: &[StationWithNeighborhood],
    rankings: &[StationRanking],
    profiles: &HourlyProfileMap,
    stations_per_neighborhood: &BTreeMap<String, u32>,
    metadata: ReportMetadata,
) -> Report {
    let rankings_by_code: BTreeMap<&str, &StationRanking> = rankings
        .iter()
        .map(|r| (r.short_code.as_str(), r))
        .collect();

    let mut report_stations = BTreeMap::new();
    let mut ranked = 0usize;

    for located in stations {
        let station = &located.station;
        let ranking = rankings_by_code.get(station.short_code.as_str());
        if ranking.is_some() {
            ranked += 1;
        }

        let stations_in_neighborhood = located
            .neighborhood_code()
            .and_then(|code| stations_per_neighborhood.get(code).copied());

        report_stations.insert(
            station.short_code.clone(),
            StationReport {
                station_id: station.station_id.clone(),
                short_code: station.short_code.clone(),
                name: station.name.clone(),
                geometry: StationPoint {
                    longitude: station.longitude,
                    latitude: station.latitude,
                },
                neighborhood: located.neighborhood.clone(),
                rank: ranking.map(|r| r.rank),
                total_rides: ranking.map(|r| r.total_rides),
                stations_in_neighborhood,
                hourly: profiles
                    .get(&station.short_code)
                    .cloned()
                    .unwrap_or_default(),
            },
        );
    }

    log::info!(
        "Composed report for {} stations ({ranked} ranked)",
        report_stations.len()
    );

    Report {
        metadata,
        stations: report_stations,
    }
}
