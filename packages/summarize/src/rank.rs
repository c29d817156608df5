//! Dense popularity ranking of stations within each neighborhood.
//!
//! Trips are attributed to the neighborhood of their start station. A
//! trip whose start station is unknown, or sits outside every
//! neighborhood, cannot be ranked and is dropped here.

use std::collections::BTreeMap;

use bike_map_station_models::{StationRanking, StationWithNeighborhood, TripRecord};

/// Rankings plus how many trips fed them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RankingOutcome {
    /// One row per ranked station, ordered by neighborhood code, rank,
    /// then short code.
    pub rankings: Vec<StationRanking>,
    /// Trips attributed to a neighborhood.
    pub ranked_trips: u64,
    /// Trips whose start station has no neighborhood.
    pub dropped_trips: u64,
}

/// Ranks stations by total rides within their neighborhood.
///
/// With `zero_fill`, located stations with no trips are ranked too and
/// share the bottom rank.
#[must_use]
pub fn rank_stations<'a>(
    trips: impl IntoIterator<Item = &'a TripRecord>,
    stations: &[StationWithNeighborhood],
    stations_per_neighborhood: &BTreeMap<String, u32>,
    zero_fill: bool,
) -> RankingOutcome {
    let neighborhood_of: BTreeMap<&str, &str> = stations
        .iter()
        .filter_map(|s| Some((s.short_code(), s.neighborhood_code()?)))
        .collect();

    let mut totals: BTreeMap<&str, BTreeMap<&str, u64>> = BTreeMap::new();
    let mut ranked_trips = 0u64;
    let mut dropped_trips = 0u64;

    for trip in trips {
        let short_code = trip.start_short_code.as_str();
        let Some(&neighborhood) = neighborhood_of.get(short_code) else {
            dropped_trips += 1;
            continue;
        };
        ranked_trips += 1;
        *totals
            .entry(neighborhood)
            .or_default()
            .entry(short_code)
            .or_default() += 1;
    }

    if zero_fill {
        for (&short_code, &neighborhood) in &neighborhood_of {
            totals
                .entry(neighborhood)
                .or_default()
                .entry(short_code)
                .or_default();
        }
    }

    if dropped_trips > 0 {
        log::warn!("{dropped_trips} trips start outside every known neighborhood; not ranked");
    }

    let mut rankings = Vec::new();
    for (neighborhood, station_totals) in totals {
        let mut ordered: Vec<(&str, u64)> = station_totals.into_iter().collect();
        ordered.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        let stations_in_neighborhood = stations_per_neighborhood
            .get(neighborhood)
            .copied()
            .unwrap_or(0);

        for ((short_code, total_rides), rank) in ordered.iter().zip(dense_ranks(&ordered)) {
            rankings.push(StationRanking {
                short_code: (*short_code).to_string(),
                neighborhood_code: neighborhood.to_string(),
                rank,
                total_rides: *total_rides,
                stations_in_neighborhood,
            });
        }
    }

    log::info!(
        "Ranked {} stations from {ranked_trips} trips",
        rankings.len()
    );

    RankingOutcome {
        rankings,
        ranked_trips,
        dropped_trips,
    }
}

/// Dense ranks for totals already sorted in descending order.
///
/// Equal totals share a rank; the next lower total gets the next rank.
fn dense_ranks(ordered: &[(&str, u64)]) -> Vec<u32> {
    let mut ranks = Vec::with_capacity(ordered.len());
    let mut rank = 0u32;
    let mut previous: Option<u64> = None;

    for &(_, total) in ordered {
        if previous != Some(total) {
            rank += 1;
            previous = Some(total);
        }
        ranks.push(rank);
    }

    ranks
}
