//! Single-pass batch run from validated inputs to the enriched report.
//!
//! Stages run strictly in order (validate, filter, spatial join, count,
//! profile, rank, compose) over data held entirely in memory. Memory use
//! grows with the number of trips; there is no streaming mode.

use std::collections::BTreeSet;

use bike_map_report_models::{HourlyProfileMap, Report, ReportMetadata};
use bike_map_station_models::{Neighborhood, Orientation, Station, TripRecord};
use bike_map_summarize::{
    SummarizeConfig, counter::stations_per_neighborhood, hourly::hourly_profiles,
    rank::rank_stations, validate_inputs,
};

use crate::ReportError;
use crate::compose::{compose_report, profile_map};

/// Everything a run reads.
#[derive(Debug, Clone, Copy)]
pub struct Inputs<'a> {
    /// Station directory.
    pub stations: &'a [Station],
    /// Neighborhood boundary set.
    pub neighborhoods: &'a [Neighborhood],
    /// Trip records.
    pub trips: &'a [TripRecord],
}

/// Everything a run produces.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutput {
    /// Enriched per-station report.
    pub report: Report,
    /// Hour-of-day profiles for every profiled short code, including
    /// short codes missing from the station directory.
    pub profiles: HourlyProfileMap,
}

/// Runs the full pipeline.
///
/// # Errors
///
/// Returns [`ReportError::Summarize`] if the configuration or any input
/// record is invalid. Nothing is computed in that case.
pub fn run(inputs: Inputs<'_>, config: &SummarizeConfig) -> Result<RunOutput, ReportError> {
    config.validate()?;
    validate_inputs(inputs.stations, inputs.neighborhoods, inputs.trips)?;

    let accepted: Vec<&TripRecord> = inputs.trips.iter().filter(|t| config.accepts(t)).collect();
    log::info!(
        "{} of {} trips pass the run filters",
        accepted.len(),
        inputs.trips.len()
    );

    let located = bike_map_spatial::join_stations(inputs.stations, inputs.neighborhoods);
    let counts = stations_per_neighborhood(&located);

    let known: BTreeSet<&str> = inputs
        .stations
        .iter()
        .map(|s| s.short_code.as_str())
        .collect();
    let profiled: Vec<&TripRecord> = accepted
        .iter()
        .copied()
        .filter(|t| {
            config.profile_unknown_stations || known.contains(t.short_code(config.orientation))
        })
        .collect();
    let unknown = profiled
        .iter()
        .filter(|t| !known.contains(t.short_code(config.orientation)))
        .count();
    if unknown > 0 {
        log::warn!("{unknown} profiled trips reference stations missing from the directory");
    }

    let profiles = profile_map(&hourly_profiles(
        profiled.iter().copied(),
        config.orientation,
        config.statistic,
    ));

    let outcome = rank_stations(
        inputs
            .trips
            .iter()
            .filter(|t| config.accepts_at(t, Orientation::Start)),
        &located,
        &counts,
        config.zero_fill_rankings,
    );

    let metadata = ReportMetadata {
        statistic: config.statistic,
        orientation: config.orientation,
        total_trips: inputs.trips.len() as u64,
        profiled_trips: profiled.len() as u64,
        ranked_trips: outcome.ranked_trips,
        first_trip: accepted.iter().map(|t| t.time(config.orientation)).min(),
        last_trip: accepted.iter().map(|t| t.time(config.orientation)).max(),
        neighborhood_count: u32::try_from(counts.len()).unwrap_or(u32::MAX),
    };

    let report = compose_report(&located, &outcome.rankings, &profiles, &counts, metadata);

    Ok(RunOutput { report, profiles })
}

/// Builds only the hour-of-day profiles, without station or neighborhood
/// data. Every trip is profiled at face value.
///
/// # Errors
///
/// Returns [`ReportError::Summarize`] if the configuration or a trip is
/// invalid.
pub fn profiles_only(
    trips: &[TripRecord],
    config: &SummarizeConfig,
) -> Result<HourlyProfileMap, ReportError> {
    config.validate()?;
    validate_inputs(&[], &[], trips)?;

    let profiles = hourly_profiles(
        trips.iter().filter(|t| config.accepts(t)),
        config.orientation,
        config.statistic,
    );
    Ok(profile_map(&profiles))
}
