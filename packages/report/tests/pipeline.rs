use std::collections::BTreeMap;

use bike_map_report::ReportError;
use bike_map_report::export::{ReportFormat, decode_report, encode_report, write_profiles};
use bike_map_report::pipeline::{Inputs, profiles_only, run};
use bike_map_station_models::{
    Neighborhood, Orientation, RiderType, Station, Statistic, TripRecord,
};
use bike_map_summarize::{SummarizeConfig, SummarizeError, TripWindow};
use chrono::{NaiveDate, NaiveDateTime};
use geo::{MultiPolygon, polygon};

fn square(code: &str, min_x: f64, min_y: f64) -> Neighborhood {
    Neighborhood {
        code: code.to_string(),
        name: format!("{code} name"),
        borough: "Manhattan".to_string(),
        boundary: MultiPolygon(vec![polygon![
            (x: min_x, y: min_y),
            (x: min_x + 1.0, y: min_y),
            (x: min_x + 1.0, y: min_y + 1.0),
            (x: min_x, y: min_y + 1.0),
            (x: min_x, y: min_y),
        ]]),
    }
}

fn station(code: &str, lng: f64, lat: f64) -> Station {
    Station {
        station_id: format!("id-{code}"),
        short_code: code.to_string(),
        name: format!("Station {code}"),
        longitude: lng,
        latitude: lat,
    }
}

fn at(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2022, 9, day)
        .unwrap()
        .and_hms_opt(hour, 10, 0)
        .unwrap()
}

fn trip(code: &str, start: NaiveDateTime) -> TripRecord {
    TripRecord {
        ride_id: format!("{code}-{start}"),
        start_time: start,
        stop_time: start + chrono::TimeDelta::minutes(15),
        start_short_code: code.to_string(),
        stop_short_code: "A".to_string(),
        rider_type: Some(RiderType::Member),
    }
}

fn repeated(code: &str, count: u32) -> Vec<TripRecord> {
    (0..count)
        .map(|i| {
            let mut t = trip(code, at(1 + i % 3, 7 + i % 5));
            t.ride_id = format!("{code}-{i}");
            t
        })
        .collect()
}

struct Fixture {
    stations: Vec<Station>,
    neighborhoods: Vec<Neighborhood>,
    trips: Vec<TripRecord>,
}

impl Fixture {
    /// A, B, C in N1 with 10/10/5 rides; D in N2 with no rides; Z outside
    /// every neighborhood with 2 rides; 3 rides from a station missing
    /// from the directory.
    fn new() -> Self {
        let stations = vec![
            station("A", 0.2, 0.2),
            station("B", 0.5, 0.5),
            station("C", 0.8, 0.8),
            station("D", 2.5, 0.5),
            station("Z", 9.0, 9.0),
        ];
        let neighborhoods = vec![square("N1", 0.0, 0.0), square("N2", 2.0, 0.0)];

        let mut trips = repeated("A", 10);
        trips.extend(repeated("B", 10));
        trips.extend(repeated("C", 5));
        trips.extend(repeated("Z", 2));
        trips.extend(repeated("GHOST", 3));

        Self {
            stations,
            neighborhoods,
            trips,
        }
    }

    fn inputs(&self) -> Inputs<'_> {
        Inputs {
            stations: &self.stations,
            neighborhoods: &self.neighborhoods,
            trips: &self.trips,
        }
    }
}

#[test]
fn ranks_ties_densely_within_neighborhood() {
    let fixture = Fixture::new();
    let output = run(fixture.inputs(), &SummarizeConfig::default()).unwrap();
    let stations = &output.report.stations;

    assert_eq!(stations["A"].rank, Some(1));
    assert_eq!(stations["B"].rank, Some(1));
    assert_eq!(stations["C"].rank, Some(2));
    assert_eq!(stations["A"].total_rides, Some(10));
    for code in ["A", "B", "C"] {
        assert_eq!(stations[code].stations_in_neighborhood, Some(3));
    }
}

#[test]
fn idle_located_station_keeps_geometry_without_rank() {
    let fixture = Fixture::new();
    let output = run(fixture.inputs(), &SummarizeConfig::default()).unwrap();
    let d = &output.report.stations["D"];

    assert_eq!(d.neighborhood.as_ref().map(|n| n.code.as_str()), Some("N2"));
    assert!((d.geometry.longitude - 2.5).abs() < f64::EPSILON);
    assert_eq!(d.rank, None);
    assert_eq!(d.total_rides, None);
    assert!(d.hourly.is_empty());
}

#[test]
fn unlocated_station_is_reported_but_never_ranked() {
    let fixture = Fixture::new();
    let output = run(fixture.inputs(), &SummarizeConfig::default()).unwrap();
    let z = &output.report.stations["Z"];

    assert!(z.neighborhood.is_none());
    assert_eq!(z.rank, None);
    assert!(!z.hourly.is_empty(), "unlocated stations are still profiled");
}

#[test]
fn report_covers_every_directory_station() {
    let fixture = Fixture::new();
    let output = run(fixture.inputs(), &SummarizeConfig::default()).unwrap();

    assert_eq!(output.report.stations.len(), fixture.stations.len());
    assert!(!output.report.stations.contains_key("GHOST"));
    assert_eq!(output.report.metadata.total_trips, 30);
    assert_eq!(output.report.metadata.ranked_trips, 25);
    assert_eq!(output.report.metadata.neighborhood_count, 2);
}

#[test]
fn unknown_station_trips_are_profiled_by_default() {
    let fixture = Fixture::new();
    let output = run(fixture.inputs(), &SummarizeConfig::default()).unwrap();

    let ghost_total: f64 = output.profiles["GHOST"].iter().map(|h| h.ride_count).sum();
    assert!((ghost_total - 3.0).abs() < f64::EPSILON);
    assert_eq!(output.report.metadata.profiled_trips, 30);
}

#[test]
fn unknown_station_trips_can_be_excluded_from_profiles() {
    let fixture = Fixture::new();
    let config = SummarizeConfig {
        profile_unknown_stations: false,
        ..SummarizeConfig::default()
    };
    let output = run(fixture.inputs(), &config).unwrap();

    assert!(!output.profiles.contains_key("GHOST"));
    assert_eq!(output.report.metadata.profiled_trips, 27);
}

#[test]
fn summed_profiles_match_start_counts() {
    let fixture = Fixture::new();
    let output = run(fixture.inputs(), &SummarizeConfig::default()).unwrap();

    let mut expected: BTreeMap<&str, u32> = BTreeMap::new();
    for trip in &fixture.trips {
        *expected.entry(trip.start_short_code.as_str()).or_default() += 1;
    }
    for (code, count) in expected {
        let total: f64 = output.profiles[code].iter().map(|h| h.ride_count).sum();
        assert!(
            (total - f64::from(count)).abs() < f64::EPSILON,
            "{code}: profile sums to {total}, expected {count}"
        );
    }
}

#[test]
fn zero_fill_ranks_idle_station() {
    let fixture = Fixture::new();
    let config = SummarizeConfig {
        zero_fill_rankings: true,
        ..SummarizeConfig::default()
    };
    let output = run(fixture.inputs(), &config).unwrap();
    let d = &output.report.stations["D"];

    assert_eq!(d.rank, Some(1), "only station in N2");
    assert_eq!(d.total_rides, Some(0));
}

#[test]
fn empty_neighborhood_set_yields_no_rankings() {
    let fixture = Fixture::new();
    let inputs = Inputs {
        neighborhoods: &[],
        ..fixture.inputs()
    };
    let output = run(inputs, &SummarizeConfig::default()).unwrap();

    assert!(output
        .report
        .stations
        .values()
        .all(|s| s.neighborhood.is_none() && s.rank.is_none()));
    assert_eq!(output.report.metadata.ranked_trips, 0);
}

#[test]
fn window_filters_trips_before_aggregation() {
    let fixture = Fixture::new();
    let day = NaiveDate::from_ymd_opt(2022, 9, 1).unwrap();
    let config = SummarizeConfig {
        window: Some(TripWindow {
            start: day,
            end: day,
        }),
        ..SummarizeConfig::default()
    };
    let output = run(fixture.inputs(), &config).unwrap();

    let first = output.report.metadata.first_trip.unwrap();
    let last = output.report.metadata.last_trip.unwrap();
    assert_eq!(first.date(), day);
    assert_eq!(last.date(), day);
    assert!(output.report.metadata.ranked_trips < 25);
}

#[test]
fn malformed_trip_fails_the_whole_run() {
    let mut fixture = Fixture::new();
    fixture.trips[4].start_short_code = String::new();

    let err = run(fixture.inputs(), &SummarizeConfig::default()).unwrap_err();
    match err {
        ReportError::Summarize(SummarizeError::Malformed(e)) => {
            assert_eq!(e.field, "start_short_code");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn mean_profiles_only() {
    let trips = vec![
        trip("A", at(1, 8)),
        trip("A", at(1, 8)),
        trip("A", at(2, 8)),
        trip("A", at(2, 17)),
    ];
    let config = SummarizeConfig {
        statistic: Statistic::Mean,
        ..SummarizeConfig::default()
    };
    let profiles = profiles_only(&trips, &config).unwrap();

    let hours: Vec<(u8, f64)> = profiles["A"]
        .iter()
        .map(|h| (h.hour_of_day, h.ride_count))
        .collect();
    // Span is day 1 08:00 .. day 2 17:00: two 08:00 and two 17:00 windows.
    assert_eq!(hours, vec![(8, 1.5), (17, 0.5)]);
}

#[test]
fn report_survives_export_round_trip() {
    let fixture = Fixture::new();
    let config = SummarizeConfig {
        statistic: Statistic::Mean,
        ..SummarizeConfig::default()
    };
    let report = run(fixture.inputs(), &config).unwrap().report;

    for format in [ReportFormat::Json, ReportFormat::Msgpack] {
        let decoded = decode_report(&encode_report(&report, format).unwrap(), format).unwrap();
        assert_eq!(decoded.stations.len(), report.stations.len());
        assert_eq!(decoded, report, "{format} round trip changed the report");
    }
}

#[test]
fn rankings_window_on_start_date_when_profiling_stops() {
    let fixture = Fixture::new();
    let day = NaiveDate::from_ymd_opt(2022, 9, 1).unwrap();
    let late = day.and_hms_opt(23, 50, 0).unwrap();
    let mut overnight = trip("A", late);
    overnight.ride_id = "overnight".to_string();
    overnight.stop_short_code = "B".to_string();

    let inputs = Inputs {
        trips: std::slice::from_ref(&overnight),
        ..fixture.inputs()
    };
    let config = SummarizeConfig {
        orientation: Orientation::Stop,
        window: Some(TripWindow {
            start: day,
            end: day,
        }),
        ..SummarizeConfig::default()
    };
    let output = run(inputs, &config).unwrap();

    // Docks on the 2nd, so it is outside the profile window.
    assert!(output.profiles.is_empty());
    // Starts on the 1st, so it still counts for A's ranking.
    assert_eq!(output.report.stations["A"].rank, Some(1));
    assert_eq!(output.report.stations["A"].total_rides, Some(1));
    assert_eq!(output.report.metadata.ranked_trips, 1);
}

#[test]
fn standalone_profiles_file_includes_unknown_stations() {
    let fixture = Fixture::new();
    let output = run(fixture.inputs(), &SummarizeConfig::default()).unwrap();

    let dir = std::env::temp_dir().join(format!("bike_map_profiles_{}", std::process::id()));
    let path = dir.join("aggs_by_hour.json");
    write_profiles(&path, &output.profiles).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    let written: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    std::fs::remove_dir_all(&dir).unwrap();

    let map = written.as_object().expect("profiles are keyed by short code");
    for code in ["A", "B", "C", "Z", "GHOST"] {
        assert!(map.contains_key(code), "{code} missing from profiles file");
    }
    assert!(!map.contains_key("D"), "idle stations have no profile");

    let ghost = map["GHOST"].as_array().unwrap();
    let total: f64 = ghost.iter().map(|h| h["rideCount"].as_f64().unwrap()).sum();
    assert!((total - 3.0).abs() < f64::EPSILON);
    for hour in ghost {
        let hour_of_day = hour["hourOfDay"].as_u64().unwrap();
        assert!(hour_of_day < 24);
        assert_eq!(hour.as_object().unwrap().len(), 2);
    }
}
