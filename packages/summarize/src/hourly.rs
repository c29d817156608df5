//! Hour-of-day ride profiles.
//!
//! Profiles are built in two stages. Trips are first bucketed into
//! one-hour calendar windows per station. Those buckets are then
//! collapsed across dates into at most 24 hour-of-day rows per station,
//! either summed or averaged over every window in the station's observed
//! span (windows without trips count as zero for the average).

use std::collections::BTreeMap;

use bike_map_station_models::{HourlyProfile, Orientation, Statistic, TripRecord};
use chrono::{Datelike as _, NaiveDate, Timelike as _};

const HOURS_PER_DAY: i64 = 24;

/// A one-hour calendar window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HourWindow {
    /// Calendar date.
    pub date: NaiveDate,
    /// Hour of day, 0-23.
    pub hour: u8,
}

impl HourWindow {
    /// Position of this window on a continuous hourly timeline.
    fn ordinal(self) -> i64 {
        i64::from(self.date.num_days_from_ce()) * HOURS_PER_DAY + i64::from(self.hour)
    }
}

/// Trip counts per station per calendar hour.
pub type HourBuckets<'a> = BTreeMap<&'a str, BTreeMap<HourWindow, u64>>;

/// Stage one: counts trips per station in each calendar hour.
#[must_use]
pub fn bucket_by_hour<'a>(
    trips: impl IntoIterator<Item = &'a TripRecord>,
    orientation: Orientation,
) -> HourBuckets<'a> {
    let mut buckets: HourBuckets<'a> = BTreeMap::new();

    for trip in trips {
        let time = trip.time(orientation);
        #[allow(clippy::cast_possible_truncation)]
        let window = HourWindow {
            date: time.date(),
            hour: time.hour() as u8,
        };
        *buckets
            .entry(trip.short_code(orientation))
            .or_default()
            .entry(window)
            .or_default() += 1;
    }

    buckets
}

/// Stage two: collapses calendar-hour buckets into hour-of-day rows.
///
/// Rows are ordered by short code, then hour. Hours whose aggregated
/// value is zero are omitted.
#[must_use]
pub fn collapse_by_hour_of_day(
    buckets: &HourBuckets<'_>,
    statistic: Statistic,
) -> Vec<HourlyProfile> {
    let mut profiles = Vec::new();

    for (&short_code, windows) in buckets {
        let (Some((first, _)), Some((last, _))) =
            (windows.first_key_value(), windows.last_key_value())
        else {
            continue;
        };

        let mut sums = [0u64; 24];
        for (window, count) in windows {
            sums[usize::from(window.hour)] += count;
        }

        let span = last.ordinal() - first.ordinal() + 1;

        for (hour, &sum) in (0u8..24).zip(sums.iter()) {
            #[allow(clippy::cast_precision_loss)]
            let ride_count = match statistic {
                Statistic::Sum => sum as f64,
                Statistic::Mean => {
                    let windows = windows_in_span(first.hour, span, hour);
                    round_one_decimal(sum as f64 / windows as f64)
                }
            };
            // A sparse mean can round down to zero.
            if ride_count <= 0.0 {
                continue;
            }
            profiles.push(HourlyProfile {
                short_code: short_code.to_string(),
                hour_of_day: hour,
                ride_count,
            });
        }
    }

    profiles
}

/// Builds hour-of-day profiles for every station seen in `trips`.
#[must_use]
pub fn hourly_profiles<'a>(
    trips: impl IntoIterator<Item = &'a TripRecord>,
    orientation: Orientation,
    statistic: Statistic,
) -> Vec<HourlyProfile> {
    let buckets = bucket_by_hour(trips, orientation);
    let profiles = collapse_by_hour_of_day(&buckets, statistic);
    log::info!(
        "Built {} hour-of-day rows for {} stations ({orientation}, {statistic})",
        profiles.len(),
        buckets.len(),
    );
    profiles
}

/// Groups profile rows by short code, keeping hour order.
#[must_use]
pub fn profiles_by_station(profiles: &[HourlyProfile]) -> BTreeMap<&str, Vec<&HourlyProfile>> {
    let mut grouped: BTreeMap<&str, Vec<&HourlyProfile>> = BTreeMap::new();
    for profile in profiles {
        grouped
            .entry(profile.short_code.as_str())
            .or_default()
            .push(profile);
    }
    for rows in grouped.values_mut() {
        rows.sort_by_key(|p| p.hour_of_day);
    }
    grouped
}

/// Number of windows with hour-of-day `hour` in a run of `span`
/// consecutive hourly windows starting at hour-of-day `first_hour`.
fn windows_in_span(first_hour: u8, span: i64, hour: u8) -> i64 {
    let offset = (i64::from(hour) - i64::from(first_hour)).rem_euclid(HOURS_PER_DAY);
    span / HOURS_PER_DAY + i64::from(offset < span % HOURS_PER_DAY)
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
