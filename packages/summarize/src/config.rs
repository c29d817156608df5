//! Run configuration for the summarization pipeline.
//!
//! Every choice that changes the output of a run lives in
//! [`SummarizeConfig`], which is passed explicitly to each stage.

use bike_map_station_models::{Orientation, RiderType, Statistic, TripRecord};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::SummarizeError;

/// Inclusive calendar-date window applied to the oriented trip timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripWindow {
    /// First date included.
    pub start: NaiveDate,
    /// Last date included.
    pub end: NaiveDate,
}

impl TripWindow {
    /// Whether `date` falls inside the window.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Options for a single summarization run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct SummarizeConfig {
    /// Which end of each trip is profiled.
    pub orientation: Orientation,
    /// How hourly buckets are collapsed across dates.
    pub statistic: Statistic,
    /// Profile trips whose station is missing from the directory, keyed
    /// by the trip's own short code. Such trips are never ranked.
    pub profile_unknown_stations: bool,
    /// Rank located stations that have no trips, with zero rides.
    pub zero_fill_rankings: bool,
    /// Restrict the run to trips inside this date window. Profiles test
    /// the oriented timestamp; rankings always test the start time, since
    /// they count rides by start station.
    pub window: Option<TripWindow>,
    /// Restrict the run to one rider category.
    pub rider_type: Option<RiderType>,
}

impl Default for SummarizeConfig {
    fn default() -> Self {
        Self {
            orientation: Orientation::Start,
            statistic: Statistic::Sum,
            profile_unknown_stations: true,
            zero_fill_rankings: false,
            window: None,
            rider_type: None,
        }
    }
}

impl SummarizeConfig {
    /// Checks the configuration for contradictions.
    ///
    /// # Errors
    ///
    /// Returns [`SummarizeError::InvalidWindow`] if the window ends before
    /// it starts.
    pub fn validate(&self) -> Result<(), SummarizeError> {
        if let Some(window) = self.window
            && window.end < window.start
        {
            return Err(SummarizeError::InvalidWindow {
                start: window.start,
                end: window.end,
            });
        }
        Ok(())
    }

    /// Whether a trip passes the window and rider filters, judged on
    /// the configured orientation's timestamp.
    #[must_use]
    pub fn accepts(&self, trip: &TripRecord) -> bool {
        self.accepts_at(trip, self.orientation)
    }

    /// Whether a trip passes the window and rider filters, judged on the
    /// timestamp at the given end of the trip.
    #[must_use]
    pub fn accepts_at(&self, trip: &TripRecord, orientation: Orientation) -> bool {
        if let Some(window) = self.window
            && !window.contains(trip.time(orientation).date())
        {
            return false;
        }
        match self.rider_type {
            Some(wanted) => trip.rider_type == Some(wanted),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trip(day: u32, rider_type: Option<RiderType>) -> TripRecord {
        let date = NaiveDate::from_ymd_opt(2022, 5, day).unwrap();
        TripRecord {
            ride_id: format!("r{day}"),
            start_time: date.and_hms_opt(23, 50, 0).unwrap(),
            stop_time: date.succ_opt().unwrap().and_hms_opt(0, 10, 0).unwrap(),
            start_short_code: "A".to_string(),
            stop_short_code: "B".to_string(),
            rider_type,
        }
    }

    fn window(start: u32, end: u32) -> TripWindow {
        TripWindow {
            start: NaiveDate::from_ymd_opt(2022, 5, start).unwrap(),
            end: NaiveDate::from_ymd_opt(2022, 5, end).unwrap(),
        }
    }

    #[test]
    fn defaults_profile_unknown_stations() {
        let config = SummarizeConfig::default();
        assert!(config.profile_unknown_stations);
        assert!(!config.zero_fill_rankings);
        assert_eq!(config.statistic, Statistic::Sum);
    }

    #[test]
    fn parses_partial_toml() {
        let config: SummarizeConfig = toml::from_str(
            r#"
            statistic = "mean"
            orientation = "stop"
            rider_type = "member"

            [window]
            start = "2022-05-01"
            end = "2022-05-31"
            "#,
        )
        .unwrap();

        assert_eq!(config.statistic, Statistic::Mean);
        assert_eq!(config.orientation, Orientation::Stop);
        assert_eq!(config.rider_type, Some(RiderType::Member));
        assert_eq!(config.window, Some(window(1, 31)));
        assert!(config.profile_unknown_stations, "unset fields keep defaults");
    }

    #[test]
    fn rejects_inverted_window() {
        let config = SummarizeConfig {
            window: Some(window(10, 2)),
            ..SummarizeConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SummarizeError::InvalidWindow { .. })
        ));
    }

    #[test]
    fn window_uses_oriented_timestamp() {
        let t = trip(4, None);
        let start_config = SummarizeConfig {
            window: Some(window(4, 4)),
            ..SummarizeConfig::default()
        };
        let stop_config = SummarizeConfig {
            orientation: Orientation::Stop,
            ..start_config.clone()
        };
        assert!(start_config.accepts(&t));
        assert!(!stop_config.accepts(&t), "trip docks on the 5th");
    }

    #[test]
    fn accepts_at_ignores_configured_orientation() {
        let t = trip(4, None);
        let config = SummarizeConfig {
            orientation: Orientation::Stop,
            window: Some(window(4, 4)),
            ..SummarizeConfig::default()
        };
        assert!(config.accepts_at(&t, Orientation::Start));
        assert!(!config.accepts_at(&t, Orientation::Stop));
    }

    #[test]
    fn rider_filter_excludes_untyped_trips() {
        let config = SummarizeConfig {
            rider_type: Some(RiderType::Casual),
            ..SummarizeConfig::default()
        };
        assert!(config.accepts(&trip(1, Some(RiderType::Casual))));
        assert!(!config.accepts(&trip(1, Some(RiderType::Member))));
        assert!(!config.accepts(&trip(1, None)));
    }
}
