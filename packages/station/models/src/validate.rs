//! Validation of raw input records.
//!
//! Every input record is checked before any aggregation starts so a run
//! either sees fully valid inputs or fails with a [`MalformedInputError`]
//! naming the first bad record.

use thiserror::Error;

use crate::{Neighborhood, Station, TripRecord};

/// A required field of an input record is missing or unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Malformed {record}: field `{field}` {reason}")]
pub struct MalformedInputError {
    /// Which record failed (kind plus identifier or row number).
    pub record: String,
    /// Name of the offending field.
    pub field: String,
    /// What is wrong with the field.
    pub reason: String,
}

impl MalformedInputError {
    /// Creates an error for `field` of `record`.
    #[must_use]
    pub fn new(
        record: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            record: record.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates an error for a required field that is absent or empty.
    #[must_use]
    pub fn missing(record: impl Into<String>, field: impl Into<String>) -> Self {
        Self::new(record, field, "is missing")
    }
}

fn require_text(record: &str, field: &str, value: &str) -> Result<(), MalformedInputError> {
    if value.trim().is_empty() {
        return Err(MalformedInputError::missing(record, field));
    }
    Ok(())
}

impl Station {
    fn record_label(&self) -> String {
        if self.short_code.trim().is_empty() {
            format!("station (id {})", self.station_id)
        } else {
            format!("station '{}'", self.short_code)
        }
    }

    /// Checks that the station has an id, short code, name and a usable
    /// WGS84 position.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedInputError`] for the first field that fails.
    pub fn validate(&self) -> Result<(), MalformedInputError> {
        let record = self.record_label();
        require_text(&record, "station_id", &self.station_id)?;
        require_text(&record, "short_code", &self.short_code)?;
        require_text(&record, "name", &self.name)?;

        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(MalformedInputError::new(
                record,
                "longitude",
                format!("is out of range: {}", self.longitude),
            ));
        }
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(MalformedInputError::new(
                record,
                "latitude",
                format!("is out of range: {}", self.latitude),
            ));
        }
        Ok(())
    }
}

impl Neighborhood {
    /// Checks that the neighborhood has identity fields and at least one
    /// polygon.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedInputError`] for the first field that fails.
    pub fn validate(&self) -> Result<(), MalformedInputError> {
        let record = format!("neighborhood '{}'", self.code);
        require_text(&record, "neighborhood_code", &self.code)?;
        require_text(&record, "neighborhood_name", &self.name)?;
        require_text(&record, "borough_name", &self.borough)?;

        if self.boundary.0.is_empty() {
            return Err(MalformedInputError::new(record, "polygon", "is empty"));
        }
        Ok(())
    }
}

impl TripRecord {
    /// Checks that the trip has a ride id and both station short codes.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedInputError`] for the first field that fails.
    pub fn validate(&self) -> Result<(), MalformedInputError> {
        let record = format!("trip '{}'", self.ride_id);
        require_text(&record, "ride_id", &self.ride_id)?;
        require_text(&record, "start_short_code", &self.start_short_code)?;
        require_text(&record, "stop_short_code", &self.stop_short_code)?;
        Ok(())
    }
}
