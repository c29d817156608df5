//! Writers and readers for report files.
//!
//! Reports can be written as JSON, `MessagePack` (named fields) or a
//! `GeoJSON` `FeatureCollection` of station points. JSON and
//! `MessagePack` reports can be read back losslessly; `GeoJSON` is an
//! export-only format for mapping tools.

use std::path::Path;

use bike_map_report_models::{HourlyProfileMap, Report, StationReport};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, feature::Id};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::ReportError;

/// On-disk report encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ReportFormat {
    /// Pretty-printed JSON.
    Json,
    /// `MessagePack` with named fields.
    Msgpack,
    /// `GeoJSON` `FeatureCollection` (write only).
    Geojson,
}

impl ReportFormat {
    /// Infers the format from a file extension.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::UnknownExtension`] if the extension is not
    /// one of `json`, `msgpack`, `mp` or `geojson`.
    pub fn from_path(path: &Path) -> Result<Self, ReportError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("json") => Ok(Self::Json),
            Some("msgpack" | "mp") => Ok(Self::Msgpack),
            Some("geojson") => Ok(Self::Geojson),
            _ => Err(ReportError::UnknownExtension {
                path: path.display().to_string(),
            }),
        }
    }
}

/// Encodes a report in the given format.
///
/// # Errors
///
/// Returns [`ReportError`] if serialization fails.
pub fn encode_report(report: &Report, format: ReportFormat) -> Result<Vec<u8>, ReportError> {
    match format {
        ReportFormat::Json => Ok(serde_json::to_vec_pretty(report)?),
        ReportFormat::Msgpack => Ok(rmp_serde::to_vec_named(report)?),
        ReportFormat::Geojson => Ok(serde_json::to_vec(&to_feature_collection(report)?)?),
    }
}

/// Decodes a report previously written with [`encode_report`].
///
/// # Errors
///
/// Returns [`ReportError::UnsupportedFormat`] for `GeoJSON`, or a
/// deserialization error if the bytes are not a valid report.
pub fn decode_report(bytes: &[u8], format: ReportFormat) -> Result<Report, ReportError> {
    match format {
        ReportFormat::Json => Ok(serde_json::from_slice(bytes)?),
        ReportFormat::Msgpack => Ok(rmp_serde::from_slice(bytes)?),
        ReportFormat::Geojson => Err(ReportError::UnsupportedFormat {
            format,
            operation: "read",
        }),
    }
}

/// Writes a report to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ReportError`] if encoding or file I/O fails.
pub fn write_report(path: &Path, report: &Report, format: ReportFormat) -> Result<(), ReportError> {
    let bytes = encode_report(report, format)?;
    write_bytes(path, &bytes)?;
    log::info!(
        "Wrote {} stations to {} ({format})",
        report.stations.len(),
        path.display()
    );
    Ok(())
}

/// Reads a report from `path`, inferring the format from its extension.
///
/// # Errors
///
/// Returns [`ReportError`] if the file cannot be read or decoded.
pub fn read_report(path: &Path) -> Result<Report, ReportError> {
    let format = ReportFormat::from_path(path)?;
    let bytes = std::fs::read(path)?;
    let report = decode_report(&bytes, format)?;
    log::debug!(
        "Read {} stations from {}",
        report.stations.len(),
        path.display()
    );
    Ok(report)
}

/// Writes standalone hour-of-day profiles as a JSON object keyed by
/// short code.
///
/// # Errors
///
/// Returns [`ReportError`] if encoding or file I/O fails.
pub fn write_profiles(path: &Path, profiles: &HourlyProfileMap) -> Result<(), ReportError> {
    let bytes = serde_json::to_vec(profiles)?;
    write_bytes(path, &bytes)?;
    log::info!(
        "Wrote hour-of-day profiles for {} stations to {}",
        profiles.len(),
        path.display()
    );
    Ok(())
}

fn write_bytes(path: &Path, bytes: &[u8]) -> Result<(), ReportError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Converts a report into station point features.
///
/// Feature ids are short codes; properties carry every report field
/// except the geometry.
///
/// # Errors
///
/// Returns [`ReportError::Json`] if a station cannot be converted to a
/// JSON object.
pub fn to_feature_collection(report: &Report) -> Result<FeatureCollection, ReportError> {
    let features = report
        .stations
        .values()
        .map(station_feature)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}

fn station_feature(station: &StationReport) -> Result<Feature, ReportError> {
    let mut properties: JsonObject = match serde_json::to_value(station)? {
        serde_json::Value::Object(map) => map,
        _ => JsonObject::new(),
    };
    properties.remove("geometry");

    Ok(Feature {
        bbox: None,
        geometry: Some(Geometry::new(geojson::Value::Point(vec![
            station.geometry.longitude,
            station.geometry.latitude,
        ]))),
        id: Some(Id::String(station.short_code.clone())),
        properties: Some(properties),
        foreign_members: None,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use bike_map_report_models::{HourCount, ReportMetadata, StationPoint};
    use bike_map_station_models::{NeighborhoodRef, Orientation, Statistic};

    use super::*;

    fn sample_report() -> Report {
        let station = StationReport {
            station_id: "519".to_string(),
            short_code: "6432.09".to_string(),
            name: "Pershing Square North".to_string(),
            geometry: StationPoint {
                longitude: -73.977_7,
                latitude: 40.751_9,
            },
            neighborhood: Some(NeighborhoodRef {
                code: "MN17".to_string(),
                name: "Midtown-Midtown South".to_string(),
                borough: "Manhattan".to_string(),
            }),
            rank: Some(1),
            total_rides: Some(42),
            stations_in_neighborhood: Some(31),
            hourly: vec![
                HourCount {
                    hour_of_day: 8,
                    ride_count: 3.5,
                },
                HourCount {
                    hour_of_day: 17,
                    ride_count: 0.1,
                },
            ],
        };
        Report {
            metadata: ReportMetadata {
                statistic: Statistic::Mean,
                orientation: Orientation::Start,
                total_trips: 42,
                profiled_trips: 42,
                ranked_trips: 42,
                first_trip: None,
                last_trip: None,
                neighborhood_count: 1,
            },
            stations: BTreeMap::from([(station.short_code.clone(), station)]),
        }
    }

    #[test]
    fn infers_format_from_extension() {
        assert_eq!(
            ReportFormat::from_path(Path::new("out/report.JSON")).unwrap(),
            ReportFormat::Json
        );
        assert_eq!(
            ReportFormat::from_path(Path::new("report.msgpack")).unwrap(),
            ReportFormat::Msgpack
        );
        assert_eq!(
            ReportFormat::from_path(Path::new("stations.geojson")).unwrap(),
            ReportFormat::Geojson
        );
        assert!(ReportFormat::from_path(Path::new("report.csv")).is_err());
        assert!(ReportFormat::from_path(Path::new("report")).is_err());
    }

    #[test]
    fn json_and_msgpack_read_back_identically() {
        let report = sample_report();
        for format in [ReportFormat::Json, ReportFormat::Msgpack] {
            let bytes = encode_report(&report, format).unwrap();
            let decoded = decode_report(&bytes, format).unwrap();
            assert_eq!(decoded, report, "{format} changed the report");
        }
    }

    #[test]
    fn geojson_is_write_only() {
        let bytes = encode_report(&sample_report(), ReportFormat::Geojson).unwrap();
        assert!(matches!(
            decode_report(&bytes, ReportFormat::Geojson),
            Err(ReportError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn geojson_features_carry_point_and_properties() {
        let collection = to_feature_collection(&sample_report()).unwrap();
        assert_eq!(collection.features.len(), 1);

        let feature = &collection.features[0];
        assert_eq!(feature.id, Some(Id::String("6432.09".to_string())));
        match &feature.geometry.as_ref().unwrap().value {
            geojson::Value::Point(coords) => assert_eq!(coords, &vec![-73.977_7, 40.751_9]),
            other => panic!("expected point, got {other:?}"),
        }

        let props = feature.properties.as_ref().unwrap();
        assert_eq!(props["rank"], 1);
        assert_eq!(props["neighborhood"]["code"], "MN17");
        assert!(!props.contains_key("geometry"));
    }
}
