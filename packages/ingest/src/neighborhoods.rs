//! Neighborhood boundary reader.
//!
//! Boundaries come from a `GeoJSON` `FeatureCollection` whose features
//! carry a `Polygon` or `MultiPolygon` geometry plus code, name and
//! borough properties. Property names vary between boundary releases,
//! so they are configurable through [`NeighborhoodFieldMapping`].

use std::io::Read;
use std::path::Path;

use bike_map_station_models::{MalformedInputError, Neighborhood};
use geo::MultiPolygon;
use geojson::{Feature, GeoJson};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{IngestError, open_input, required};

/// Names of the feature properties holding neighborhood identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeighborhoodFieldMapping {
    /// Property holding the neighborhood code.
    pub code: String,
    /// Property holding the display name.
    pub name: String,
    /// Property holding the borough name.
    pub borough: String,
}

impl Default for NeighborhoodFieldMapping {
    fn default() -> Self {
        Self {
            code: "ntacode".to_string(),
            name: "ntaname".to_string(),
            borough: "boro_name".to_string(),
        }
    }
}

/// Loads neighborhood boundaries from a `GeoJSON` file.
///
/// # Errors
///
/// Returns [`IngestError`] if the file cannot be read or parsed, or a
/// feature lacks a mapped property or polygon geometry.
pub fn load_neighborhoods(
    path: &Path,
    mapping: &NeighborhoodFieldMapping,
) -> Result<Vec<Neighborhood>, IngestError> {
    let neighborhoods = read_neighborhoods(open_input(path)?, mapping)?;
    log::info!(
        "Loaded {} neighborhoods from {}",
        neighborhoods.len(),
        path.display()
    );
    Ok(neighborhoods)
}

/// Reads neighborhood boundaries from `GeoJSON`.
///
/// # Errors
///
/// Returns [`IngestError::GeoJson`] for unparseable input, or
/// [`IngestError::Malformed`] for the first unusable feature.
pub fn read_neighborhoods<R: Read>(
    mut reader: R,
    mapping: &NeighborhoodFieldMapping,
) -> Result<Vec<Neighborhood>, IngestError> {
    let mut raw = String::new();
    reader.read_to_string(&mut raw)?;

    let features = match raw.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(collection) => collection.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(_) => {
            return Err(
                MalformedInputError::new("neighborhood file", "features", "is missing").into(),
            );
        }
    };

    features
        .into_iter()
        .enumerate()
        .map(|(i, feature)| {
            let record = format!("neighborhood #{}", i + 1);
            let neighborhood = to_neighborhood(&record, feature, mapping)?;
            neighborhood.validate()?;
            Ok::<_, IngestError>(neighborhood)
        })
        .collect()
}

fn to_neighborhood(
    record: &str,
    feature: Feature,
    mapping: &NeighborhoodFieldMapping,
) -> Result<Neighborhood, MalformedInputError> {
    let code = required(record, &mapping.code, property(&feature, &mapping.code))?;
    let name = required(record, &mapping.name, property(&feature, &mapping.name))?;
    let borough = required(record, &mapping.borough, property(&feature, &mapping.borough))?;

    let geometry = feature
        .geometry
        .ok_or_else(|| MalformedInputError::missing(record, "geometry"))?;
    let boundary: geo::Geometry<f64> = geometry
        .try_into()
        .map_err(|e: geojson::Error| MalformedInputError::new(record, "geometry", e.to_string()))?;

    let boundary = match boundary {
        geo::Geometry::MultiPolygon(mp) => mp,
        geo::Geometry::Polygon(p) => MultiPolygon(vec![p]),
        _ => {
            return Err(MalformedInputError::new(
                record,
                "geometry",
                "is not a polygon or multipolygon",
            ));
        }
    };

    Ok(Neighborhood {
        code,
        name,
        borough,
        boundary,
    })
}

fn property(feature: &Feature, key: &str) -> Option<String> {
    match feature.property(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
