#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! In-memory spatial index for neighborhood attribution.
//!
//! Builds an R-tree over neighborhood polygons and assigns each station
//! to the polygon that contains its position. The join is a left join:
//! every station comes back, with `neighborhood: None` when nothing
//! matched.

use bike_map_station_models::{Neighborhood, Station, StationWithNeighborhood};
use geo::{Area as _, BoundingRect as _, Intersects as _, MultiPolygon};
use rstar::{AABB, RTree, RTreeObject};

/// A neighborhood polygon stored in the R-tree.
struct BoundaryEntry<'a> {
    neighborhood: &'a Neighborhood,
    area: f64,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for BoundaryEntry<'_> {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// R-tree over a borrowed neighborhood set.
pub struct NeighborhoodIndex<'a> {
    tree: RTree<BoundaryEntry<'a>>,
}

impl<'a> NeighborhoodIndex<'a> {
    /// Bulk-loads the neighborhoods into an R-tree.
    #[must_use]
    pub fn new(neighborhoods: &'a [Neighborhood]) -> Self {
        let entries = neighborhoods
            .iter()
            .map(|neighborhood| BoundaryEntry {
                neighborhood,
                area: neighborhood.boundary.unsigned_area(),
                envelope: compute_envelope(&neighborhood.boundary),
            })
            .collect();

        let tree = RTree::bulk_load(entries);
        log::debug!("Loaded {} neighborhoods into spatial index", tree.size());

        Self { tree }
    }

    /// Number of indexed neighborhoods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Whether the index holds no neighborhoods.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Looks up the neighborhood containing a point.
    ///
    /// Points on a boundary edge count as inside. Neighborhood polygons
    /// should not overlap, but when several match the smallest area wins
    /// and equal areas fall back to the lowest neighborhood code.
    #[must_use]
    pub fn lookup(&self, lng: f64, lat: f64) -> Option<&'a Neighborhood> {
        let point = geo::Point::new(lng, lat);
        let query_env = AABB::from_point([lng, lat]);

        let mut best: Option<&BoundaryEntry<'a>> = None;

        for entry in self.tree.locate_in_envelope_intersecting(&query_env) {
            if !entry.neighborhood.boundary.intersects(&point) {
                continue;
            }
            match best {
                None => best = Some(entry),
                Some(current) if is_preferred(entry, current) => best = Some(entry),
                _ => {}
            }
        }

        best.map(|e| e.neighborhood)
    }
}

/// Whether `candidate` should replace `current` as the match for a point.
fn is_preferred(candidate: &BoundaryEntry<'_>, current: &BoundaryEntry<'_>) -> bool {
    match candidate.area.total_cmp(&current.area) {
        std::cmp::Ordering::Less => true,
        std::cmp::Ordering::Greater => false,
        std::cmp::Ordering::Equal => candidate.neighborhood.code < current.neighborhood.code,
    }
}

/// Assigns every station to at most one neighborhood.
///
/// Output order and cardinality match `stations`.
#[must_use]
pub fn join_stations(
    stations: &[Station],
    neighborhoods: &[Neighborhood],
) -> Vec<StationWithNeighborhood> {
    let index = NeighborhoodIndex::new(neighborhoods);

    let joined: Vec<StationWithNeighborhood> = stations
        .iter()
        .map(|station| StationWithNeighborhood {
            station: station.clone(),
            neighborhood: index
                .lookup(station.longitude, station.latitude)
                .map(Neighborhood::to_ref),
        })
        .collect();

    let unmatched = joined.iter().filter(|s| s.neighborhood.is_none()).count();
    log::info!(
        "Joined {} stations onto {} neighborhoods ({unmatched} outside every neighborhood)",
        joined.len(),
        index.len(),
    );

    joined
}

/// Compute the bounding box envelope for a [`MultiPolygon`].
fn compute_envelope(mp: &MultiPolygon<f64>) -> AABB<[f64; 2]> {
    mp.bounding_rect().map_or_else(
        || AABB::from_point([0.0, 0.0]),
        |rect| AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
    )
}
