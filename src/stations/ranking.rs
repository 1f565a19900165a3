//! Orders stations by great-circle distance to a query location.
//!
//! Distances are haversine distances in kilometers. Plain degree differences would favour
//! east-west neighbours more and more the further a query is from the equator.

use crate::types::station::{LatLon, RankedStation, StationRecord};
use haversine::{distance, Location as HaversineLocation, Units};
use ordered_float::OrderedFloat;

/// Great-circle distance between two points in kilometers.
pub fn distance_km(from: LatLon, to: LatLon) -> f64 {
    distance(
        HaversineLocation {
            latitude: from.0,
            longitude: from.1,
        },
        HaversineLocation {
            latitude: to.0,
            longitude: to.1,
        },
        Units::Kilometers,
    )
}

/// Ranks all `stations` by distance to `origin`, closest first.
///
/// The result contains every input station exactly once. Stations at the same distance keep
/// their relative order from `stations`.
pub fn rank(stations: &[StationRecord], origin: LatLon) -> Vec<RankedStation> {
    let mut ranked: Vec<RankedStation> = stations
        .iter()
        .enumerate()
        .map(|(directory_index, station)| RankedStation {
            distance_km: distance_km(origin, station.location()),
            station: station.clone(),
            directory_index,
        })
        .collect();
    // sort_by_key is stable
    ranked.sort_by_key(|candidate| OrderedFloat(candidate.distance_km));
    ranked
}

/// The first `limit` stations of a ranking that lie within `max_distance_km`.
pub fn nearest(
    ranked: impl IntoIterator<Item = RankedStation>,
    limit: usize,
    max_distance_km: f64,
) -> Vec<RankedStation> {
    ranked
        .into_iter()
        .take_while(|candidate| candidate.distance_km <= max_distance_km)
        .take(limit)
        .collect()
}
