use crate::core::distance::haversine_distance;
use crate::models::{Coordinate, RankedEntry, RelayEntry};
use std::cmp::Ordering;

/// Rank relays by great-circle distance from `origin`
///
/// Keeps entries with `distance <= max_distance_km` and returns them sorted
/// ascending by distance. The sort is stable, so equidistant entries keep
/// their input order.
pub fn rank(entries: Vec<RelayEntry>, origin: Coordinate, max_distance_km: f64) -> Vec<RankedEntry> {
    let mut ranked: Vec<RankedEntry> = entries
        .into_iter()
        .filter_map(|relay| {
            let distance_km = haversine_distance(origin, relay.coordinate);
            within_range(distance_km, max_distance_km).then_some(RankedEntry { relay, distance_km })
        })
        .collect();

    ranked.sort_by(|a, b| {
        a.distance_km
            .partial_cmp(&b.distance_km)
            .unwrap_or(Ordering::Equal)
    });

    tracing::info!(
        kept = ranked.len(),
        max_distance_km,
        %origin,
        "Ranked relays by distance"
    );

    ranked
}

/// Inclusive distance bound
#[inline]
pub fn within_range(distance_km: f64, max_distance_km: f64) -> bool {
    distance_km <= max_distance_km
}
