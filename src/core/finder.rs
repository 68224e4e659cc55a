use crate::core::{
    orderer::order,
    prober::{LatencyProber, Pinger, ProbeSettings},
    ranker::rank,
};
use crate::models::{Coordinate, RankedMeasuredEntry, RelayEntry};

/// Result of the search
#[derive(Debug)]
pub struct FindResult {
    pub relays: Vec<RankedMeasuredEntry>,
    pub total_candidates: usize,
}

/// Main search orchestrator
///
/// # Pipeline Stages
/// 1. Distance ranking with the max-distance cutoff
/// 2. Concurrent latency probing
/// 3. Latency ordering
///
/// Protocol filtering happens earlier, while the catalog is parsed.
pub struct RelayFinder<P> {
    prober: LatencyProber<P>,
}

impl<P: Pinger> RelayFinder<P> {
    pub fn new(pinger: P, settings: ProbeSettings) -> Self {
        Self {
            prober: LatencyProber::new(pinger, settings),
        }
    }

    /// Find the relays within `max_distance_km` of `origin`, fastest first
    ///
    /// Every relay that passes the distance cutoff appears in the result,
    /// measured or not.
    pub async fn find(
        &self,
        candidates: Vec<RelayEntry>,
        origin: Coordinate,
        max_distance_km: f64,
    ) -> FindResult {
        let total_candidates = candidates.len();

        let ranked = rank(candidates, origin, max_distance_km);
        let measured = self.prober.probe(ranked).await;

        FindResult {
            relays: order(measured),
            total_candidates,
        }
    }
}
