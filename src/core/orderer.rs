use crate::models::{ProbeResult, RankedMeasuredEntry};
use std::cmp::Ordering;

/// Order probed relays for presentation
///
/// Measured entries come first, fastest first. Timed-out and unreachable
/// entries follow in their incoming relative order. The sort is stable.
pub fn order(mut entries: Vec<RankedMeasuredEntry>) -> Vec<RankedMeasuredEntry> {
    entries.sort_by(|a, b| compare_probes(&a.probe, &b.probe));
    entries
}

/// Total order over probe outcomes: any measurement beats no measurement
pub fn compare_probes(a: &ProbeResult, b: &ProbeResult) -> Ordering {
    match (a.latency(), b.latency()) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
