use crate::models::{ProbeResult, RankedEntry, RankedMeasuredEntry};
use std::collections::HashMap;
use std::future::Future;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::{Id, JoinSet};
use tracing::{debug, info, warn};

/// Errors a single round-trip attempt can report
#[derive(Debug, Error)]
pub enum PingError {
    #[error("Destination unreachable: {0}")]
    Unreachable(String),

    #[error("No reply received")]
    TimedOut,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One round-trip reachability check against an address
///
/// Implementations perform exactly one attempt. `timeout` is advisory, the
/// prober enforces it independently.
pub trait Pinger: Send + Sync + 'static {
    fn ping(
        &self,
        address: IpAddr,
        timeout: Duration,
    ) -> impl Future<Output = Result<Duration, PingError>> + Send;
}

/// Probe tuning knobs
#[derive(Debug, Clone, Copy)]
pub struct ProbeSettings {
    /// Per-probe wait, measured from when that probe starts
    pub timeout: Duration,
    /// Maximum number of probes in flight
    pub concurrency: usize,
    /// Hard ceiling for the whole batch
    pub batch_deadline: Option<Duration>,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(1000),
            concurrency: 32,
            batch_deadline: None,
        }
    }
}

/// Measures latency to every ranked relay through a bounded worker pool
pub struct LatencyProber<P> {
    pinger: Arc<P>,
    settings: ProbeSettings,
}

impl<P: Pinger> LatencyProber<P> {
    pub fn new(pinger: P, settings: ProbeSettings) -> Self {
        Self {
            pinger: Arc::new(pinger),
            settings,
        }
    }

    pub fn settings(&self) -> &ProbeSettings {
        &self.settings
    }

    /// Probe every entry once and annotate it with the outcome
    ///
    /// Output has exactly one element per input, in input order. Individual
    /// failures are encoded in [`ProbeResult`] and never returned as errors.
    pub async fn probe(&self, entries: Vec<RankedEntry>) -> Vec<RankedMeasuredEntry> {
        if entries.is_empty() {
            return Vec::new();
        }

        let semaphore = Arc::new(Semaphore::new(self.settings.concurrency.max(1)));
        let timeout = self.settings.timeout;
        let mut tasks = JoinSet::new();
        let mut positions: HashMap<Id, usize> = HashMap::with_capacity(entries.len());

        for (index, entry) in entries.iter().enumerate() {
            let pinger = Arc::clone(&self.pinger);
            let semaphore = Arc::clone(&semaphore);
            let address = entry.relay.address;

            let handle = tasks.spawn(async move {
                let result = match semaphore.acquire_owned().await {
                    // The timeout clock starts only once a worker slot is held
                    Ok(_permit) => probe_one(pinger.as_ref(), address, timeout).await,
                    Err(_) => ProbeResult::Unreachable,
                };
                (index, result)
            });
            positions.insert(handle.id(), index);
        }

        // One slot per input position; completion order does not matter
        let mut slots: Vec<Option<ProbeResult>> = vec![None; entries.len()];
        let deadline = self
            .settings
            .batch_deadline
            .map(|ceiling| tokio::time::Instant::now() + ceiling);
        let mut deadline_hit = false;

        loop {
            let next = match deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, tasks.join_next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        deadline_hit = true;
                        break;
                    }
                },
                None => tasks.join_next().await,
            };

            match next {
                Some(Ok((index, result))) => slots[index] = Some(result),
                Some(Err(e)) => {
                    warn!("Probe task failed: {}", e);
                    if let Some(&index) = positions.get(&e.id()) {
                        slots[index] = Some(ProbeResult::Unreachable);
                    }
                }
                None => break,
            }
        }

        if deadline_hit {
            warn!(pending = tasks.len(), "Probe batch deadline reached, abandoning remaining probes");
            tasks.abort_all();
        }

        // Failed tasks already hold Unreachable, so anything still empty
        // outlived the batch ceiling
        let fallback = if deadline_hit {
            ProbeResult::TimedOut
        } else {
            ProbeResult::Unreachable
        };

        let measured: Vec<RankedMeasuredEntry> = entries
            .into_iter()
            .zip(slots)
            .map(|(ranked, slot)| RankedMeasuredEntry {
                ranked,
                probe: slot.unwrap_or(fallback),
            })
            .collect();

        info!(
            probed = measured.len(),
            reachable = measured.iter().filter(|m| m.probe.is_measured()).count(),
            "Latency probing complete"
        );

        measured
    }
}

/// Run a single probe under its own timeout
pub async fn probe_one<P: Pinger>(pinger: &P, address: IpAddr, timeout: Duration) -> ProbeResult {
    match tokio::time::timeout(timeout, pinger.ping(address, timeout)).await {
        Ok(Ok(rtt)) => {
            debug!(%address, rtt_ms = rtt.as_secs_f64() * 1000.0, "Probe answered");
            ProbeResult::Measured(rtt)
        }
        Ok(Err(PingError::TimedOut)) | Err(_) => {
            debug!(%address, "Probe timed out");
            ProbeResult::TimedOut
        }
        Ok(Err(e)) => {
            debug!(%address, error = %e, "Probe target unreachable");
            ProbeResult::Unreachable
        }
    }
}
