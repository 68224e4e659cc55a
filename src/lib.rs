//! Closest Relays - find nearby VPN relays and rank them by live latency
//!
//! The pipeline parses a relay directory, keeps the relays within a maximum
//! great-circle distance of the caller, probes each of them concurrently and
//! orders the result by measured latency.

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod services;
pub mod table;

// Re-export commonly used types
pub use crate::core::{haversine_distance, order, rank, FindResult, LatencyProber, Pinger, ProbeSettings, RelayFinder};
pub use error::ClosestError;
pub use models::{Coordinate, ProtocolType, RelayEntry, RankedEntry, ProbeResult, RankedMeasuredEntry};
