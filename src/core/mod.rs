// Core algorithm exports
pub mod catalog;
pub mod distance;
pub mod finder;
pub mod orderer;
pub mod prober;
pub mod ranker;

pub use catalog::{parse, parse_directory, CatalogError};
pub use distance::{haversine_distance, EARTH_RADIUS_KM};
pub use finder::{FindResult, RelayFinder};
pub use orderer::order;
pub use prober::{LatencyProber, PingError, Pinger, ProbeSettings};
pub use ranker::rank;
