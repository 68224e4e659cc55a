// Model exports
pub mod directory;
pub mod domain;
pub mod location;

pub use directory::{DirectoryCity, DirectoryCountry, DirectoryRelay, RelayDirectory};
pub use domain::{Coordinate, CoordinateError, ProtocolType, RelayEntry, RankedEntry, ProbeResult, RankedMeasuredEntry};
pub use location::LocationResponse;
