// Service exports
pub mod directory;
pub mod location;
pub mod pinger;

pub use directory::{DirectoryClient, DirectoryError};
pub use location::{LocationClient, LocationError};
pub use pinger::{ConfiguredPinger, ProbeMethod, SystemPinger, TcpPinger};
