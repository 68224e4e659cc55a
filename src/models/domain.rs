use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Errors raised when building a coordinate from raw degrees
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordinateError {
    #[error("latitude {0} is outside -90..=90")]
    LatitudeOutOfRange(f64),

    #[error("longitude {0} is outside -180..=180")]
    LongitudeOutOfRange(f64),
}

/// A point on the Earth's surface in signed degrees
///
/// Only constructible through [`Coordinate::new`], so every value in the
/// pipeline is already known to be in range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        // NaN fails both range checks
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinateError::LatitudeOutOfRange(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinateError::LongitudeOutOfRange(longitude));
        }

        Ok(Self { latitude, longitude })
    }

    #[inline]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    #[inline]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.4}, {:.4})", self.latitude, self.longitude)
    }
}

/// Tunnel protocol a relay speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolType {
    OpenVpn,
    WireGuard,
}

impl ProtocolType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProtocolType::OpenVpn => "openvpn",
            ProtocolType::WireGuard => "wireguard",
        }
    }
}

impl fmt::Display for ProtocolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProtocolType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "openvpn" => Ok(ProtocolType::OpenVpn),
            "wireguard" => Ok(ProtocolType::WireGuard),
            other => Err(format!("unknown protocol type: {}", other)),
        }
    }
}

/// One candidate relay taken from the directory
#[derive(Debug, Clone, PartialEq)]
pub struct RelayEntry {
    pub country: String,
    pub city: String,
    pub protocol: ProtocolType,
    pub address: IpAddr,
    pub hostname: String,
    pub coordinate: Coordinate,
}

/// A relay together with its distance from the caller
#[derive(Debug, Clone, PartialEq)]
pub struct RankedEntry {
    pub relay: RelayEntry,
    pub distance_km: f64,
}

/// Outcome of a single latency probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeResult {
    Measured(Duration),
    Unreachable,
    TimedOut,
}

impl ProbeResult {
    pub fn latency(&self) -> Option<Duration> {
        match self {
            ProbeResult::Measured(rtt) => Some(*rtt),
            ProbeResult::Unreachable | ProbeResult::TimedOut => None,
        }
    }

    pub fn is_measured(&self) -> bool {
        matches!(self, ProbeResult::Measured(_))
    }
}

/// Terminal pipeline entity, consumed only by presentation
#[derive(Debug, Clone, PartialEq)]
pub struct RankedMeasuredEntry {
    pub ranked: RankedEntry,
    pub probe: ProbeResult,
}

impl RankedMeasuredEntry {
    pub fn relay(&self) -> &RelayEntry {
        &self.ranked.relay
    }

    pub fn distance_km(&self) -> f64 {
        self.ranked.distance_km
    }
}
