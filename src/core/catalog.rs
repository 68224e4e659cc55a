use crate::models::{
    Coordinate, DirectoryCity, DirectoryCountry, DirectoryRelay, ProtocolType, RelayDirectory,
    RelayEntry,
};
use serde_json::Value;
use std::net::IpAddr;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that invalidate a whole directory document
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Invalid relay directory: {0}")]
    InvalidDocument(#[from] serde_json::Error),
}

/// Why a single relay record was left out
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    Malformed(String),
    Inactive,
    UnknownProtocol(Option<String>),
    ProtocolFiltered,
    MissingAddress,
    MissingCoordinate,
    InvalidCoordinate(String),
}

/// Parse a raw directory document into relay entries
///
/// Fails only when the document itself cannot be read as a directory.
pub fn parse_directory(
    source: &str,
    protocol_filter: Option<ProtocolType>,
) -> Result<Vec<RelayEntry>, CatalogError> {
    let directory: RelayDirectory = serde_json::from_str(source)?;
    Ok(parse(&directory, protocol_filter))
}

/// Flatten country -> city -> relay records into typed entries
///
/// Records that do not match `protocol_filter`, when present, are excluded.
/// Records missing an address or coordinate are skipped, never fatal.
pub fn parse(directory: &RelayDirectory, protocol_filter: Option<ProtocolType>) -> Vec<RelayEntry> {
    let mut entries = Vec::new();
    let mut skipped = 0usize;

    for country in &directory.countries {
        for city in &country.cities {
            for record in &city.relays {
                match parse_record(country, city, record, protocol_filter) {
                    Ok(entry) => entries.push(entry),
                    Err(reason) => {
                        skipped += 1;
                        let hostname = record
                            .get("hostname")
                            .and_then(|h| h.as_str())
                            .unwrap_or("?");
                        debug!(
                            country = %country.name,
                            city = %city.name,
                            hostname,
                            ?reason,
                            "Skipping relay record"
                        );
                    }
                }
            }
        }
    }

    info!(
        relays = entries.len(),
        skipped,
        filter = protocol_filter.map(|p| p.as_str()).unwrap_or("any"),
        "Parsed relay directory"
    );

    entries
}

/// Decode one relay record, inheriting location data from its city
pub fn parse_record(
    country: &DirectoryCountry,
    city: &DirectoryCity,
    record: &Value,
    protocol_filter: Option<ProtocolType>,
) -> Result<RelayEntry, SkipReason> {
    let relay: DirectoryRelay = serde_json::from_value(record.clone())
        .map_err(|e| SkipReason::Malformed(e.to_string()))?;

    if !relay.is_active() {
        return Err(SkipReason::Inactive);
    }

    let protocol = relay
        .protocol_name()
        .and_then(|name| name.parse::<ProtocolType>().ok())
        .ok_or_else(|| SkipReason::UnknownProtocol(relay.protocol_name().map(str::to_string)))?;

    if let Some(wanted) = protocol_filter {
        if protocol != wanted {
            return Err(SkipReason::ProtocolFiltered);
        }
    }

    let address = parse_address(&relay).ok_or(SkipReason::MissingAddress)?;

    // Relay-level coordinates win over the city's
    let (latitude, longitude) = match (relay.latitude, relay.longitude) {
        (Some(lat), Some(lon)) => (lat, lon),
        _ => match (city.latitude, city.longitude) {
            (Some(lat), Some(lon)) => (lat, lon),
            _ => return Err(SkipReason::MissingCoordinate),
        },
    };
    let coordinate = Coordinate::new(latitude, longitude)
        .map_err(|e| SkipReason::InvalidCoordinate(e.to_string()))?;

    Ok(RelayEntry {
        country: country.name.clone(),
        city: city.name.clone(),
        protocol,
        hostname: relay.hostname.clone().unwrap_or_else(|| address.to_string()),
        address,
        coordinate,
    })
}

fn parse_address(relay: &DirectoryRelay) -> Option<IpAddr> {
    [&relay.ipv4_addr_in, &relay.ipv6_addr_in]
        .into_iter()
        .flatten()
        .find_map(|raw| raw.trim().parse::<IpAddr>().ok())
}
