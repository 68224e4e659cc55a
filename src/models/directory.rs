use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Relay directory document as cached by the VPN client
///
/// Only the outer skeleton is strictly typed. Individual relay records stay as
/// raw JSON until the catalog decodes them one by one, so a malformed record
/// cannot fail the whole document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayDirectory {
    pub countries: Vec<DirectoryCountry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryCountry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub cities: Vec<DirectoryCity>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryCity {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub relays: Vec<Value>,
}

/// A single relay record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryRelay {
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub ipv4_addr_in: Option<String>,
    #[serde(default)]
    pub ipv6_addr_in: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
    /// `"openvpn"`, `"bridge"` or `{"wireguard": {...}}`
    #[serde(default)]
    pub endpoint_data: Option<Value>,
    /// Flat protocol name used by some directory exports
    #[serde(default, rename = "type")]
    pub relay_type: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl DirectoryRelay {
    /// Protocol name as advertised by the record, if any
    pub fn protocol_name(&self) -> Option<&str> {
        match &self.endpoint_data {
            Some(Value::String(name)) => Some(name.as_str()),
            Some(Value::Object(map)) => map.keys().next().map(String::as_str),
            _ => self.relay_type.as_deref(),
        }
    }

    /// Helper to get `active`, defaulting to true when absent
    pub fn is_active(&self) -> bool {
        self.active.unwrap_or(true)
    }
}
