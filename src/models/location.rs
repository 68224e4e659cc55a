use serde::{Deserialize, Serialize};

/// Response of the geolocation endpoint
///
/// Extra fields are ignored; only the coordinates are mandatory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationResponse {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
}
