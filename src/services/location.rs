use crate::config::LocationSettings;
use crate::models::{Coordinate, CoordinateError, LocationResponse};
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Errors that can occur when looking up the caller's location
#[derive(Debug, Error)]
pub enum LocationError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Location service returned error: {0}")]
    ApiError(String),

    #[error("Location service returned invalid coordinates: {0}")]
    InvalidCoordinate(#[from] CoordinateError),
}

/// Looks up the caller's coordinates from a JSON geolocation endpoint
pub struct LocationClient {
    url: String,
    client: Client,
}

impl LocationClient {
    pub fn new(settings: &LocationSettings) -> Result<Self, LocationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            url: settings.url.clone(),
            client,
        })
    }

    /// Fetch the current location
    pub async fn current_location(&self) -> Result<Coordinate, LocationError> {
        let response = self.client.get(&self.url).send().await?;

        if !response.status().is_success() {
            return Err(LocationError::ApiError(format!(
                "{} returned {}",
                self.url,
                response.status()
            )));
        }

        let location: LocationResponse = response.json().await?;
        let coordinate = Coordinate::new(location.latitude, location.longitude)?;

        info!(
            %coordinate,
            city = location.city.as_deref().unwrap_or("?"),
            country = location.country.as_deref().unwrap_or("?"),
            "Resolved current location"
        );

        Ok(coordinate)
    }
}
