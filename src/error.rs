use crate::core::CatalogError;
use crate::models::CoordinateError;
use crate::services::{DirectoryError, LocationError};
use thiserror::Error;

/// Failures that invalidate a whole run
///
/// Per-relay problems never show up here; they are absorbed by the catalog
/// and the prober.
#[derive(Debug, Error)]
pub enum ClosestError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Could not determine current location: {0}")]
    Location(#[from] LocationError),

    #[error("Invalid origin coordinates: {0}")]
    Origin(#[from] CoordinateError),
}
