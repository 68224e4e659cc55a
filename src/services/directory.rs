use crate::config::DirectorySettings;
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur while acquiring the relay directory
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("No relay directory found (looked in: {0})")]
    NotFound(String),

    #[error("Failed to read relay directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Directory server returned error: {0}")]
    ApiError(String),
}

/// Relay directory cache locations of the VPN client, per platform
pub fn platform_directory_paths() -> Vec<PathBuf> {
    if cfg!(target_os = "windows") {
        vec![PathBuf::from(r"C:\ProgramData\Mullvad VPN\cache\relays.json")]
    } else if cfg!(target_os = "macos") {
        vec![PathBuf::from("/Library/Caches/mullvad-vpn/relays.json")]
    } else {
        vec![PathBuf::from("/var/cache/mullvad-vpn/relays.json")]
    }
}

/// Locates and loads the relay directory document
///
/// Resolution order:
/// 1. Explicitly configured file
/// 2. The VPN client's own cache file
/// 3. A downloaded copy, refreshed once older than the cache TTL
pub struct DirectoryClient {
    path: Option<PathBuf>,
    fallback_paths: Vec<PathBuf>,
    url: Option<String>,
    cache_path: Option<PathBuf>,
    cache_ttl: Duration,
    client: Client,
}

impl DirectoryClient {
    pub fn new(settings: &DirectorySettings) -> Result<Self, DirectoryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.download_timeout_secs))
            .build()?;

        Ok(Self {
            path: settings.path.clone(),
            fallback_paths: platform_directory_paths(),
            url: settings.url.clone(),
            cache_path: dirs::cache_dir().map(|d| d.join("closest-relays").join("relays.json")),
            cache_ttl: Duration::from_secs(settings.cache_ttl_secs),
            client,
        })
    }

    pub fn with_fallback_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.fallback_paths = paths;
        self
    }

    pub fn with_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = Some(path.into());
        self
    }

    /// Load the raw directory document
    pub async fn load(&self) -> Result<String, DirectoryError> {
        if let Some(path) = &self.path {
            info!("Loading relay directory from {}", path.display());
            return read_file(path).await;
        }

        for path in &self.fallback_paths {
            if tokio::fs::try_exists(path).await.unwrap_or(false) {
                info!("Loading relay directory from {}", path.display());
                return read_file(path).await;
            }
            debug!("No relay directory at {}", path.display());
        }

        if let Some(url) = &self.url {
            return self.load_downloaded(url).await;
        }

        let searched: Vec<String> = self
            .fallback_paths
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        Err(DirectoryError::NotFound(searched.join(", ")))
    }

    async fn load_downloaded(&self, url: &str) -> Result<String, DirectoryError> {
        if let Some(cache_path) = &self.cache_path {
            if self.is_fresh(cache_path).await {
                info!("Using cached relay directory {}", cache_path.display());
                return read_file(cache_path).await;
            }
        }

        let body = self.download(url).await?;

        if let Some(cache_path) = &self.cache_path {
            if let Err(e) = save_cache(cache_path, &body).await {
                warn!("Failed to cache relay directory at {}: {}", cache_path.display(), e);
            }
        }

        Ok(body)
    }

    async fn download(&self, url: &str) -> Result<String, DirectoryError> {
        info!("Downloading relay directory from {}", url);

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(DirectoryError::ApiError(format!(
                "{} returned {}",
                url,
                response.status()
            )));
        }

        Ok(response.text().await?)
    }

    async fn is_fresh(&self, path: &Path) -> bool {
        let modified = match tokio::fs::metadata(path).await.and_then(|m| m.modified()) {
            Ok(modified) => DateTime::<Utc>::from(modified),
            Err(_) => return false,
        };

        let age = Utc::now().signed_duration_since(modified);
        debug!("Relay directory cache is {}s old", age.num_seconds());
        age.num_seconds() >= 0 && (age.num_seconds() as u64) < self.cache_ttl.as_secs()
    }
}

async fn read_file(path: &Path) -> Result<String, DirectoryError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| DirectoryError::Io {
            path: path.to_path_buf(),
            source,
        })
}

async fn save_cache(path: &Path, body: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, body).await
}
