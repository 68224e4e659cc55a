use crate::core::prober::ProbeSettings;
use crate::services::pinger::ProbeMethod;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use validator::Validate;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct Settings {
    #[serde(default)]
    #[validate(nested)]
    pub ranking: RankingSettings,
    #[serde(default)]
    #[validate(nested)]
    pub probe: ProbeConfig,
    #[serde(default)]
    #[validate(nested)]
    pub directory: DirectorySettings,
    #[serde(default)]
    #[validate(nested)]
    pub location: LocationSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RankingSettings {
    #[serde(default = "default_max_distance_km")]
    pub max_distance_km: f64,
}

impl Default for RankingSettings {
    fn default() -> Self {
        Self {
            max_distance_km: default_max_distance_km(),
        }
    }
}

fn default_max_distance_km() -> f64 { 500.0 }

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProbeConfig {
    #[serde(default = "default_probe_timeout_ms")]
    #[validate(range(min = 1))]
    pub timeout_ms: u64,
    #[serde(default = "default_probe_concurrency")]
    #[validate(range(min = 1, max = 1024))]
    pub concurrency: usize,
    #[serde(default = "default_probe_method")]
    pub method: ProbeMethod,
    #[serde(default = "default_tcp_port")]
    #[validate(range(min = 1))]
    pub tcp_port: u16,
    #[serde(default)]
    #[validate(range(min = 1))]
    pub batch_deadline_secs: Option<u64>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_probe_timeout_ms(),
            concurrency: default_probe_concurrency(),
            method: default_probe_method(),
            tcp_port: default_tcp_port(),
            batch_deadline_secs: None,
        }
    }
}

impl ProbeConfig {
    pub fn probe_settings(&self) -> ProbeSettings {
        ProbeSettings {
            timeout: Duration::from_millis(self.timeout_ms),
            concurrency: self.concurrency,
            batch_deadline: self.batch_deadline_secs.map(Duration::from_secs),
        }
    }
}

fn default_probe_timeout_ms() -> u64 { 1000 }
fn default_probe_concurrency() -> usize { 32 }
fn default_probe_method() -> ProbeMethod { ProbeMethod::System }
fn default_tcp_port() -> u16 { 443 }

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DirectorySettings {
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    #[validate(url)]
    pub url: Option<String>,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_download_timeout_secs")]
    #[validate(range(min = 1))]
    pub download_timeout_secs: u64,
}

impl Default for DirectorySettings {
    fn default() -> Self {
        Self {
            path: None,
            url: None,
            cache_ttl_secs: default_cache_ttl_secs(),
            download_timeout_secs: default_download_timeout_secs(),
        }
    }
}

fn default_cache_ttl_secs() -> u64 { 3600 }
fn default_download_timeout_secs() -> u64 { 30 }

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LocationSettings {
    #[serde(default = "default_location_url")]
    #[validate(url)]
    pub url: String,
    #[serde(default = "default_location_timeout_secs")]
    #[validate(range(min = 1))]
    pub timeout_secs: u64,
}

impl Default for LocationSettings {
    fn default() -> Self {
        Self {
            url: default_location_url(),
            timeout_secs: default_location_timeout_secs(),
        }
    }
}

fn default_location_url() -> String { "https://am.i.mullvad.net/json".to_string() }
fn default_location_timeout_secs() -> u64 { 10 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "warn".to_string() }
fn default_log_format() -> String { "pretty".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with CLOSEST__)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., CLOSEST__PROBE__TIMEOUT_MS -> probe.timeout_ms
            .add_source(environment())
            .build()?;

        settings.try_deserialize::<Settings>().and_then(checked)
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(environment())
            .build()?;

        settings.try_deserialize::<Settings>().and_then(checked)
    }
}

fn environment() -> Environment {
    Environment::with_prefix("CLOSEST")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

fn checked(settings: Settings) -> Result<Settings, ConfigError> {
    settings
        .validate()
        .map_err(|e| ConfigError::Message(format!("Invalid configuration: {}", e)))?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_probe_settings() {
        let probe = ProbeConfig::default();
        assert_eq!(probe.timeout_ms, 1000);
        assert_eq!(probe.concurrency, 32);
        assert_eq!(probe.method, ProbeMethod::System);
        assert_eq!(probe.tcp_port, 443);

        let settings = probe.probe_settings();
        assert_eq!(settings.timeout, Duration::from_millis(1000));
        assert_eq!(settings.batch_deadline, None);
    }

    #[test]
    fn test_default_logging() {
        let level = default_log_level();
        let format = default_log_format();
        assert_eq!(level, "warn");
        assert_eq!(format, "pretty");
    }

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.ranking.max_distance_km, 500.0);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[ranking]\nmax_distance_km = 250.0\n\n[probe]\nconcurrency = 4\nmethod = \"tcp\"\ntcp_port = 1194\n"
        )
        .unwrap();

        let settings = Settings::load_from(file.path()).unwrap();
        assert_eq!(settings.ranking.max_distance_km, 250.0);
        assert_eq!(settings.probe.concurrency, 4);
        assert_eq!(settings.probe.method, ProbeMethod::Tcp);
        assert_eq!(settings.probe.tcp_port, 1194);
        assert_eq!(settings.probe.timeout_ms, 1000);
    }

    #[test]
    fn test_zero_concurrency_is_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[probe]\nconcurrency = 0\n").unwrap();

        assert!(Settings::load_from(file.path()).is_err());
    }
}
