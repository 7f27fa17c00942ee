//! Service Configuration - server, store and volume engine settings
//!
//! Every section implements `Default`, so an empty or missing TOML file
//! yields a runnable in-memory deployment.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration.
///
/// Load with `ServiceConfig::load()` which searches:
/// 1. `$FORECAST_VOLUMES_CONFIG` env var
/// 2. `./forecast_volumes.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Document store backend
    #[serde(default)]
    pub store: StoreConfig,

    /// Volume engine tuning, hot-reloadable
    #[serde(default)]
    pub volumes: VolumeSettings,
}

impl ServiceConfig {
    /// Path of the config file the standard search order would use, if any.
    pub fn locate() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(defaults::CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                return Some(p);
            }
            warn!(path = %path, "{} points to non-existent file, falling back", defaults::CONFIG_ENV_VAR);
        }

        let local = PathBuf::from(defaults::LOCAL_CONFIG_FILE);
        local.exists().then_some(local)
    }

    /// Load configuration using the standard search order, then apply
    /// environment overrides. Invalid files fall back to defaults.
    pub fn load() -> Self {
        let mut config = match Self::locate() {
            Some(path) => match Self::load_from_file(&path) {
                Ok(config) => {
                    info!(path = %path.display(), "Loaded service config");
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to load service config, using defaults");
                    Self::default()
                }
            },
            None => {
                info!("No {} found, using built-in defaults", defaults::LOCAL_CONFIG_FILE);
                Self::default()
            }
        };

        config.apply_env_overrides();
        if let Err(e) = config.validate() {
            warn!(error = %e, "Environment overrides produced an invalid config, using defaults");
            config = Self::default();
        }
        config
    }

    /// Re-read configuration at runtime. Unlike [`ServiceConfig::load`],
    /// a broken file is reported instead of replaced by defaults.
    pub fn reload() -> Result<Self, ConfigError> {
        let mut config = match Self::locate() {
            Some(path) => Self::load_from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config: Self = toml::from_str(&contents)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// `FORECAST_SERVER_ADDR` and `FORECAST_DAILY_YEAR_LIMIT` win over the file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(addr) = std::env::var(defaults::SERVER_ADDR_ENV_VAR) {
            self.server.addr = addr;
        }
        if let Ok(v) = std::env::var(defaults::YEAR_LIMIT_ENV_VAR) {
            match v.parse() {
                Ok(years) => self.volumes.daily_year_limit = years,
                Err(_) => warn!(value = %v, "Ignoring unparsable {}", defaults::YEAR_LIMIT_ENV_VAR),
            }
        }
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = self.volumes.check();
        if self.store.backend == StoreBackend::Sled && self.store.path.as_os_str().is_empty() {
            errors.push("store.path must be set for the sled backend".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {1}", .0.display())]
    Io(PathBuf, std::io::Error),
    #[error("Config parse error ({}): {1}", .0.display())]
    Parse(PathBuf, toml::de::Error),
    #[error("Config serialization error: {0}")]
    Serialize(toml::ser::Error),
    #[error("Config validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
}

// ============================================================================
// Server Config
// ============================================================================

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server bind address.
    ///
    /// Can be overridden by `FORECAST_SERVER_ADDR` env var or `--addr` CLI flag.
    #[serde(default = "default_server_addr")]
    pub addr: String,
}

fn default_server_addr() -> String {
    defaults::SERVER_ADDR.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_server_addr(),
        }
    }
}

// ============================================================================
// Store Config
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Sled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// Sled database directory.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,

    /// JSON seed document set loaded at startup.
    #[serde(default)]
    pub seed_file: Option<PathBuf>,
}

fn default_store_path() -> PathBuf {
    PathBuf::from(defaults::STORE_PATH)
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            path: default_store_path(),
            seed_file: None,
        }
    }
}

// ============================================================================
// Volume Settings
// ============================================================================

/// Volume engine settings, snapshotted once per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeSettings {
    /// Daily output limit in years; `0` disables truncation.
    #[serde(default)]
    pub daily_year_limit: f64,

    /// Page size when the request does not give `take`.
    #[serde(default = "default_take")]
    pub default_take: usize,

    /// Upper bound on `take`.
    #[serde(default = "default_max_take")]
    pub max_take: usize,
}

fn default_take() -> usize {
    defaults::DEFAULT_TAKE
}

fn default_max_take() -> usize {
    defaults::MAX_TAKE
}

impl Default for VolumeSettings {
    fn default() -> Self {
        Self {
            daily_year_limit: 0.0,
            default_take: default_take(),
            max_take: default_max_take(),
        }
    }
}

impl VolumeSettings {
    /// Clamp a requested page size into `[1, max_take]`.
    pub fn page_size(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.default_take).clamp(1, self.max_take.max(1))
    }

    fn check(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if !self.daily_year_limit.is_finite() || self.daily_year_limit < 0.0 {
            errors.push(format!(
                "volumes.daily_year_limit must be a finite value >= 0 (got {})",
                self.daily_year_limit
            ));
        }
        if self.max_take == 0 {
            errors.push("volumes.max_take must be > 0".to_string());
        }
        if self.default_take == 0 || self.default_take > self.max_take {
            errors.push(format!(
                "volumes.default_take ({}) must be between 1 and max_take ({})",
                self.default_take, self.max_take
            ));
        }
        errors
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = ServiceConfig::default();
        assert!(config.validate().is_ok(), "Default config must always validate");
        assert_eq!(config.store.backend, StoreBackend::Memory);
    }

    #[test]
    fn test_empty_toml_produces_defaults() {
        let config: ServiceConfig = toml::from_str("").expect("empty TOML should parse");
        assert_eq!(config, ServiceConfig::default());
    }

    #[test]
    fn test_partial_toml_override() {
        let config: ServiceConfig = toml::from_str(
            r#"
[volumes]
daily_year_limit = 2.5

[store]
backend = "sled"
path = "/var/lib/forecast-volumes"
"#,
        )
        .unwrap();
        assert!((config.volumes.daily_year_limit - 2.5).abs() < f64::EPSILON);
        assert_eq!(config.volumes.default_take, defaults::DEFAULT_TAKE);
        assert_eq!(config.store.backend, StoreBackend::Sled);
        assert_eq!(config.server.addr, defaults::SERVER_ADDR);
    }

    #[test]
    fn test_negative_year_limit_rejected() {
        let mut config = ServiceConfig::default();
        config.volumes.daily_year_limit = -1.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("daily_year_limit"));
    }

    #[test]
    fn test_default_take_above_max_rejected() {
        let mut config = ServiceConfig::default();
        config.volumes.default_take = 500;
        config.volumes.max_take = 100;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_page_size_clamped() {
        let settings = VolumeSettings::default();
        assert_eq!(settings.page_size(None), defaults::DEFAULT_TAKE);
        assert_eq!(settings.page_size(Some(0)), 1);
        assert_eq!(settings.page_size(Some(10_000)), defaults::MAX_TAKE);
    }

    #[test]
    fn test_round_trip_through_toml() {
        let config = ServiceConfig::default();
        let text = config.to_toml().unwrap();
        let parsed: ServiceConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
