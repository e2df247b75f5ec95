use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

pub mod defaults;
pub mod duration_serde;

use defaults::*;

use crate::errors::{AppError, AppResult};
use crate::utils::time::TimezonePolicy;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub epg: EpgConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

/// Settings for playlist and guide downloads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_connect_timeout", with = "duration_serde::duration")]
    pub connect_timeout: Duration,
    #[serde(default = "default_request_timeout", with = "duration_serde::duration")]
    pub request_timeout: Duration,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Settings for channel reachability probing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Deadline applied to each probe independently
    #[serde(default = "default_probe_timeout", with = "duration_serde::duration")]
    pub timeout: Duration,
    /// Upper bound on probes in flight at once
    #[serde(default = "default_max_concurrent_probes")]
    pub max_concurrent: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EpgConfig {
    /// Guide feed loaded after every successful playlist ingestion
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub timezone_policy: TimezonePolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_state_path")]
    pub state_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_placeholder_logo")]
    pub placeholder_logo: String,
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_probe_timeout() -> Duration {
    Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS)
}

fn default_max_concurrent_probes() -> usize {
    DEFAULT_MAX_CONCURRENT_PROBES
}

fn default_state_path() -> PathBuf {
    PathBuf::from(DEFAULT_STATE_PATH)
}

fn default_placeholder_logo() -> String {
    DEFAULT_PLACEHOLDER_LOGO.to_string()
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: default_connect_timeout(),
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout: default_probe_timeout(),
            max_concurrent: default_max_concurrent_probes(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_path: default_state_path(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            placeholder_logo: default_placeholder_logo(),
            history_limit: default_history_limit(),
        }
    }
}

impl Config {
    pub fn load() -> AppResult<Self> {
        let config_file =
            std::env::var("IPTV_CATALOG_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
        Self::load_from_file(&config_file)
    }

    /// Read the TOML file at `config_file`, writing the defaults there first if it is missing.
    pub fn load_from_file(config_file: &str) -> AppResult<Self> {
        let path = Path::new(config_file);
        if path.exists() {
            let contents = std::fs::read_to_string(path).map_err(|e| {
                AppError::configuration(format!("Failed to read {config_file}: {e}"))
            })?;
            let config: Self = toml::from_str(&contents).map_err(|e| {
                AppError::configuration(format!("Failed to parse {config_file}: {e}"))
            })?;
            config.validate()?;
            Ok(config)
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)
                .map_err(|e| AppError::configuration(format!("Failed to render defaults: {e}")))?;
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| {
                    AppError::configuration(format!("Failed to create {}: {e}", parent.display()))
                })?;
            }
            std::fs::write(path, contents).map_err(|e| {
                AppError::configuration(format!("Failed to write {config_file}: {e}"))
            })?;
            info!("Created default config file: {}", config_file);
            Ok(default_config)
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.probe.max_concurrent == 0 {
            return Err(AppError::configuration(
                "probe.max_concurrent must be at least 1",
            ));
        }
        if self.probe.timeout.is_zero() {
            return Err(AppError::configuration("probe.timeout must be non-zero"));
        }
        if self.catalog.history_limit == 0 {
            return Err(AppError::configuration(
                "catalog.history_limit must be at least 1",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.probe.timeout, Duration::from_secs(5));
        assert_eq!(config.probe.max_concurrent, 64);
        assert_eq!(config.catalog.history_limit, 5);
        assert_eq!(config.epg.timezone_policy, TimezonePolicy::Ignore);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
[probe]
timeout = "2s"

[epg]
timezone_policy = "honor"
"#,
        )
        .unwrap();
        assert_eq!(config.probe.timeout, Duration::from_secs(2));
        assert_eq!(config.probe.max_concurrent, 64);
        assert_eq!(config.epg.timezone_policy, TimezonePolicy::Honor);
        assert_eq!(config.catalog.placeholder_logo, DEFAULT_PLACEHOLDER_LOGO);
    }

    #[test]
    fn test_load_from_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let path_str = path.to_str().unwrap();

        let config = Config::load_from_file(path_str).unwrap();
        assert!(path.exists());
        assert_eq!(config.probe.max_concurrent, DEFAULT_MAX_CONCURRENT_PROBES);

        let reloaded = Config::load_from_file(path_str).unwrap();
        assert_eq!(reloaded.probe.timeout, config.probe.timeout);
    }

    #[test]
    fn test_validation_rejects_zero_concurrency() {
        let mut config = Config::default();
        config.probe.max_concurrent = 0;
        assert!(matches!(
            config.validate(),
            Err(AppError::Configuration { .. })
        ));
    }
}
