//! Service Configuration Module
//!
//! Provides configuration loading for the country cache service.
//! Supports an optional TOML file with environment variable overrides.

use anyhow::{bail, Context, Result};
use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "COUNTRY_CACHE";

/// Main service configuration structure
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct CacheServiceConfig {
    /// External feed endpoints
    pub feeds: FeedSettings,

    /// Backing store
    pub store: StoreSettings,

    /// Summary artifact
    pub summary: SummarySettings,

    pub logging: LoggingSettings,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct FeedSettings {
    pub reference_data_url: String,
    pub exchange_rates_url: String,

    /// Per-feed request timeout in milliseconds
    pub timeout_ms: u64,

    pub user_agent: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct StoreSettings {
    /// Directory holding the store snapshot
    pub data_dir: PathBuf,

    /// Enable persistent disk snapshot
    pub persist_to_disk: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct SummarySettings {
    /// Where the rendered summary card is written
    pub output_path: PathBuf,

    /// Number of countries ranked on the card
    pub top_n: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default `EnvFilter` directive, overridden by `RUST_LOG`
    pub level: String,

    /// Emit JSON log lines instead of human-readable output
    pub json: bool,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            reference_data_url:
                "https://restcountries.com/v2/all?fields=name,capital,region,population,flag,currencies"
                    .to_string(),
            exchange_rates_url: "https://open.er-api.com/v6/latest/USD".to_string(),
            timeout_ms: 15_000,
            user_agent: format!("country-cache/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data/country_cache"),
            persist_to_disk: true,
        }
    }
}

impl Default for SummarySettings {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("./cache/summary.svg"),
            top_n: 5,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl FeedSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl CacheServiceConfig {
    /// Load configuration from defaults, an optional file and `COUNTRY_CACHE__*` variables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    fn load_with_prefix(path: Option<&Path>, env_prefix: &str) -> Result<Self> {
        let defaults = Config::try_from(&Self::default())
            .context("Failed to build default configuration")?;

        let mut builder = Config::builder().add_source(defaults);

        if let Some(path) = path {
            info!("Loading configuration file: {:?}", path);
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(env_prefix)
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        debug!(?config, "Configuration loaded");
        Ok(config)
    }

    /// Expand environment variables in path values
    pub fn expand_env_vars(&mut self) -> Result<()> {
        self.store.data_dir = expand_path(&self.store.data_dir)
            .context("Failed to expand store data_dir")?;
        self.summary.output_path = expand_path(&self.summary.output_path)
            .context("Failed to expand summary output_path")?;
        Ok(())
    }

    /// Reject settings the service cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.feeds.reference_data_url.trim().is_empty() {
            bail!("feeds.reference_data_url must not be empty");
        }
        if self.feeds.exchange_rates_url.trim().is_empty() {
            bail!("feeds.exchange_rates_url must not be empty");
        }
        if self.feeds.timeout_ms == 0 {
            bail!("feeds.timeout_ms must be greater than zero");
        }
        if self.summary.top_n == 0 {
            bail!("summary.top_n must be greater than zero");
        }
        Ok(())
    }

    /// Path of the store snapshot file
    pub fn snapshot_path(&self) -> PathBuf {
        self.store.data_dir.join("country_cache.json")
    }
}

fn expand_path(path: &Path) -> Result<PathBuf> {
    let raw = path.to_string_lossy();
    let expanded = shellexpand::full(&raw)?;
    Ok(PathBuf::from(expanded.into_owned()))
}

/// Convenience function: load, expand and validate
pub fn load_config(path: Option<&Path>) -> Result<CacheServiceConfig> {
    let mut config = CacheServiceConfig::load(path)?;
    config.expand_env_vars()?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_without_file() {
        let config =
            CacheServiceConfig::load_with_prefix(None, "COUNTRY_CACHE_TEST_DEFAULTS").unwrap();

        assert_eq!(config.feeds.timeout_ms, 15_000);
        assert_eq!(config.feeds.timeout(), Duration::from_secs(15));
        assert_eq!(config.summary.top_n, 5);
        assert!(config.store.persist_to_disk);
        assert_eq!(
            config.snapshot_path(),
            PathBuf::from("./data/country_cache/country_cache.json")
        );
        config.validate().unwrap();
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("country_cache.toml");

        let config_content = r#"
[feeds]
exchange_rates_url = "http://localhost:9000/rates"
timeout_ms = 2500

[store]
data_dir = "/tmp/country-test"
persist_to_disk = false

[logging]
level = "debug"
json = true
"#;

        fs::write(&config_path, config_content).unwrap();

        let config =
            CacheServiceConfig::load_with_prefix(Some(&config_path), "COUNTRY_CACHE_TEST_FILE")
                .unwrap();

        assert_eq!(config.feeds.exchange_rates_url, "http://localhost:9000/rates");
        assert_eq!(config.feeds.timeout_ms, 2500);
        // Untouched keys keep their defaults
        assert!(config.feeds.reference_data_url.starts_with("https://restcountries.com"));
        assert_eq!(config.store.data_dir, PathBuf::from("/tmp/country-test"));
        assert!(!config.store.persist_to_disk);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
        assert_eq!(config.summary.top_n, 5);
    }

    #[test]
    fn test_environment_override() {
        std::env::set_var("COUNTRY_CACHE_TEST_ENV__SUMMARY__TOP_N", "3");
        std::env::set_var("COUNTRY_CACHE_TEST_ENV__FEEDS__TIMEOUT_MS", "750");

        let config = CacheServiceConfig::load_with_prefix(None, "COUNTRY_CACHE_TEST_ENV").unwrap();

        assert_eq!(config.summary.top_n, 3);
        assert_eq!(config.feeds.timeout_ms, 750);

        std::env::remove_var("COUNTRY_CACHE_TEST_ENV__SUMMARY__TOP_N");
        std::env::remove_var("COUNTRY_CACHE_TEST_ENV__FEEDS__TIMEOUT_MS");
    }

    #[test]
    fn test_written_config_loads_back() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("country_cache.toml");

        let mut written = CacheServiceConfig::default();
        written.summary.top_n = 10;
        written.store.persist_to_disk = false;
        fs::write(&config_path, toml::to_string_pretty(&written).unwrap()).unwrap();

        let loaded =
            CacheServiceConfig::load_with_prefix(Some(&config_path), "COUNTRY_CACHE_TEST_WRITTEN")
                .unwrap();
        assert_eq!(loaded.summary.top_n, 10);
        assert!(!loaded.store.persist_to_disk);
        assert_eq!(loaded.feeds.user_agent, written.feeds.user_agent);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(
            CacheServiceConfig::load_with_prefix(Some(&missing), "COUNTRY_CACHE_TEST_MISSING")
                .is_err()
        );
    }

    #[test]
    fn test_validation_rejects_zero_values() {
        let mut config = CacheServiceConfig::default();
        config.feeds.timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = CacheServiceConfig::default();
        config.summary.top_n = 0;
        assert!(config.validate().is_err());

        let mut config = CacheServiceConfig::default();
        config.feeds.reference_data_url = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_expand_env_vars_in_paths() {
        std::env::set_var("COUNTRY_CACHE_TEST_DIR", "/srv/countries");

        let mut config = CacheServiceConfig::default();
        config.store.data_dir = PathBuf::from("$COUNTRY_CACHE_TEST_DIR/store");
        config.expand_env_vars().unwrap();

        assert_eq!(config.store.data_dir, PathBuf::from("/srv/countries/store"));
        std::env::remove_var("COUNTRY_CACHE_TEST_DIR");
    }
}
