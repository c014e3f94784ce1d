//! # Country Cache Configuration
//!
//! Layered configuration for the country cache service:
//!
//! 1. Built-in defaults ([`CacheServiceConfig::default`])
//! 2. An optional TOML file
//! 3. Environment overrides with the `COUNTRY_CACHE` prefix, sections
//!    separated by `__` (e.g. `COUNTRY_CACHE__FEEDS__TIMEOUT_MS=5000`)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use cache_config::load_config;
//!
//! let config = load_config(None)?;
//! println!("reference feed: {}", config.feeds.reference_data_url);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod service_config;

pub use service_config::{
    load_config, CacheServiceConfig, FeedSettings, LoggingSettings, StoreSettings,
    SummarySettings, ENV_PREFIX,
};
