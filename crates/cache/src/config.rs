//! Cache configuration types and builder patterns
//!
//! [`CacheConfig`] sizes a cache, optionally sets its expiration window and
//! names it for logging. It can be built in code through presets or the
//! fluent [`CacheConfigBuilder`], or loaded from TOML/JSON where the window
//! is written in milliseconds (`expiration_ms`).

use std::time::Duration;

use orderly_common::option_duration_millis;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Capacity used when a configuration document omits one.
pub const DEFAULT_CAPACITY: usize = 100;

/// Configuration for cache behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of cached entries
    pub capacity: usize,

    /// Expiration window for entries (None = entries never expire)
    ///
    /// Only honoured by timed caches.
    #[serde(
        rename = "expiration_ms",
        with = "option_duration_millis",
        skip_serializing_if = "Option::is_none"
    )]
    pub expiration: Option<Duration>,

    /// Name recorded on every tracing span of the cache
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Whether to collect access metrics
    pub track_metrics: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { capacity: DEFAULT_CAPACITY, expiration: None, name: None, track_metrics: false }
    }
}

impl CacheConfig {
    /// Create a new configuration builder
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::default()
    }

    /// Quick preset for a plain LRU cache
    ///
    /// # Example
    /// ```
    /// use orderly_cache::CacheConfig;
    ///
    /// let config = CacheConfig::lru(1000);
    /// assert_eq!(config.capacity, 1000);
    /// ```
    pub fn lru(capacity: usize) -> Self {
        Self { capacity, ..Self::default() }
    }

    /// Quick preset for a timed LRU cache
    ///
    /// # Example
    /// ```
    /// use std::time::Duration;
    ///
    /// use orderly_cache::CacheConfig;
    ///
    /// let config = CacheConfig::timed(1000, Duration::from_secs(60));
    /// assert_eq!(config.expiration, Some(Duration::from_secs(60)));
    /// ```
    pub fn timed(capacity: usize, expiration: Duration) -> Self {
        Self { capacity, expiration: Some(expiration), ..Self::default() }
    }

    /// Checks that the configuration describes a usable cache.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(())
    }

    /// Label used in log output: the configured name or `"lru"`.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("lru")
    }

    /// Parses and validates a TOML document.
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use orderly_cache::CacheConfig;
    ///
    /// let config = CacheConfig::from_toml_str("capacity = 3\nexpiration_ms = 250").unwrap();
    /// assert_eq!(config.expiration, Some(Duration::from_millis(250)));
    /// ```
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parses and validates a JSON document.
    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

/// Builder for CacheConfig with fluent API
#[derive(Debug, Default)]
pub struct CacheConfigBuilder {
    config: CacheConfig,
}

impl CacheConfigBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum number of entries
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.config.capacity = capacity;
        self
    }

    /// Set the expiration window for entries
    pub fn expiration(mut self, window: Duration) -> Self {
        self.config.expiration = Some(window);
        self
    }

    /// Set the name recorded in tracing spans
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = Some(name.into());
        self
    }

    /// Enable or disable metrics tracking
    pub fn track_metrics(mut self, enabled: bool) -> Self {
        self.config.track_metrics = enabled;
        self
    }

    /// Build the configuration
    pub fn build(self) -> CacheConfig {
        self.config
    }
}
