//! Configuration types for social-rbac
//!
//! This module defines the configuration structure that can be loaded from
//! TOML files and/or environment variables.

use serde::Deserialize;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Rule store settings
    pub store: StoreConfig,

    /// Rule seeding settings
    pub seed: SeedConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Rule store configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Storage backend
    pub backend: StoreBackend,

    /// Database file (sqlite backend)
    pub path: String,

    /// Upper bound on a single rule fetch, in milliseconds
    pub fetch_timeout_ms: u64,

    /// Wrap the store in a read-through rule cache
    pub cache: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Sqlite,
            path: "social-rbac.db".to_string(),
            fetch_timeout_ms: 2000,
            cache: false,
        }
    }
}

impl StoreConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}

/// Rule store backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// SQLite database file (default)
    #[default]
    Sqlite,
    /// Process-local table, lost on exit
    Memory,
}

/// Rule seeding configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    /// TOML file with `[[rules]]` entries; the built-in set is used if unset
    pub rules_file: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Output format (pretty, json)
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output
    #[default]
    Pretty,
    /// JSON structured output
    Json,
}
