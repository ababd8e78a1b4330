//! Configuration loader with layered sources
//!
//! Loads configuration from multiple sources with the following precedence
//! (highest to lowest):
//! 1. Environment variables (SOCIAL_RBAC__*)
//! 2. Configuration file (TOML)
//! 3. Default values

use crate::config::types::{AppConfig, StoreBackend};
use crate::error::ConfigError;
use config::{Config, Environment, File, FileFormat};
use std::path::Path;

/// Default configuration file paths to check (in order)
const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "social-rbac.toml",
    ".social-rbac.toml",
    "~/.config/social-rbac/config.toml",
    "/etc/social-rbac/config.toml",
];

/// Load configuration from a TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from_str(toml_str, FileFormat::Toml))
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    // Seed files are not required to exist when loading from a string
    validate_config_relaxed(&app_config)?;

    Ok(app_config)
}

/// Load configuration from files and environment
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. Defaults come from serde defaults on AppConfig

    // 2. Add configuration file
    if let Some(path) = config_path {
        // Explicit path provided - must exist
        if !Path::new(path).exists() {
            return Err(ConfigError::Load(format!(
                "Configuration file not found: {}",
                path
            )));
        }
        builder = builder.add_source(File::new(path, FileFormat::Toml));
    } else {
        // Try default paths (first existing one wins)
        for path in DEFAULT_CONFIG_PATHS {
            let expanded = shellexpand::tilde(path);
            if Path::new(expanded.as_ref()).exists() {
                builder = builder.add_source(File::new(&expanded, FileFormat::Toml));
                break;
            }
        }
    }

    // 3. Add environment variables with SOCIAL_RBAC prefix
    // e.g., SOCIAL_RBAC__STORE__PATH, SOCIAL_RBAC__LOGGING__LEVEL
    builder = builder.add_source(
        Environment::with_prefix("SOCIAL_RBAC")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    // 4. DATABASE_PATH is honored as a conventional override, below the
    // prefixed variable
    if std::env::var("SOCIAL_RBAC__STORE__PATH").is_err()
        && let Ok(path) = std::env::var("DATABASE_PATH")
    {
        builder = builder
            .set_override("store.path", path)
            .map_err(|e| ConfigError::Load(e.to_string()))?;
    }

    let config = builder
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// Validate configuration values (relaxed - no filesystem checks)
fn validate_config_relaxed(config: &AppConfig) -> Result<(), ConfigError> {
    if config.store.backend == StoreBackend::Sqlite && config.store.path.trim().is_empty() {
        return Err(ConfigError::Missing {
            field: "store.path".to_string(),
        });
    }

    if config.store.fetch_timeout_ms == 0 {
        return Err(ConfigError::Invalid {
            message: "store.fetch_timeout_ms must be greater than 0".to_string(),
        });
    }

    if let Some(rules_file) = &config.seed.rules_file
        && rules_file.trim().is_empty()
    {
        return Err(ConfigError::Invalid {
            message: "seed.rules_file must not be empty when set".to_string(),
        });
    }

    Ok(())
}

/// Validate configuration values
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    validate_config_relaxed(config)?;

    if let Some(rules_file) = &config.seed.rules_file {
        let expanded = shellexpand::tilde(rules_file);
        if !Path::new(expanded.as_ref()).exists() {
            return Err(ConfigError::Invalid {
                message: format!("seed.rules_file not found: {}", rules_file),
            });
        }
    }

    Ok(())
}
