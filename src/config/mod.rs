//! Configuration module
//!
//! Store, seed and logging settings, layered from defaults, a TOML file
//! and `SOCIAL_RBAC__*` environment variables.

pub mod loader;
pub mod types;

pub use loader::{load_config, load_config_from_str};
pub use types::*;
