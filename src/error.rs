//! Error types for social-rbac
//!
//! This module defines the error hierarchy used throughout the crate.
//! Authorization outcomes (`AccessError`) are kept apart from persistence
//! failures (`StoreError`) so callers can map each to its own response.

use crate::access_control::types::{Action, ObjectType, RuleKey};
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Rule store error: {0}")]
    Store(#[from] StoreError),

    #[error("Access error: {0}")]
    Access(#[from] AccessError),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {field}")]
    Missing { field: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Rule store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Rule not found: {key}")]
    NotFound { key: RuleKey },

    /// Unique-key or other constraint conflict raised by the data layer
    #[error("Integrity violation: {message}")]
    IntegrityViolation { message: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Rule fetch timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    #[error("Corrupt rule row: {0}")]
    Corrupt(String),

    #[error("Invalid seed: {0}")]
    Seed(String),

    #[error("Background task failed: {0}")]
    Task(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Map a rusqlite error, lifting constraint failures to `IntegrityViolation`
    pub fn from_sqlite(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, message)
                if code.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                StoreError::IntegrityViolation {
                    message: message.clone().unwrap_or_else(|| err.to_string()),
                }
            }
            _ => StoreError::Database(err),
        }
    }
}

/// Authorization errors produced by the decision core
///
/// Each variant is terminal for the current request: none of them is
/// retried automatically.
#[derive(Error, Debug)]
pub enum AccessError {
    /// No actor was supplied where one is required
    #[error("Authentication required")]
    Unauthenticated,

    /// The deployed rule set lacks a required row
    #[error("No rule configured for {key}")]
    RuleNotFound { key: RuleKey },

    /// The rule exists but does not permit the operation
    #[error("Access to operation '{action}' on {object_type} is denied")]
    AccessDenied {
        action: Action,
        object_type: ObjectType,
    },

    /// The rule store could not answer (timeout, database failure)
    #[error("Rule store unavailable: {0}")]
    Unavailable(#[source] StoreError),
}

impl AccessError {
    pub fn denied(action: Action, object_type: ObjectType) -> Self {
        AccessError::AccessDenied {
            action,
            object_type,
        }
    }

    /// Whether this error points at an incomplete rule table rather than
    /// at the caller
    pub fn is_configuration_defect(&self) -> bool {
        matches!(self, AccessError::RuleNotFound { .. })
    }

    /// Whether this error is a policy denial
    pub fn is_denied(&self) -> bool {
        matches!(self, AccessError::AccessDenied { .. })
    }
}

impl From<StoreError> for AccessError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { key } => AccessError::RuleNotFound { key },
            other => AccessError::Unavailable(other),
        }
    }
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias for rule store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type alias for access decisions
pub type AccessResult<T> = std::result::Result<T, AccessError>;
