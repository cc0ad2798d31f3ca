//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid socket address: {0}")]
    InvalidAddress(String),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Session TTL must be between 1 second and 1 day")]
    InvalidSessionTtl,

    #[error("Session key prefix cannot be empty")]
    EmptyKeyPrefix,

    #[error("Invalid Redis URL format")]
    InvalidRedisUrl,

    #[error("Invalid intent parser base URL")]
    InvalidBaseUrl,

    #[error("List limit must be between 1 and 100")]
    InvalidListLimit,

    #[error("Prompt page size must be between 1 and 100")]
    InvalidPageSize,
}
