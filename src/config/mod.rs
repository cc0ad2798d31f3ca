//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables use the `NEXCHAT` prefix and
//! nested values are separated by a double underscore.
//!
//! # Example
//!
//! ```no_run
//! use nexchat::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {:?}", config.server.socket_addr());
//! ```

mod catalog;
mod error;
mod intent;
mod permissions;
mod redis;
mod server;
mod session;

pub use catalog::CatalogConfig;
pub use error::{ConfigError, ValidationError};
pub use intent::{IntentConfig, IntentProvider};
pub use permissions::PermissionsConfig;
pub use redis::RedisConfig;
pub use server::{LogFormat, ServerConfig};
pub use session::{SessionBackend, SessionConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Every section has defaults, so an empty environment yields a working
/// development setup (in-memory sessions, keyword intent parser).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Listener and log settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Session lifetime and backend
    #[serde(default)]
    pub session: SessionConfig,

    /// Redis connection (session backend `redis`)
    #[serde(default)]
    pub redis: RedisConfig,

    /// Intent parser selection
    #[serde(default)]
    pub intent: IntentConfig,

    /// Record type catalog
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Permission checker selection
    #[serde(default)]
    pub permissions: PermissionsConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `NEXCHAT` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `NEXCHAT__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `NEXCHAT__SESSION__TTL_SECS=600` -> `session.ttl_secs = 600`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("NEXCHAT")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// Redis is only checked when it is the session backend.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.session.validate()?;
        if self.session.backend == SessionBackend::Redis {
            self.redis.validate()?;
        }
        self.intent.validate()?;
        self.catalog.validate()?;
        self.permissions.validate()?;
        Ok(())
    }
}
