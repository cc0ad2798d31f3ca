//! Session and flow configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

const MAX_TTL_SECS: u64 = 24 * 60 * 60;

/// Where sessions are kept
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    #[default]
    Memory,
    Redis,
}

/// Session configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Idle lifetime of an intake session, in seconds
    #[serde(default = "default_ttl")]
    pub ttl_secs: u64,

    #[serde(default)]
    pub backend: SessionBackend,

    /// Redis key prefix; keys are `{prefix}:{user}`
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Records shown for list commands
    #[serde(default = "default_list_limit")]
    pub list_limit: usize,

    /// Candidates listed per prompt
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl SessionConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Validate session configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.ttl_secs == 0 || self.ttl_secs > MAX_TTL_SECS {
            return Err(ValidationError::InvalidSessionTtl);
        }
        if self.key_prefix.trim().is_empty() {
            return Err(ValidationError::EmptyKeyPrefix);
        }
        if self.list_limit == 0 || self.list_limit > 100 {
            return Err(ValidationError::InvalidListLimit);
        }
        if self.page_size == 0 || self.page_size > 100 {
            return Err(ValidationError::InvalidPageSize);
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl(),
            backend: SessionBackend::default(),
            key_prefix: default_key_prefix(),
            list_limit: default_list_limit(),
            page_size: default_page_size(),
        }
    }
}

fn default_ttl() -> u64 {
    600
}

fn default_key_prefix() -> String {
    "nexchat_state".to_string()
}

fn default_list_limit() -> usize {
    10
}

fn default_page_size() -> usize {
    10
}
