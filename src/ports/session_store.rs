//! Session Store Port - Interface for per-user intake sessions.
//!
//! Any TTL key-value store satisfies this port. Writes refresh the TTL and
//! are version-checked so two concurrent turns for the same user cannot
//! silently clobber each other.

use async_trait::async_trait;
use std::time::Duration;

use crate::domain::foundation::UserKey;
use crate::domain::intake::Session;

/// Errors that can occur during session store operations
#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    #[error("Session for {user} was modified concurrently (expected version {expected}, found {found:?})")]
    VersionConflict {
        user: UserKey,
        expected: u64,
        found: Option<u64>,
    },

    #[error("Failed to serialize session: {0}")]
    SerializationFailed(String),

    #[error("Failed to deserialize session: {0}")]
    DeserializationFailed(String),

    #[error("Session backend unavailable: {0}")]
    Unavailable(String),
}

/// Port for loading and saving intake sessions
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the live session for a user
    ///
    /// # Returns
    /// `None` if no session exists or it has expired
    async fn get(&self, user: &UserKey) -> Result<Option<Session>, SessionStoreError>;

    /// Save a session and refresh its TTL
    ///
    /// The write succeeds only if the stored version still equals
    /// `session.version` (absent counts as version 0).
    ///
    /// # Returns
    /// The new stored version
    ///
    /// # Errors
    /// Returns `SessionStoreError::VersionConflict` if another write won
    async fn put(
        &self,
        user: &UserKey,
        session: &Session,
        ttl: Duration,
    ) -> Result<u64, SessionStoreError>;

    /// Remove a user's session; removing an absent session succeeds
    async fn delete(&self, user: &UserKey) -> Result<(), SessionStoreError>;
}
