//! In-Memory Session Store Adapter
//!
//! Keeps sessions in a process-local map. Expiry is computed from the
//! injected clock, so tests can move time forward deterministically.
//! Suitable for single-instance deployments and tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::domain::foundation::{Timestamp, UserKey};
use crate::domain::intake::Session;
use crate::ports::{Clock, SessionStore, SessionStoreError};

#[derive(Debug, Clone)]
struct StoredSession {
    session: Session,
    version: u64,
    expires_at: Timestamp,
}

/// In-memory storage for intake sessions
#[derive(Clone)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<UserKey, StoredSession>>>,
    clock: Arc<dyn Clock>,
}

impl InMemorySessionStore {
    /// Create a new in-memory store using the given clock for expiry
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            clock,
        }
    }

    /// Number of stored entries, expired ones included
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Returns true if nothing is stored
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Clear all stored sessions (useful for tests)
    pub async fn clear(&self) {
        self.sessions.write().await.clear();
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, user: &UserKey) -> Result<Option<Session>, SessionStoreError> {
        let now = self.clock.now();
        let mut sessions = self.sessions.write().await;

        match sessions.get(user) {
            Some(stored) if now.is_before(&stored.expires_at) => {
                let mut session = stored.session.clone();
                session.version = stored.version;
                Ok(Some(session))
            }
            Some(_) => {
                sessions.remove(user);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn put(
        &self,
        user: &UserKey,
        session: &Session,
        ttl: Duration,
    ) -> Result<u64, SessionStoreError> {
        let now = self.clock.now();
        let mut sessions = self.sessions.write().await;

        let current = sessions
            .get(user)
            .filter(|stored| now.is_before(&stored.expires_at))
            .map(|stored| stored.version);

        if current.unwrap_or(0) != session.version {
            return Err(SessionStoreError::VersionConflict {
                user: user.clone(),
                expected: session.version,
                found: current,
            });
        }

        let version = session.version + 1;
        let expires_at = now.plus_secs(ttl.as_secs());
        let mut session = session.clone();
        session.version = version;
        session.expires_at = expires_at;

        sessions.insert(
            user.clone(),
            StoredSession {
                session,
                version,
                expires_at,
            },
        );
        Ok(version)
    }

    async fn delete(&self, user: &UserKey) -> Result<(), SessionStoreError> {
        self.sessions.write().await.remove(user);
        Ok(())
    }
}
