//! Redis-backed session store for multi-server deployments.
//!
//! Each session is a JSON string under `{prefix}:{user}` with `EX ttl`.
//! Writes go through a Lua script that compares the stored version with
//! the expected one and sets the new value atomically.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Script};
use std::time::Duration;

use crate::domain::foundation::UserKey;
use crate::domain::intake::Session;
use crate::ports::{SessionStore, SessionStoreError};

/// Compare-and-set on the `version` field of the stored JSON.
///
/// Returns `{1, new_version}` on success, `{0, found}` on conflict where
/// `found` is -1 when no session is stored.
const CAS_SCRIPT: &str = r#"
local current = redis.call('GET', KEYS[1])
local expected = tonumber(ARGV[1])
local found = -1
if current then
  found = tonumber(cjson.decode(current)['version']) or 0
end
if (current and found ~= expected) or ((not current) and expected ~= 0) then
  return {0, found}
end
redis.call('SET', KEYS[1], ARGV[2], 'EX', tonumber(ARGV[3]))
return {1, expected + 1}
"#;

/// Redis-backed session store.
#[derive(Clone)]
pub struct RedisSessionStore {
    conn: MultiplexedConnection,
    key_prefix: String,
    cas: Script,
}

impl RedisSessionStore {
    /// Create a store over an existing connection.
    pub fn new(conn: MultiplexedConnection, key_prefix: impl Into<String>) -> Self {
        Self {
            conn,
            key_prefix: key_prefix.into(),
            cas: Script::new(CAS_SCRIPT),
        }
    }

    /// Open a multiplexed connection and create a store over it.
    pub async fn connect(url: &str, key_prefix: impl Into<String>) -> Result<Self, SessionStoreError> {
        let client = redis::Client::open(url)
            .map_err(|e: redis::RedisError| SessionStoreError::Unavailable(e.to_string()))?;
        let conn = client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(|e: redis::RedisError| SessionStoreError::Unavailable(e.to_string()))?;
        Ok(Self::new(conn, key_prefix))
    }

    fn key_for(&self, user: &UserKey) -> String {
        session_key(&self.key_prefix, user)
    }
}

fn session_key(prefix: &str, user: &UserKey) -> String {
    format!("{}:{}", prefix, user.as_str())
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn get(&self, user: &UserKey) -> Result<Option<Session>, SessionStoreError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn
            .get(self.key_for(user))
            .await
            .map_err(|e: redis::RedisError| SessionStoreError::Unavailable(e.to_string()))?;

        raw.map(|json| {
            serde_json::from_str::<Session>(&json)
                .map_err(|e| SessionStoreError::DeserializationFailed(e.to_string()))
        })
        .transpose()
    }

    async fn put(
        &self,
        user: &UserKey,
        session: &Session,
        ttl: Duration,
    ) -> Result<u64, SessionStoreError> {
        let expected = session.version;
        let mut stored = session.clone();
        stored.version = expected + 1;
        let json = serde_json::to_string(&stored)
            .map_err(|e| SessionStoreError::SerializationFailed(e.to_string()))?;

        let mut conn = self.conn.clone();
        let (ok, version): (i64, i64) = self
            .cas
            .key(self.key_for(user))
            .arg(expected)
            .arg(json)
            .arg(ttl.as_secs().max(1))
            .invoke_async(&mut conn)
            .await
            .map_err(|e: redis::RedisError| SessionStoreError::Unavailable(e.to_string()))?;

        if ok == 1 {
            Ok(version as u64)
        } else {
            Err(SessionStoreError::VersionConflict {
                user: user.clone(),
                expected,
                found: u64::try_from(version).ok(),
            })
        }
    }

    async fn delete(&self, user: &UserKey) -> Result<(), SessionStoreError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(self.key_for(user))
            .await
            .map_err(|e: redis::RedisError| SessionStoreError::Unavailable(e.to_string()))
    }
}
