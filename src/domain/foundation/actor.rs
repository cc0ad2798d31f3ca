//! The actor a turn is handled on behalf of.
//!
//! Authentication happens outside this crate. Whatever transport hosts the
//! intake flow populates an [`Actor`] from its own credentials, and the
//! `PermissionChecker` port decides what the actor may do.

use serde::{Deserialize, Serialize};

use super::UserKey;

/// User on whose behalf a turn is processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Key the user's session is stored under.
    pub key: UserKey,

    /// Role names assigned by the host system.
    #[serde(default)]
    pub roles: Vec<String>,
}

impl Actor {
    /// Creates a new actor.
    pub fn new(key: UserKey, roles: Vec<String>) -> Self {
        Self { key, roles }
    }

    /// Returns true if the actor holds the given role (case-insensitive).
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case(role))
    }
}
