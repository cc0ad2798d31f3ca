//! Table-driven PermissionChecker: role -> record type -> operations.
//!
//! A grant on record type `*` applies to every record type. Tables are built
//! in code with [`RolePermissionChecker::grant`] or loaded from YAML:
//!
//! ```yaml
//! roles:
//!   Sales User:
//!     Sales Order: [read, create]
//!     Customer: [read]
//!   System Manager:
//!     "*": [read, create, write, delete]
//! ```

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::domain::foundation::Actor;
use crate::domain::schema::RecordType;
use crate::ports::{Operation, PermissionChecker, PermissionError};

const ANY_RECORD_TYPE: &str = "*";

/// Errors raised while loading a role table
#[derive(Debug, thiserror::Error)]
pub enum RoleTableError {
    #[error("Failed to read role table {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Failed to parse role table: {0}")]
    Parse(String),
}

#[derive(Debug, Deserialize)]
struct RoleTableFile {
    #[serde(default)]
    roles: HashMap<String, HashMap<String, Vec<Operation>>>,
}

/// Grants permissions to roles.
#[derive(Debug, Clone, Default)]
pub struct RolePermissionChecker {
    grants: HashMap<String, HashMap<String, HashSet<Operation>>>,
}

impl RolePermissionChecker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a role table from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RoleTableError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| RoleTableError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// Parse a role table from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, RoleTableError> {
        let file: RoleTableFile =
            serde_yaml::from_str(yaml).map_err(|e| RoleTableError::Parse(e.to_string()))?;

        let checker = file
            .roles
            .iter()
            .flat_map(|(role, by_type)| {
                by_type
                    .iter()
                    .map(move |(record_type, ops)| (role, record_type, ops))
            })
            .fold(Self::new(), |checker, (role, record_type, ops)| {
                checker.grant(role, record_type, ops)
            });
        Ok(checker)
    }

    /// Grants `operations` on `record_type` (or `*`) to `role`.
    pub fn grant(mut self, role: &str, record_type: &str, operations: &[Operation]) -> Self {
        self.grants
            .entry(role.to_lowercase())
            .or_default()
            .entry(record_type.to_lowercase())
            .or_default()
            .extend(operations.iter().copied());
        self
    }

    fn allows(&self, role: &str, record_type: &RecordType, operation: Operation) -> bool {
        let Some(by_type) = self.grants.get(&role.to_lowercase()) else {
            return false;
        };
        [record_type.as_str().to_lowercase(), ANY_RECORD_TYPE.to_string()]
            .iter()
            .filter_map(|key| by_type.get(key))
            .any(|ops| ops.contains(&operation))
    }
}

#[async_trait]
impl PermissionChecker for RolePermissionChecker {
    async fn can(
        &self,
        actor: &Actor,
        record_type: &RecordType,
        operation: Operation,
    ) -> Result<bool, PermissionError> {
        Ok(actor
            .roles
            .iter()
            .any(|role| self.allows(role, record_type, operation)))
    }
}
