//! Permission Checker Port - What an actor may do with a record type.
//!
//! Implementations are fail-secure: callers treat any error as a denial.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::Actor;
use crate::domain::schema::RecordType;

/// Operations that can be permitted on a record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Read,
    Create,
    Write,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operation::Read => "read",
            Operation::Create => "create",
            Operation::Write => "write",
            Operation::Delete => "delete",
        };
        write!(f, "{}", s)
    }
}

/// Errors raised by permission backends
#[derive(Debug, thiserror::Error)]
pub enum PermissionError {
    #[error("Permission backend unavailable: {0}")]
    Unavailable(String),
}

/// Port for checking record-level permissions
#[async_trait]
pub trait PermissionChecker: Send + Sync {
    /// Returns true if the actor may perform `operation` on `record_type`
    async fn can(
        &self,
        actor: &Actor,
        record_type: &RecordType,
        operation: Operation,
    ) -> Result<bool, PermissionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_serializes_to_snake_case() {
        assert_eq!(serde_json::to_string(&Operation::Write).unwrap(), "\"write\"");
        let op: Operation = serde_json::from_str("\"delete\"").unwrap();
        assert_eq!(op, Operation::Delete);
    }

    #[test]
    fn operation_displays_lowercase() {
        assert_eq!(Operation::Create.to_string(), "create");
    }
}
