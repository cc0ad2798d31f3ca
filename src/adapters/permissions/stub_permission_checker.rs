//! Stub implementation of PermissionChecker for development and testing.
//!
//! # Usage
//!
//! ```ignore
//! use nexchat::adapters::permissions::StubPermissionChecker;
//!
//! let checker = StubPermissionChecker::allowing();
//! // Or to exercise denial paths:
//! let checker = StubPermissionChecker::denying().allow(Operation::Read);
//! ```

use async_trait::async_trait;
use std::collections::HashSet;

use crate::domain::foundation::Actor;
use crate::domain::schema::RecordType;
use crate::ports::{Operation, PermissionChecker, PermissionError};

/// Stub PermissionChecker with a fixed answer per operation.
#[derive(Debug, Clone)]
pub struct StubPermissionChecker {
    allowed: HashSet<Operation>,
    unavailable: bool,
}

impl Default for StubPermissionChecker {
    fn default() -> Self {
        Self::allowing()
    }
}

impl StubPermissionChecker {
    /// Create a stub that allows every operation.
    pub fn allowing() -> Self {
        Self {
            allowed: [
                Operation::Read,
                Operation::Create,
                Operation::Write,
                Operation::Delete,
            ]
            .into_iter()
            .collect(),
            unavailable: false,
        }
    }

    /// Create a stub that denies every operation.
    pub fn denying() -> Self {
        Self {
            allowed: HashSet::new(),
            unavailable: false,
        }
    }

    /// Create a stub whose backend always errors.
    pub fn unavailable() -> Self {
        Self {
            allowed: HashSet::new(),
            unavailable: true,
        }
    }

    /// Additionally allow one operation.
    pub fn allow(mut self, operation: Operation) -> Self {
        self.allowed.insert(operation);
        self
    }
}

#[async_trait]
impl PermissionChecker for StubPermissionChecker {
    async fn can(
        &self,
        _actor: &Actor,
        _record_type: &RecordType,
        operation: Operation,
    ) -> Result<bool, PermissionError> {
        if self.unavailable {
            return Err(PermissionError::Unavailable("stub backend offline".to_string()));
        }
        Ok(self.allowed.contains(&operation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserKey;

    fn actor() -> Actor {
        Actor::new(UserKey::new("ana@example.com").unwrap(), vec![])
    }

    fn customer() -> RecordType {
        RecordType::new("Customer").unwrap()
    }

    #[tokio::test]
    async fn allowing_grants_everything() {
        let checker = StubPermissionChecker::allowing();
        assert!(checker.can(&actor(), &customer(), Operation::Delete).await.unwrap());
    }

    #[tokio::test]
    async fn denying_with_read_allows_only_read() {
        let checker = StubPermissionChecker::denying().allow(Operation::Read);
        assert!(checker.can(&actor(), &customer(), Operation::Read).await.unwrap());
        assert!(!checker.can(&actor(), &customer(), Operation::Create).await.unwrap());
    }

    #[tokio::test]
    async fn unavailable_returns_error() {
        let checker = StubPermissionChecker::unavailable();
        assert!(checker.can(&actor(), &customer(), Operation::Read).await.is_err());
    }
}
