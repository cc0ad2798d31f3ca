//! Errors that end a turn.

use crate::domain::intake::FlowError;
use crate::ports::{
    DocumentStoreError, IntentError, PermissionError, SchemaError, SessionStoreError,
};

/// Unrecoverable failure of one turn.
///
/// Resolver failures never show up here; they are re-prompted in place.
#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    /// Schema, permission, document or intent collaborator failed.
    #[error("Collaborator failed: {0}")]
    Collaborator(String),

    #[error("Session storage failed: {0}")]
    Storage(String),

    /// Another writer stored the session first.
    #[error("Session was modified concurrently")]
    Conflict,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TurnError {
    /// Whether the stored session must be discarded.
    pub fn discards_session(&self) -> bool {
        !matches!(self, TurnError::Conflict)
    }
}

impl From<SchemaError> for TurnError {
    fn from(err: SchemaError) -> Self {
        TurnError::Collaborator(err.to_string())
    }
}

impl From<PermissionError> for TurnError {
    fn from(err: PermissionError) -> Self {
        TurnError::Collaborator(err.to_string())
    }
}

impl From<DocumentStoreError> for TurnError {
    fn from(err: DocumentStoreError) -> Self {
        TurnError::Collaborator(err.to_string())
    }
}

impl From<IntentError> for TurnError {
    fn from(err: IntentError) -> Self {
        TurnError::Collaborator(err.to_string())
    }
}

impl From<SessionStoreError> for TurnError {
    fn from(err: SessionStoreError) -> Self {
        match err {
            SessionStoreError::VersionConflict { .. } => TurnError::Conflict,
            other => TurnError::Storage(other.to_string()),
        }
    }
}

impl From<FlowError> for TurnError {
    fn from(err: FlowError) -> Self {
        TurnError::Internal(err.to_string())
    }
}
