//! Error types for the intake domain.

/// Retryable failure to turn raw input into a field value.
///
/// Every variant leaves the session untouched; the caller re-asks the
/// same field.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum ResolveError {
    #[error("{label}: {reason}")]
    Invalid { label: String, reason: String },

    #[error("Invalid number: {selection}. Please use numbers between 1 and {max}")]
    OutOfRange { selection: String, max: usize },

    #[error("{label}: '{input}' was not found")]
    NotFound { label: String, input: String },

    #[error("{label}: '{input}' matches several options: {}", .matches.join(", "))]
    Ambiguous {
        label: String,
        input: String,
        matches: Vec<String>,
    },
}

impl ResolveError {
    pub fn invalid(label: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            label: label.into(),
            reason: reason.into(),
        }
    }

    /// Candidate names offered for disambiguation, if any.
    pub fn disambiguation(&self) -> Option<&[String]> {
        match self {
            Self::Ambiguous { matches, .. } => Some(matches),
            _ => None,
        }
    }
}

/// Violations of the session's structural invariants.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum FlowError {
    #[error("Invalid transition from {from:?} to {to:?}")]
    InvalidTransition { from: String, to: String },

    #[error("No field is awaiting an answer")]
    NothingAwaited,

    #[error("Not collecting a nested group")]
    NotInGroup,

    #[error("Record is not ready for assembly: {0}")]
    NotReady(String),

    #[error("Not updating a record")]
    NotUpdating,
}
