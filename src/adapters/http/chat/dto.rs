//! Data transfer objects for the chat endpoint.

use serde::{Deserialize, Serialize};

use crate::application::handlers::TurnReply;

// ════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Request to handle one chat message.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    /// Key of the user sending the message (typically an email).
    pub user: String,
    /// Roles used for permission checks.
    #[serde(default)]
    pub roles: Vec<String>,
    pub message: String,
}

// ════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Reply to one chat message.
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
}

impl From<TurnReply> for ChatResponse {
    fn from(reply: TurnReply) -> Self {
        let record_id = match &reply.outcome {
            crate::application::handlers::TurnOutcome::Created { id } => Some(id.to_string()),
            _ => None,
        };
        Self {
            outcome: reply.outcome.as_str().to_string(),
            response: reply.text,
            record_id,
        }
    }
}

/// Standard error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            code: "BAD_REQUEST".to_string(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            code: "INTERNAL_ERROR".to_string(),
            message: message.into(),
        }
    }
}
