//! HTTP handlers for the chat endpoint.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use super::dto::{ChatRequest, ChatResponse, ErrorResponse};
use crate::application::handlers::{HandleTurnCommand, HandleTurnHandler};
use crate::domain::foundation::{Actor, UserKey};
use crate::ports::SessionStore;

/// Upper bound on one chat message, in bytes.
pub const MAX_MESSAGE_LEN: usize = 4096;

/// Shared state for chat handlers.
#[derive(Clone)]
pub struct ChatHandlers {
    pub turn_handler: Arc<HandleTurnHandler>,
    pub sessions: Arc<dyn SessionStore>,
}

impl ChatHandlers {
    pub fn new(turn_handler: Arc<HandleTurnHandler>, sessions: Arc<dyn SessionStore>) -> Self {
        Self {
            turn_handler,
            sessions,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════

/// POST /api/chat - Handle one chat message
pub async fn post_chat(
    State(handlers): State<ChatHandlers>,
    Json(req): Json<ChatRequest>,
) -> Response {
    let user = match UserKey::new(req.user) {
        Ok(user) => user,
        Err(e) => return bad_request(e.to_string()),
    };
    if req.message.len() > MAX_MESSAGE_LEN {
        return bad_request(format!(
            "Message is longer than {} bytes",
            MAX_MESSAGE_LEN
        ));
    }

    let cmd = HandleTurnCommand {
        actor: Actor::new(user, req.roles),
        message: req.message,
    };
    let reply = handlers.turn_handler.handle(cmd).await;

    (StatusCode::OK, Json(ChatResponse::from(reply))).into_response()
}

/// DELETE /api/chat/:user - Drop a user's in-progress session
pub async fn delete_chat(
    State(handlers): State<ChatHandlers>,
    Path(user): Path<String>,
) -> Response {
    let user = match UserKey::new(user) {
        Ok(user) => user,
        Err(e) => return bad_request(e.to_string()),
    };

    match handlers.sessions.delete(&user).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            tracing::error!(user = %user, error = %e, "Failed to clear session");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::internal("Session store unavailable")),
            )
                .into_response()
        }
    }
}

fn bad_request(message: String) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::bad_request(message)),
    )
        .into_response()
}
