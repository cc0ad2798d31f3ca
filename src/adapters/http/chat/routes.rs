//! Route definitions for the chat endpoint.

use axum::{
    routing::{delete, post},
    Router,
};

use super::handlers::{delete_chat, post_chat, ChatHandlers};

/// Creates the chat router.
///
/// # Routes
///
/// - `POST /api/chat` - Handle one message
/// - `DELETE /api/chat/:user` - Clear the user's session
pub fn chat_routes(handlers: ChatHandlers) -> Router {
    Router::new()
        .route("/api/chat", post(post_chat))
        .route("/api/chat/:user", delete(delete_chat))
        .with_state(handlers)
}
