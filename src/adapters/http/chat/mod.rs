//! Chat HTTP adapter - the single conversational endpoint.

mod dto;
mod handlers;
mod routes;

pub use dto::{ChatRequest, ChatResponse, ErrorResponse};
pub use handlers::{delete_chat, post_chat, ChatHandlers, MAX_MESSAGE_LEN};
pub use routes::chat_routes;
