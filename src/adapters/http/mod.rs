//! HTTP adapters - REST API implementations.

pub mod chat;
mod middleware;

pub use chat::{chat_routes, ChatHandlers};
pub use middleware::with_middleware;
