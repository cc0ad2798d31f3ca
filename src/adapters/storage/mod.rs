//! Session Store Adapters
//!
//! Implementations of the SessionStore port.
//!
//! ## Available Adapters
//!
//! - **InMemorySessionStore** - Process-local map (single instance, tests)
//! - **RedisSessionStore** - Redis with TTL and compare-and-set writes
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::storage::{InMemorySessionStore, RedisSessionStore};
//!
//! // Production: shared Redis
//! let store = RedisSessionStore::connect("redis://localhost:6379", "nexchat_state").await?;
//!
//! // Testing: in-memory with a manual clock
//! let store = InMemorySessionStore::new(Arc::new(ManualClock::new(start)));
//! ```

mod in_memory_session_store;
mod redis_session_store;

pub use in_memory_session_store::InMemorySessionStore;
pub use redis_session_store::RedisSessionStore;
