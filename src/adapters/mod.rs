//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the intake flow to external systems:
//! - `catalog` - Schema metadata from a YAML catalog
//! - `clock` - System and manual clocks
//! - `document` - Record persistence
//! - `http` - The chat endpoint
//! - `intent` - Keyword, LLM and mock intent parsers
//! - `permissions` - Stub and role-table permission checkers
//! - `presenter` - Prompt rendering
//! - `storage` - Session stores (in-memory, Redis)

pub mod catalog;
pub mod clock;
pub mod document;
pub mod http;
pub mod intent;
pub mod permissions;
pub mod presenter;
pub mod storage;
