//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors, state machine)
//! - `schema` - Record types, field descriptors and typed values
//! - `intake` - The guided collection state machine
//! - `intent` - Structured commands produced by the intent parser

pub mod foundation;
pub mod intake;
pub mod intent;
pub mod schema;
