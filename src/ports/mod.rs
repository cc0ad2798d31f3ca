//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the intake state machine and its collaborators. Adapters implement
//! these ports.
//!
//! ## Collaborator Ports
//!
//! - `SessionStore` - TTL-bound per-user session storage
//! - `SchemaProvider` - Record type metadata
//! - `PermissionChecker` - Record-level permissions
//! - `DocumentStore` - Record persistence and CRUD
//! - `IntentParser` - Free text to structured command
//!
//! ## Local Ports
//!
//! - `FieldPresenter` - Prompt rendering
//! - `Clock` - Current time

mod clock;
mod document_store;
mod field_presenter;
mod intent_parser;
mod permission_checker;
mod schema_provider;
mod session_store;

pub use clock::Clock;
pub use document_store::{Document, DocumentStore, DocumentStoreError};
pub use field_presenter::{FieldPresenter, GroupIntro, GroupPosition, Prompt, PromptContext};
pub use intent_parser::{IntentError, IntentParser};
pub use permission_checker::{Operation, PermissionChecker, PermissionError};
pub use schema_provider::{SchemaError, SchemaProvider};
pub use session_store::{SessionStore, SessionStoreError};
