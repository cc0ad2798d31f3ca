//! Document Store Adapters
//!
//! - **InMemoryDocumentStore** - Records kept in process memory

mod in_memory_document_store;

pub use in_memory_document_store::InMemoryDocumentStore;
