//! Catalog Adapters
//!
//! - **CatalogSchemaProvider** - SchemaProvider backed by a YAML catalog

mod catalog_schema_provider;

pub use catalog_schema_provider::{CatalogError, CatalogSchemaProvider};
