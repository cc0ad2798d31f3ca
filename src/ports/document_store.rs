//! Document Store Port - Persistence and CRUD for records.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::foundation::{RecordId, Timestamp};
use crate::domain::schema::RecordType;

/// A persisted record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: RecordId,
    pub record_type: RecordType,
    /// Display name (the title field, or the id when there is none).
    pub name: String,
    pub data: Map<String, Value>,
    pub modified_at: Timestamp,
}

/// Errors that can occur during document store operations
#[derive(Debug, thiserror::Error)]
pub enum DocumentStoreError {
    #[error("{record_type} '{id}' not found")]
    NotFound { record_type: RecordType, id: String },

    #[error("Invalid document: {0}")]
    Invalid(String),

    #[error("Document backend unavailable: {0}")]
    Unavailable(String),
}

/// Port for reading and writing records
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Returns true if a record matches the id or display name
    async fn exists(&self, record_type: &RecordType, id_or_name: &str)
        -> Result<bool, DocumentStoreError>;

    /// Persists a new record and returns its id
    async fn create(
        &self,
        record_type: &RecordType,
        data: Map<String, Value>,
    ) -> Result<RecordId, DocumentStoreError>;

    /// Loads one record by id or display name
    async fn get(
        &self,
        record_type: &RecordType,
        id_or_name: &str,
    ) -> Result<Option<Document>, DocumentStoreError>;

    /// Merges `changes` into an existing record
    async fn update(
        &self,
        record_type: &RecordType,
        id_or_name: &str,
        changes: Map<String, Value>,
    ) -> Result<Document, DocumentStoreError>;

    /// Removes a record
    async fn delete(&self, record_type: &RecordType, id_or_name: &str)
        -> Result<(), DocumentStoreError>;

    /// Most recently modified records matching every filter, newest first
    async fn list(
        &self,
        record_type: &RecordType,
        filters: &Map<String, Value>,
        limit: usize,
    ) -> Result<Vec<Document>, DocumentStoreError>;

    /// Display names of every record, used as reference options
    async fn list_names(&self, record_type: &RecordType) -> Result<Vec<String>, DocumentStoreError>;
}
