//! Schema Provider Port - Metadata about record types.
//!
//! Isolates every record-type-specific detail (which fields are required,
//! which subgroups repeat) from the intake state machine.

use async_trait::async_trait;

use crate::domain::schema::{FieldDescriptor, RecordType, SubgroupDescriptor};

/// Errors that can occur while looking up schema metadata
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Unknown record type: {0}")]
    UnknownRecordType(String),

    #[error("Record type {record_type} has no subgroup '{subgroup}'")]
    UnknownSubgroup {
        record_type: RecordType,
        subgroup: String,
    },

    #[error("Schema source unavailable: {0}")]
    Unavailable(String),
}

/// Port for enumerating fields and subgroups of record types
#[async_trait]
pub trait SchemaProvider: Send + Sync {
    /// All record types known to the provider
    async fn record_types(&self) -> Result<Vec<RecordType>, SchemaError>;

    /// Scalar fields that must have a value, in asking order
    async fn required_fields(
        &self,
        record_type: &RecordType,
    ) -> Result<Vec<FieldDescriptor>, SchemaError>;

    /// Scalar fields that may be left empty
    async fn optional_fields(
        &self,
        record_type: &RecordType,
    ) -> Result<Vec<FieldDescriptor>, SchemaError>;

    /// Subgroups that need at least one row
    async fn required_subgroups(
        &self,
        record_type: &RecordType,
    ) -> Result<Vec<SubgroupDescriptor>, SchemaError>;

    /// Record type describing one row of a subgroup
    async fn subgroup_row_type(
        &self,
        record_type: &RecordType,
        subgroup: &str,
    ) -> Result<RecordType, SchemaError>;

    /// Resolves a free-form name to a known record type (case-insensitive)
    async fn find_record_type(&self, name: &str) -> Result<Option<RecordType>, SchemaError> {
        Ok(self
            .record_types()
            .await?
            .into_iter()
            .find(|rt| rt.matches(name)))
    }
}
