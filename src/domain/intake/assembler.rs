//! Document Assembler boundary.
//!
//! Combines the collected top-level values and subgroup rows into the
//! payload handed to the document store.

use serde_json::{Map, Value};

use super::{FlowError, FlowStage, Session};
use crate::domain::schema::{RecordType, RowData};

/// Payload ready for persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledRecord {
    pub record_type: RecordType,
    pub payload: Map<String, Value>,
}

/// Builds the payload for a session that finished collecting.
///
/// Refuses while anything is still missing or a required subgroup has no
/// rows, whatever the session's state tag claims.
pub fn assemble(session: &Session) -> Result<AssembledRecord, FlowError> {
    if session.stage() != FlowStage::ReadyToAssemble {
        return Err(FlowError::NotReady(format!("stage is {:?}", session.stage())));
    }
    if let Some(field) = session.missing_fields.front() {
        return Err(FlowError::NotReady(format!("field '{}' is missing", field.name)));
    }
    if let Some(group) = session.required_groups.iter().find(|name| {
        session.groups.get(*name).map_or(true, |rows| rows.is_empty())
    }) {
        return Err(FlowError::NotReady(format!("subgroup '{}' has no rows", group)));
    }

    let mut payload: Map<String, Value> = session
        .data
        .iter()
        .map(|(name, value)| (name.clone(), value.to_json()))
        .collect();

    for (name, rows) in &session.groups {
        payload.insert(name.clone(), Value::Array(rows.iter().map(row_to_json).collect()));
    }

    Ok(AssembledRecord {
        record_type: session.record_type.clone(),
        payload,
    })
}

fn row_to_json(row: &RowData) -> Value {
    Value::Object(
        row.iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect(),
    )
}
