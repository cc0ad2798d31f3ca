//! Starting a create flow from a parsed intent.
//!
//! Values supplied with the command go through the same resolver as typed
//! answers. Whatever is still missing afterwards is asked one field at a
//! time; a fully specified command creates the record in the same turn.

use serde_json::{Map, Value};

use super::handle_turn::{HandleTurnHandler, TurnReply};
use super::TurnError;
use crate::domain::foundation::Actor;
use crate::domain::intake::Session;
use crate::domain::intent::IntentRequest;
use crate::domain::schema::{FieldDescriptor, RecordType, RowData, SubgroupDescriptor};
use crate::ports::Operation;

/// Raw text for a supplied JSON value, if it is a scalar.
fn as_raw_input(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("yes".to_string()),
        Value::Bool(false) => Some("no".to_string()),
        _ => None,
    }
}

fn normalize_key(key: &str) -> String {
    key.trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// Value supplied for `field`, looked up by name or label.
fn supplied<'a>(data: &'a Map<String, Value>, field: &FieldDescriptor) -> Option<&'a Value> {
    data.get(&field.name).or_else(|| {
        data.iter()
            .find(|(key, _)| {
                normalize_key(key) == field.name || key.trim().eq_ignore_ascii_case(&field.label)
            })
            .map(|(_, value)| value)
    })
}

impl HandleTurnHandler {
    pub(super) async fn start_create(
        &self,
        actor: &Actor,
        request: IntentRequest,
    ) -> Result<TurnReply, TurnError> {
        let Some(record_type) = request.record_type.clone() else {
            return Ok(TurnReply::answered(
                "What would you like to create? Type \"help\" to see the record types.",
            ));
        };
        for operation in [Operation::Read, Operation::Create] {
            if !self.ports.permissions.can(actor, &record_type, operation).await? {
                tracing::info!(record_type = %record_type, %operation, "Create denied");
                return Ok(TurnReply::denied(&record_type, operation));
            }
        }

        let mut session = Session::new(
            actor.key.clone(),
            record_type.clone(),
            self.ports.clock.now(),
            self.config.session_ttl.as_secs(),
        );
        let mut rejected = Vec::new();

        for field in self.ports.schema.required_fields(&record_type).await? {
            let raw = supplied(&request.data, &field)
                .and_then(as_raw_input)
                .or_else(|| field.default.clone());

            let Some(raw) = raw else {
                session.require_field(field);
                continue;
            };
            match self.resolve_answer(&record_type, &field, &raw, None).await? {
                Ok(value) => session.prefill(field.name.clone(), value),
                Err(err) => {
                    if field.default.as_deref() != Some(raw.as_str()) {
                        rejected.push(err.to_string());
                    }
                    session.require_field(field);
                }
            }
        }

        for field in self.ports.schema.optional_fields(&record_type).await? {
            let Some(raw) = supplied(&request.data, &field).and_then(as_raw_input) else {
                continue;
            };
            match self.resolve_answer(&record_type, &field, &raw, None).await? {
                Ok(value) => session.prefill(field.name.clone(), value),
                Err(err) => rejected.push(format!("{} (skipped, optional)", err)),
            }
        }

        for subgroup in self.ports.schema.required_subgroups(&record_type).await? {
            if let Some(Value::Array(rows)) = request.data.get(&subgroup.name) {
                let rows = self.resolve_rows(&subgroup, rows, &mut rejected).await?;
                if !rows.is_empty() {
                    session.prefill_rows(subgroup.name.clone(), rows);
                }
            }
            session.require_group(subgroup);
        }

        tracing::info!(
            record_type = %record_type,
            missing = session.missing_fields.len(),
            pending_groups = session.pending_groups.len(),
            "Create flow started"
        );

        let mut preface = format!("Creating a new {}.", record_type);
        if !rejected.is_empty() {
            preface.push_str("\nSome values could not be used:");
            for reason in &rejected {
                preface.push_str(&format!("\n- {}", reason));
            }
        }
        self.advance(session, Some(preface)).await
    }

    /// Keeps the supplied rows whose required fields all resolve.
    async fn resolve_rows(
        &self,
        subgroup: &SubgroupDescriptor,
        rows: &[Value],
        rejected: &mut Vec<String>,
    ) -> Result<Vec<RowData>, TurnError> {
        let row_type: &RecordType = &subgroup.row_type;
        let row_fields = self.ports.schema.required_fields(row_type).await?;
        let mut accepted = Vec::new();

        'rows: for (index, row) in rows.iter().enumerate() {
            let Some(row) = row.as_object() else {
                rejected.push(format!("{} row {}: not a set of fields", subgroup.label, index + 1));
                continue;
            };

            let mut data = RowData::new();
            for field in &row_fields {
                let raw = supplied(row, field)
                    .and_then(as_raw_input)
                    .or_else(|| field.default.clone());
                let Some(raw) = raw else {
                    rejected.push(format!(
                        "{} row {}: {} is missing",
                        subgroup.label,
                        index + 1,
                        field.label
                    ));
                    continue 'rows;
                };
                match self.resolve_answer(row_type, field, &raw, None).await? {
                    Ok(value) => {
                        data.insert(field.name.clone(), value);
                    }
                    Err(err) => {
                        rejected.push(format!("{} row {}: {}", subgroup.label, index + 1, err));
                        continue 'rows;
                    }
                }
            }
            accepted.push(data);
        }
        Ok(accepted)
    }
}
