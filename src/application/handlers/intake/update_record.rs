//! Update flow: change one field of an existing record over two turns.
//!
//! `update customer Acme` asks which field to change, then its new value.
//! Both answers go through the resolver, so numbered options, typos and
//! reference lookups behave as they do while creating. A `field to value`
//! answer to the first question settles both at once.

use serde_json::{Map, Value};

use super::handle_turn::{HandleTurnHandler, TurnReply};
use super::TurnError;
use crate::domain::foundation::Actor;
use crate::domain::intake::{split_assignment, FlowError, PendingPrompt, Session, UpdateContext};
use crate::domain::schema::{FieldDescriptor, RecordType};
use crate::ports::{Document, DocumentStoreError};

impl HandleTurnHandler {
    /// Opens an update flow for `name`; nothing is stored if it is unknown.
    pub(super) async fn start_update(
        &self,
        actor: &Actor,
        record_type: &RecordType,
        name: &str,
    ) -> Result<TurnReply, TurnError> {
        let Some(document) = self.ports.documents.get(record_type, name).await? else {
            return Ok(TurnReply::answered(format!("No {} named '{}'.", record_type, name)));
        };

        let mut fields = self.ports.schema.required_fields(record_type).await?;
        fields.extend(self.ports.schema.optional_fields(record_type).await?);

        let update = UpdateContext::new(document.id.to_string(), document.name.clone(), fields);
        let chooser = update.chooser();
        let session = Session::for_update(
            actor.key.clone(),
            record_type.clone(),
            update,
            self.ports.clock.now(),
            self.config.session_ttl.as_secs(),
        );

        tracing::info!(record_type = %record_type, id = %document.id, "Update flow started");
        let preface = format!("Updating {} {}.", record_type, document.name);
        self.ask_field(session, &chooser, Some(preface)).await
    }

    pub(super) async fn continue_update(
        &self,
        mut session: Session,
        message: &str,
        prompt: Option<PendingPrompt>,
    ) -> Result<TurnReply, TurnError> {
        let update = session.update().cloned().ok_or(FlowError::NotUpdating)?;
        let record_type = session.record_type.clone();

        if let Some(field) = &update.field {
            return match self
                .resolve_answer(&record_type, field, message, prompt.as_ref())
                .await?
            {
                Ok(value) => self.apply_update(session, field, value.to_json()).await,
                Err(err) => self.retry(session, field, err).await,
            };
        }

        if let Some((key, raw)) = split_assignment(message) {
            if let Some(field) = update.find_field(key).cloned() {
                return match self.resolve_answer(&record_type, &field, raw, None).await? {
                    Ok(value) => self.apply_update(session, &field, value.to_json()).await,
                    Err(err) => {
                        session.update_mut()?.choose(field.clone());
                        self.retry(session, &field, err).await
                    }
                };
            }
        }

        let chooser = update.chooser();
        match self
            .resolve_answer(&record_type, &chooser, message, prompt.as_ref())
            .await?
        {
            Ok(choice) => {
                let field = update
                    .find_field(&choice.to_string())
                    .cloned()
                    .ok_or(FlowError::NothingAwaited)?;
                tracing::debug!(field = %field.name, "Field to update chosen");
                session.update_mut()?.choose(field.clone());
                self.ask_field(session, &field, None).await
            }
            Err(err) => self.retry(session, &chooser, err).await,
        }
    }

    /// Ends the flow, then writes the change.
    async fn apply_update(
        &self,
        session: Session,
        field: &FieldDescriptor,
        value: Value,
    ) -> Result<TurnReply, TurnError> {
        let update = session.update().ok_or(FlowError::NotUpdating)?;
        self.ports.sessions.delete(&session.user).await?;

        let mut changes = Map::new();
        changes.insert(field.name.clone(), value);
        self.write_update(&session.record_type, &update.target, changes)
            .await
    }

    /// Writes `changes` to the record named or numbered `target`.
    pub(super) async fn write_update(
        &self,
        record_type: &RecordType,
        target: &str,
        changes: Map<String, Value>,
    ) -> Result<TurnReply, TurnError> {
        match self.ports.documents.update(record_type, target, changes).await {
            Ok(document) => {
                tracing::info!(record_type = %record_type, id = %document.id, "Record updated");
                Ok(TurnReply::answered(format!(
                    "Updated {} {}.\n\n{}",
                    record_type,
                    document.id,
                    summarize(&document)
                )))
            }
            Err(DocumentStoreError::NotFound { .. }) => {
                Ok(TurnReply::answered(format!("No {} named '{}'.", record_type, target)))
            }
            Err(err) => Err(err.into()),
        }
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        Value::Bool(true) => "Yes".to_string(),
        Value::Bool(false) => "No".to_string(),
        Value::Array(rows) => format!("{} row(s)", rows.len()),
        other => other.to_string(),
    }
}

/// Markdown summary of one record: its name, then one line per field.
pub(super) fn summarize(document: &Document) -> String {
    let mut lines = vec![format!(
        "**{}** ({} {})",
        document.name, document.record_type, document.id
    )];
    for (field, value) in &document.data {
        lines.push(format!("- {}: {}", field, render_value(value)));
    }
    lines.join("\n")
}
