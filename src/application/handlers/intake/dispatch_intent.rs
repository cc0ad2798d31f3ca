//! Non-create intents: list, get, update, delete and help.
//!
//! These answer within a single turn; only an update naming no change opens
//! a session (see `update_record`). Each checks read permission on the
//! record type, then the permission of the operation.

use serde_json::{Map, Value};

use super::handle_turn::{HandleTurnHandler, TurnReply};
use super::update_record::summarize;
use super::TurnError;
use crate::domain::foundation::Actor;
use crate::domain::intent::{IntentAction, IntentRequest};
use crate::domain::schema::RecordType;
use crate::ports::{DocumentStoreError, Operation};

impl HandleTurnHandler {
    pub(super) async fn dispatch(
        &self,
        actor: &Actor,
        request: IntentRequest,
    ) -> Result<TurnReply, TurnError> {
        if request.action == IntentAction::Help {
            return self.help(actor).await;
        }

        let Some(record_type) = request.record_type.clone() else {
            return Ok(TurnReply::answered(format!(
                "Which kind of record do you want to {}?",
                request.action
            )));
        };

        let operation = match request.action {
            IntentAction::Create => return self.start_create(actor, request).await,
            IntentAction::List | IntentAction::Get | IntentAction::Help => Operation::Read,
            IntentAction::Update => Operation::Write,
            IntentAction::Delete => Operation::Delete,
        };
        for check in [Operation::Read, operation] {
            if !self.ports.permissions.can(actor, &record_type, check).await? {
                tracing::info!(record_type = %record_type, operation = %check, "Intent denied");
                return Ok(TurnReply::denied(&record_type, check));
            }
        }

        match request.action {
            IntentAction::List => self.list(&record_type, &request.filters).await,
            IntentAction::Get => self.get(&record_type, request.target_name()).await,
            IntentAction::Update => {
                self.update(actor, &record_type, request.target_name(), &request.data)
                    .await
            }
            IntentAction::Delete => self.delete(&record_type, request.target_name()).await,
            IntentAction::Create | IntentAction::Help => self.help(actor).await,
        }
    }

    async fn list(
        &self,
        record_type: &RecordType,
        filters: &Map<String, Value>,
    ) -> Result<TurnReply, TurnError> {
        let documents = self
            .ports
            .documents
            .list(record_type, filters, self.config.list_limit)
            .await?;

        if documents.is_empty() {
            return Ok(TurnReply::answered(format!("No {} records found.", record_type)));
        }

        let mut lines = vec![format!("**{}** (most recent first):", record_type)];
        for (index, document) in documents.iter().enumerate() {
            let label = if document.name == document.id.as_str() {
                document.name.clone()
            } else {
                format!("{} ({})", document.name, document.id)
            };
            lines.push(format!("{}. {}", index + 1, label));
        }
        Ok(TurnReply::answered(lines.join("\n")))
    }

    async fn get(&self, record_type: &RecordType, name: Option<&str>) -> Result<TurnReply, TurnError> {
        let Some(name) = name else {
            return Ok(TurnReply::answered(format!(
                "Which {} do you want to see? Add its name or id.",
                record_type
            )));
        };

        match self.ports.documents.get(record_type, name).await? {
            Some(document) => Ok(TurnReply::answered(summarize(&document))),
            None => Ok(TurnReply::answered(format!("No {} named '{}'.", record_type, name))),
        }
    }

    async fn update(
        &self,
        actor: &Actor,
        record_type: &RecordType,
        name: Option<&str>,
        data: &Map<String, Value>,
    ) -> Result<TurnReply, TurnError> {
        let Some(name) = name else {
            return Ok(TurnReply::answered(format!(
                "Which {} do you want to update? Add its name or id.",
                record_type
            )));
        };
        if data.is_empty() {
            return self.start_update(actor, record_type, name).await;
        }

        let mut fields = self.ports.schema.required_fields(record_type).await?;
        fields.extend(self.ports.schema.optional_fields(record_type).await?);

        let mut changes = Map::new();
        for (key, raw) in data {
            let Some(field) = fields.iter().find(|f| f.name == *key || f.label.eq_ignore_ascii_case(key)) else {
                return Ok(TurnReply::answered(format!(
                    "{} has no field '{}'.",
                    record_type, key
                )));
            };
            let raw = match raw {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            match self.resolve_answer(record_type, field, &raw, None).await? {
                Ok(value) => {
                    changes.insert(field.name.clone(), value.to_json());
                }
                Err(err) => return Ok(TurnReply::answered(format!("Nothing was changed. {}", err))),
            }
        }

        self.write_update(record_type, name, changes).await
    }

    async fn delete(&self, record_type: &RecordType, name: Option<&str>) -> Result<TurnReply, TurnError> {
        let Some(name) = name else {
            return Ok(TurnReply::answered(format!(
                "Which {} do you want to delete? Add its name or id.",
                record_type
            )));
        };

        match self.ports.documents.delete(record_type, name).await {
            Ok(()) => {
                tracing::info!(record_type = %record_type, name, "Record deleted");
                Ok(TurnReply::answered(format!("Deleted {} '{}'.", record_type, name)))
            }
            Err(DocumentStoreError::NotFound { .. }) => {
                Ok(TurnReply::answered(format!("No {} named '{}'.", record_type, name)))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn help(&self, actor: &Actor) -> Result<TurnReply, TurnError> {
        let mut readable = Vec::new();
        for record_type in self.ports.schema.record_types().await? {
            if self
                .ports
                .permissions
                .can(actor, &record_type, Operation::Read)
                .await?
            {
                readable.push(record_type.to_string());
            }
        }

        let types = if readable.is_empty() {
            "none available to you".to_string()
        } else {
            readable.join(", ")
        };
        Ok(TurnReply::answered(format!(
            "Record types: {}\n\n\
             Commands:\n\
             - create <record type> [field=value, ...]\n\
             - list <record type>\n\
             - get <record type> <name>\n\
             - update <record type> <name> field=value\n\
             - delete <record type> <name>\n\n\
             While I'm asking questions, type `cancel` to stop.",
            types
        )))
    }
}
