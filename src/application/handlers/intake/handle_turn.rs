//! HandleTurnHandler - One inbound chat message, start to finish.
//!
//! Per turn, in order:
//!
//! 1. A cancellation token deletes the session, whatever its state.
//! 2. Without a live session the message is parsed as a new intent.
//! 3. A live session is abandoned when the message looks like a new command,
//!    unless it is also a plausible answer to the pending question.
//! 4. Otherwise the message answers the field or question the session is
//!    waiting on.
//!
//! Failures of collaborators delete the session and return a generic reply;
//! panics are caught here as well, so no turn can leave a stuck session.

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use super::{IntakePorts, TurnError, TurnLocks};
use crate::domain::foundation::{Actor, RecordId};
use crate::domain::intake::{
    assemble, resolve, tokens, FieldRules, FlowError, FlowStage, GroupStep, NestedGroupContext,
    NextStep, PendingPrompt, ResolveContext, ResolveError, Session,
};
use crate::domain::intent::{IntentAction, ParsedIntent};
use crate::domain::schema::{FieldDescriptor, FieldValue, RecordType};
use crate::ports::{GroupIntro, GroupPosition, Operation, Prompt, PromptContext};

pub(super) const CANCELLED_REPLY: &str = "Cancelled. Nothing was saved.";
pub(super) const NOTHING_TO_CANCEL_REPLY: &str = "There is nothing to cancel.";
pub(super) const FAILURE_REPLY: &str =
    "Sorry, something went wrong while handling that. Nothing was saved; please start again.";
pub(super) const CONFLICT_REPLY: &str =
    "Another message of yours was being handled at the same time. Please send that again.";
pub(super) const EMPTY_MESSAGE_REPLY: &str =
    "Tell me what you'd like to do, for example \"create customer\". Type \"help\" for more.";

/// Command carrying one raw chat message.
#[derive(Debug, Clone)]
pub struct HandleTurnCommand {
    pub actor: Actor,
    pub message: String,
}

/// How a turn ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Asked for a field or a yes/no answer; the session is stored.
    Prompted,
    /// The answer was rejected; the same question is asked again.
    Retry,
    Cancelled,
    Created { id: RecordId },
    /// Informational reply (clarification, list, help, ...); no session.
    Answered,
    Denied,
    Conflict,
    Failed,
}

impl TurnOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnOutcome::Prompted => "prompted",
            TurnOutcome::Retry => "retry",
            TurnOutcome::Cancelled => "cancelled",
            TurnOutcome::Created { .. } => "created",
            TurnOutcome::Answered => "answered",
            TurnOutcome::Denied => "denied",
            TurnOutcome::Conflict => "conflict",
            TurnOutcome::Failed => "failed",
        }
    }
}

/// Renderable reply to one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReply {
    pub text: String,
    pub outcome: TurnOutcome,
}

impl TurnReply {
    pub fn new(text: impl Into<String>, outcome: TurnOutcome) -> Self {
        Self {
            text: text.into(),
            outcome,
        }
    }

    pub(super) fn answered(text: impl Into<String>) -> Self {
        Self::new(text, TurnOutcome::Answered)
    }

    pub(super) fn denied(record_type: &RecordType, operation: Operation) -> Self {
        Self::new(
            format!("You don't have permission to {} {} records.", operation, record_type),
            TurnOutcome::Denied,
        )
    }
}

/// Tunables of the flow controller.
#[derive(Debug, Clone)]
pub struct TurnConfig {
    /// Idle lifetime of a session.
    pub session_ttl: Duration,
    /// Rows shown for list commands.
    pub list_limit: usize,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            session_ttl: Duration::from_secs(600),
            list_limit: 10,
        }
    }
}

/// The flow controller: the single entry point transports call.
pub struct HandleTurnHandler {
    pub(super) ports: IntakePorts,
    pub(super) rules: FieldRules,
    pub(super) config: TurnConfig,
    locks: Arc<TurnLocks>,
}

impl HandleTurnHandler {
    pub fn new(ports: IntakePorts, config: TurnConfig) -> Self {
        Self {
            ports,
            rules: FieldRules::new(),
            config,
            locks: Arc::new(TurnLocks::new()),
        }
    }

    /// Extra validation rules, per (record type, field).
    pub fn with_field_rules(mut self, rules: FieldRules) -> Self {
        self.rules = rules;
        self
    }

    /// Handles one message. Never fails; errors become reply text.
    #[tracing::instrument(skip(self, cmd), fields(user = %cmd.actor.key))]
    pub async fn handle(&self, cmd: HandleTurnCommand) -> TurnReply {
        let _turn = self.locks.acquire(&cmd.actor.key).await;

        let result = AssertUnwindSafe(self.run_turn(&cmd.actor, &cmd.message))
            .catch_unwind()
            .await;

        match result {
            Ok(Ok(reply)) => {
                tracing::debug!(outcome = reply.outcome.as_str(), "Turn finished");
                reply
            }
            Ok(Err(err)) if !err.discards_session() => {
                tracing::warn!(error = %err, "Session write lost a race");
                TurnReply::new(CONFLICT_REPLY, TurnOutcome::Conflict)
            }
            Ok(Err(err)) => {
                tracing::error!(error = %err, "Turn failed, discarding session");
                self.discard_session(&cmd.actor).await;
                TurnReply::new(FAILURE_REPLY, TurnOutcome::Failed)
            }
            Err(_) => {
                tracing::error!("Turn panicked, discarding session");
                self.discard_session(&cmd.actor).await;
                TurnReply::new(FAILURE_REPLY, TurnOutcome::Failed)
            }
        }
    }

    async fn discard_session(&self, actor: &Actor) {
        if let Err(err) = self.ports.sessions.delete(&actor.key).await {
            tracing::error!(error = %err, "Failed to delete session after error");
        }
    }

    async fn run_turn(&self, actor: &Actor, message: &str) -> Result<TurnReply, TurnError> {
        let message = message.trim();

        if tokens::is_cancel(message) {
            return self.cancel(actor).await;
        }

        let session = self.load_session(actor).await?;
        match session {
            None if message.is_empty() => Ok(TurnReply::answered(EMPTY_MESSAGE_REPLY)),
            None => self.start_from_intent(actor, message).await,
            Some(session) => {
                if interrupts(&session, message) && !self.names_reference(&session, message).await? {
                    tracing::info!(
                        record_type = %session.record_type,
                        "New command abandons the active flow"
                    );
                    self.ports.sessions.delete(&actor.key).await?;
                    return self.start_from_intent(actor, message).await;
                }
                self.continue_flow(session, message).await
            }
        }
    }

    /// Whether `message` is the exact name of a record the awaited
    /// reference field may point at, listed on the prompt or not.
    async fn names_reference(&self, session: &Session, message: &str) -> Result<bool, TurnError> {
        let Some(field) = session.current_field() else {
            return Ok(false);
        };
        let references = self.references_for(field).await?;
        Ok(references.iter().any(|name| name.eq_ignore_ascii_case(message)))
    }

    /// Live session of the actor; an expired one is dropped.
    async fn load_session(&self, actor: &Actor) -> Result<Option<Session>, TurnError> {
        let Some(session) = self.ports.sessions.get(&actor.key).await? else {
            return Ok(None);
        };
        if session.is_expired(self.ports.clock.now()) {
            tracing::info!(record_type = %session.record_type, "Session expired");
            self.ports.sessions.delete(&actor.key).await?;
            return Ok(None);
        }
        Ok(Some(session))
    }

    async fn cancel(&self, actor: &Actor) -> Result<TurnReply, TurnError> {
        let Some(mut session) = self.ports.sessions.get(&actor.key).await? else {
            return Ok(TurnReply::new(NOTHING_TO_CANCEL_REPLY, TurnOutcome::Cancelled));
        };

        let from = session.stage();
        session.cancel()?;
        self.ports.sessions.delete(&actor.key).await?;
        tracing::info!(record_type = %session.record_type, from = ?from, "Flow cancelled");
        Ok(TurnReply::new(CANCELLED_REPLY, TurnOutcome::Cancelled))
    }

    async fn start_from_intent(&self, actor: &Actor, message: &str) -> Result<TurnReply, TurnError> {
        match self.ports.intents.parse(message, actor).await? {
            ParsedIntent::Clarification(text) => Ok(TurnReply::answered(text)),
            ParsedIntent::Action(request) if request.action == IntentAction::Create => {
                self.start_create(actor, request).await
            }
            ParsedIntent::Action(request) => self.dispatch(actor, request).await,
        }
    }

    async fn continue_flow(&self, mut session: Session, message: &str) -> Result<TurnReply, TurnError> {
        let prompt = session.take_prompt();

        match session.stage() {
            FlowStage::CollectingTopLevelField => {
                let field = session
                    .current_field()
                    .cloned()
                    .ok_or(FlowError::NothingAwaited)?;
                let record_type = session.record_type.clone();
                match self
                    .resolve_answer(&record_type, &field, message, prompt.as_ref())
                    .await?
                {
                    Ok(value) => {
                        tracing::debug!(field = %field.name, "Field accepted");
                        session.accept_top_level(value)?;
                        self.advance(session, None).await
                    }
                    Err(err) => self.retry(session, &field, err).await,
                }
            }
            FlowStage::InNestedGroup => self.continue_group(session, message, prompt).await,
            FlowStage::ReadyToAssemble => self.advance(session, None).await,
            FlowStage::UpdatingRecord => self.continue_update(session, message, prompt).await,
            FlowStage::Cancelled => Err(FlowError::NothingAwaited.into()),
        }
    }

    async fn continue_group(
        &self,
        mut session: Session,
        message: &str,
        prompt: Option<PendingPrompt>,
    ) -> Result<TurnReply, TurnError> {
        let pending_field = session.group().and_then(|g| g.current_field().cloned());

        let step = match pending_field {
            None => {
                let affirmative = tokens::is_affirmative(message);
                session.group_mut()?.answer_confirmation(affirmative)?
            }
            Some(field) => {
                let row_type = session.group_mut()?.row_type.clone();
                match self
                    .resolve_answer(&row_type, &field, message, prompt.as_ref())
                    .await?
                {
                    Ok(value) => {
                        tracing::debug!(field = %field.name, "Row field accepted");
                        session.group_mut()?.accept_value(value)?
                    }
                    Err(err) => return self.retry(session, &field, err).await,
                }
            }
        };

        match step {
            GroupStep::AskField(field) => self.ask_field(session, &field, None).await,
            GroupStep::RowCompleted { row_number } => {
                let group = session.group().ok_or(FlowError::NotInGroup)?;
                let text = self.ports.presenter.row_added(group, row_number);
                session.set_prompt(None);
                self.save(&mut session).await?;
                Ok(TurnReply::new(text, TurnOutcome::Prompted))
            }
            GroupStep::Skipped => {
                tracing::debug!("Required group declined, deferring");
                session.defer_group()?;
                self.advance(session, None).await
            }
            GroupStep::Finished(rows) => {
                tracing::debug!(rows = rows.len(), "Group finished");
                session.complete_group(rows)?;
                self.advance(session, None).await
            }
        }
    }

    /// Runs the resolver for one answer. The outer error is a collaborator
    /// failure; the inner one is a retryable rejection of the answer.
    pub(super) async fn resolve_answer(
        &self,
        record_type: &RecordType,
        field: &FieldDescriptor,
        raw: &str,
        prompt: Option<&PendingPrompt>,
    ) -> Result<Result<FieldValue, ResolveError>, TurnError> {
        let references = self.references_for(field).await?;
        let candidates = prompt.map(|p| p.candidates_for(field)).unwrap_or(&[]);
        let ctx = ResolveContext::new(self.ports.clock.today())
            .with_candidates(candidates)
            .with_references(&references)
            .with_rules(self.rules.for_field(record_type, &field.name));
        Ok(resolve(raw, field, &ctx))
    }

    async fn references_for(&self, field: &FieldDescriptor) -> Result<Vec<String>, TurnError> {
        match field.field_type.referenced_type() {
            Some(record_type) => Ok(self.ports.documents.list_names(record_type).await?),
            None => Ok(Vec::new()),
        }
    }

    /// Moves the flow forward until it needs the user again.
    pub(super) async fn advance(
        &self,
        mut session: Session,
        preface: Option<String>,
    ) -> Result<TurnReply, TurnError> {
        match session.next_step()? {
            NextStep::AskField(field) => self.ask_field(session, &field, preface).await,
            NextStep::EnterGroup(subgroup) => {
                let row_fields = self.ports.schema.required_fields(&subgroup.row_type).await?;
                let optional = self.ports.schema.optional_fields(&subgroup.row_type).await?;
                let declined_before = session.declined_groups.contains(&subgroup.name);

                session.enter_group(NestedGroupContext::new(&subgroup, row_fields, optional))?;
                tracing::debug!(group = %subgroup.name, declined_before, "Entering group");

                let group = session.group().ok_or(FlowError::NotInGroup)?;
                let intro = self.ports.presenter.group_intro(&GroupIntro {
                    record_type: &session.record_type,
                    group,
                    declined_before,
                });
                session.set_prompt(None);
                self.save(&mut session).await?;
                Ok(TurnReply::new(with_preface(preface, intro), TurnOutcome::Prompted))
            }
            NextStep::Assemble => self.finish(session).await,
        }
    }

    pub(super) async fn ask_field(
        &self,
        mut session: Session,
        field: &FieldDescriptor,
        preface: Option<String>,
    ) -> Result<TurnReply, TurnError> {
        let prompt = self.render_prompt(&session, field, None).await?;
        session.set_prompt(Some(pending(field, &prompt)));
        self.save(&mut session).await?;
        Ok(TurnReply::new(with_preface(preface, prompt.text), TurnOutcome::Prompted))
    }

    pub(super) async fn retry(
        &self,
        mut session: Session,
        field: &FieldDescriptor,
        err: ResolveError,
    ) -> Result<TurnReply, TurnError> {
        tracing::debug!(field = %field.name, reason = %err, "Answer rejected");
        let prompt = self.render_prompt(&session, field, Some(&err)).await?;
        session.set_prompt(Some(pending(field, &prompt)));
        self.save(&mut session).await?;
        Ok(TurnReply::new(prompt.text, TurnOutcome::Retry))
    }

    async fn render_prompt(
        &self,
        session: &Session,
        field: &FieldDescriptor,
        error: Option<&ResolveError>,
    ) -> Result<Prompt, TurnError> {
        let references = self.references_for(field).await?;
        let (record_type, group) = match session.group() {
            Some(group) => (
                &group.row_type,
                Some(GroupPosition {
                    label: &group.label,
                    row_number: group.row_number(),
                    field_number: group.field_index + 1,
                    field_count: group.row_fields.len(),
                }),
            ),
            None => (&session.record_type, None),
        };

        Ok(self.ports.presenter.field_prompt(&PromptContext {
            record_type,
            field,
            group,
            references: &references,
            today: self.ports.clock.today(),
            error,
        }))
    }

    async fn save(&self, session: &mut Session) -> Result<(), TurnError> {
        session.touch(self.ports.clock.now(), self.config.session_ttl.as_secs());
        let version = self
            .ports
            .sessions
            .put(&session.user, session, self.config.session_ttl)
            .await?;
        session.version = version;
        Ok(())
    }

    async fn finish(&self, session: Session) -> Result<TurnReply, TurnError> {
        let record = assemble(&session)?;
        // Consumed before the create: a flow never assembles twice.
        self.ports.sessions.delete(&session.user).await?;
        let id = self
            .ports
            .documents
            .create(&record.record_type, record.payload)
            .await?;

        tracing::info!(record_type = %record.record_type, id = %id, "Record created");
        Ok(TurnReply::new(
            format!("{} {} created.", record.record_type, id),
            TurnOutcome::Created { id },
        ))
    }
}

fn pending(field: &FieldDescriptor, prompt: &Prompt) -> PendingPrompt {
    PendingPrompt {
        field: field.name.clone(),
        candidates: prompt.candidates.clone(),
        type_hint: Some(field.field_type.clone()),
    }
}

fn with_preface(preface: Option<String>, text: String) -> String {
    match preface {
        Some(preface) if !preface.is_empty() => format!("{}\n\n{}", preface, text),
        _ => text,
    }
}

/// Whether `message` abandons the active flow for a new command.
fn interrupts(session: &Session, message: &str) -> bool {
    if !tokens::looks_like_new_command(message) {
        return false;
    }

    let awaiting_confirmation = session.group().is_some_and(|g| g.current_field().is_none());
    if awaiting_confirmation && tokens::is_confirmation_answer(message) {
        return false;
    }

    // "Add-On Services" is an answer, not a command
    let names_option = |options: &[String]| options.iter().any(|o| o.eq_ignore_ascii_case(message));
    let listed = session
        .prompt
        .as_ref()
        .is_some_and(|p| names_option(&p.candidates));
    let is_option = session
        .current_field()
        .is_some_and(|f| names_option(f.field_type.options()));
    !(listed || is_option)
}
