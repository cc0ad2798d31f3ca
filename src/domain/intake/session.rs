//! Intake session: the per-user state of one guided collection flow.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

use super::{FlowError, NestedGroupContext, UpdateContext};
use crate::domain::foundation::{SessionId, StateMachine, Timestamp, UserKey};
use crate::domain::schema::{FieldDescriptor, FieldType, FieldValue, RecordType, RowData, SubgroupDescriptor};

/// Top-level state of a flow, each variant carrying only the data it needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FlowState {
    /// Answering the head of the missing-field queue.
    CollectingTopLevelField,
    /// Collecting rows for one subgroup.
    InNestedGroup(NestedGroupContext),
    /// Everything collected; the record can be assembled.
    ReadyToAssemble,
    /// Changing one field of an existing record.
    UpdatingRecord(UpdateContext),
    /// Aborted by the user.
    Cancelled,
}

impl FlowState {
    /// Data-free tag of this state.
    pub fn stage(&self) -> FlowStage {
        match self {
            Self::CollectingTopLevelField => FlowStage::CollectingTopLevelField,
            Self::InNestedGroup(_) => FlowStage::InNestedGroup,
            Self::ReadyToAssemble => FlowStage::ReadyToAssemble,
            Self::UpdatingRecord(_) => FlowStage::UpdatingRecord,
            Self::Cancelled => FlowStage::Cancelled,
        }
    }
}

/// State tag used for transition validation and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowStage {
    CollectingTopLevelField,
    InNestedGroup,
    ReadyToAssemble,
    UpdatingRecord,
    Cancelled,
}

impl StateMachine for FlowStage {
    fn can_transition_to(&self, target: &Self) -> bool {
        use FlowStage::*;
        matches!(
            (self, target),
            (
                CollectingTopLevelField,
                CollectingTopLevelField | InNestedGroup | ReadyToAssemble | Cancelled
            )
                | (InNestedGroup, InNestedGroup)
                | (InNestedGroup, ReadyToAssemble)
                | (InNestedGroup, Cancelled)
                | (UpdatingRecord, UpdatingRecord)
                | (UpdatingRecord, Cancelled)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use FlowStage::*;
        match self {
            CollectingTopLevelField => vec![
                CollectingTopLevelField,
                InNestedGroup,
                ReadyToAssemble,
                Cancelled,
            ],
            InNestedGroup => vec![InNestedGroup, ReadyToAssemble, Cancelled],
            UpdatingRecord => vec![UpdatingRecord, Cancelled],
            ReadyToAssemble | Cancelled => vec![],
        }
    }
}

/// Candidates shown with the last prompt, bound to the field they were
/// shown for. Valid for the very next input only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingPrompt {
    pub field: String,
    pub candidates: Vec<String>,
    pub type_hint: Option<FieldType>,
}

impl PendingPrompt {
    /// Candidates if this prompt was shown for `field`, otherwise none.
    pub fn candidates_for(&self, field: &FieldDescriptor) -> &[String] {
        let same_type = self
            .type_hint
            .as_ref()
            .map_or(true, |hint| *hint == field.field_type);
        if self.field == field.name && same_type {
            &self.candidates
        } else {
            &[]
        }
    }
}

/// What the flow should do after a state change.
#[derive(Debug, Clone, PartialEq)]
pub enum NextStep {
    AskField(FieldDescriptor),
    EnterGroup(SubgroupDescriptor),
    Assemble,
}

/// One user's in-progress intake flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub user: UserKey,
    pub record_type: RecordType,
    pub state: FlowState,
    pub data: BTreeMap<String, FieldValue>,
    /// Accepted rows per subgroup field name.
    pub groups: BTreeMap<String, Vec<RowData>>,
    pub missing_fields: VecDeque<FieldDescriptor>,
    /// Subgroups still to be collected, in order.
    pub pending_groups: VecDeque<SubgroupDescriptor>,
    /// Every required subgroup of the record type.
    pub required_groups: Vec<String>,
    /// Subgroups the user declined at least once.
    pub declined_groups: BTreeSet<String>,
    pub prompt: Option<PendingPrompt>,
    /// Store version this copy was read at; 0 for a session never stored.
    pub version: u64,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
}

impl Session {
    /// Creates an empty flow collecting top-level fields.
    pub fn new(user: UserKey, record_type: RecordType, now: Timestamp, ttl_secs: u64) -> Self {
        Self {
            id: SessionId::new(),
            user,
            record_type,
            state: FlowState::CollectingTopLevelField,
            data: BTreeMap::new(),
            groups: BTreeMap::new(),
            missing_fields: VecDeque::new(),
            pending_groups: VecDeque::new(),
            required_groups: Vec::new(),
            declined_groups: BTreeSet::new(),
            prompt: None,
            version: 0,
            created_at: now,
            expires_at: now.plus_secs(ttl_secs),
        }
    }

    /// Creates a flow changing one field of an existing record.
    pub fn for_update(
        user: UserKey,
        record_type: RecordType,
        update: UpdateContext,
        now: Timestamp,
        ttl_secs: u64,
    ) -> Self {
        let mut session = Self::new(user, record_type, now, ttl_secs);
        session.state = FlowState::UpdatingRecord(update);
        session
    }

    pub fn stage(&self) -> FlowStage {
        self.state.stage()
    }

    /// Records a value supplied up front.
    pub fn prefill(&mut self, field: impl Into<String>, value: FieldValue) {
        self.data.insert(field.into(), value);
    }

    /// Queues a top-level field that still needs an answer.
    pub fn require_field(&mut self, field: FieldDescriptor) {
        self.missing_fields.push_back(field);
    }

    /// Registers a required subgroup; it is queued unless rows are present.
    pub fn require_group(&mut self, subgroup: SubgroupDescriptor) {
        self.required_groups.push(subgroup.name.clone());
        let has_rows = self.groups.get(&subgroup.name).is_some_and(|rows| !rows.is_empty());
        if !has_rows {
            self.pending_groups.push_back(subgroup);
        }
    }

    /// Stores rows supplied up front for a subgroup.
    pub fn prefill_rows(&mut self, group: impl Into<String>, rows: Vec<RowData>) {
        self.groups.insert(group.into(), rows);
    }

    /// Field the next input answers, at top level or inside a group.
    pub fn current_field(&self) -> Option<&FieldDescriptor> {
        match &self.state {
            FlowState::CollectingTopLevelField => self.missing_fields.front(),
            FlowState::InNestedGroup(group) => group.current_field(),
            FlowState::UpdatingRecord(update) => update.field.as_ref(),
            FlowState::ReadyToAssemble | FlowState::Cancelled => None,
        }
    }

    pub fn group(&self) -> Option<&NestedGroupContext> {
        match &self.state {
            FlowState::InNestedGroup(group) => Some(group),
            _ => None,
        }
    }

    pub fn group_mut(&mut self) -> Result<&mut NestedGroupContext, FlowError> {
        match &mut self.state {
            FlowState::InNestedGroup(group) => Ok(group),
            _ => Err(FlowError::NotInGroup),
        }
    }

    pub fn update(&self) -> Option<&UpdateContext> {
        match &self.state {
            FlowState::UpdatingRecord(update) => Some(update),
            _ => None,
        }
    }

    pub fn update_mut(&mut self) -> Result<&mut UpdateContext, FlowError> {
        match &mut self.state {
            FlowState::UpdatingRecord(update) => Ok(update),
            _ => Err(FlowError::NotUpdating),
        }
    }

    /// Removes the pending prompt; it never outlives one input.
    pub fn take_prompt(&mut self) -> Option<PendingPrompt> {
        self.prompt.take()
    }

    pub fn set_prompt(&mut self, prompt: Option<PendingPrompt>) {
        self.prompt = prompt;
    }

    /// Commits an answer for the head of the missing-field queue.
    pub fn accept_top_level(&mut self, value: FieldValue) -> Result<(), FlowError> {
        if self.stage() != FlowStage::CollectingTopLevelField {
            return Err(FlowError::NothingAwaited);
        }
        let field = self.missing_fields.pop_front().ok_or(FlowError::NothingAwaited)?;
        self.data.insert(field.name, value);
        Ok(())
    }

    /// Decides what comes next once the current step is done.
    pub fn next_step(&mut self) -> Result<NextStep, FlowError> {
        if self.stage() == FlowStage::CollectingTopLevelField {
            if let Some(field) = self.missing_fields.front() {
                return Ok(NextStep::AskField(field.clone()));
            }
        }
        if let Some(subgroup) = self.pending_groups.front() {
            return Ok(NextStep::EnterGroup(subgroup.clone()));
        }
        self.transition(FlowState::ReadyToAssemble)?;
        Ok(NextStep::Assemble)
    }

    /// Starts collecting the subgroup at the head of the pending queue.
    pub fn enter_group(&mut self, group: NestedGroupContext) -> Result<(), FlowError> {
        match self.pending_groups.front() {
            Some(head) if head.name == group.group_field => {}
            _ => return Err(FlowError::NotInGroup),
        }
        self.transition(FlowState::InNestedGroup(group))?;
        self.pending_groups.pop_front();
        Ok(())
    }

    /// Records the rows of the group being collected.
    pub fn complete_group(&mut self, rows: Vec<RowData>) -> Result<(), FlowError> {
        let name = self.group_mut()?.group_field.clone();
        self.groups.insert(name, rows);
        Ok(())
    }

    /// The user declined the group being collected; it is asked again
    /// after every other pending group.
    pub fn defer_group(&mut self) -> Result<(), FlowError> {
        let group = self.group_mut()?;
        let subgroup = SubgroupDescriptor::new(
            group.group_field.clone(),
            group.label.clone(),
            group.row_type.clone(),
        );
        self.declined_groups.insert(subgroup.name.clone());
        self.pending_groups.push_back(subgroup);
        Ok(())
    }

    /// Marks the flow cancelled.
    pub fn cancel(&mut self) -> Result<(), FlowError> {
        self.transition(FlowState::Cancelled)
    }

    /// True when nothing is missing and every required group has rows.
    pub fn is_ready_for_assembly(&self) -> bool {
        self.missing_fields.is_empty()
            && self.pending_groups.is_empty()
            && self.required_groups.iter().all(|name| {
                self.groups.get(name).is_some_and(|rows| !rows.is_empty())
            })
    }

    /// Pushes the expiry out by `ttl_secs` from `now`.
    pub fn touch(&mut self, now: Timestamp, ttl_secs: u64) {
        self.expires_at = now.plus_secs(ttl_secs);
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        !now.is_before(&self.expires_at)
    }

    fn transition(&mut self, next: FlowState) -> Result<(), FlowError> {
        let from = self.stage();
        let to = next.stage();
        from.transition_to(to)
            .map_err(|_| FlowError::InvalidTransition {
                from: format!("{:?}", from),
                to: format!("{:?}", to),
            })?;
        self.state = next;
        Ok(())
    }
}
