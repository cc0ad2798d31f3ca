//! Nested Group Collector.
//!
//! Sub-state-machine that collects repeated rows for one subgroup of a
//! record. Each row requires every row field to be answered in order.
//!
//! ```text
//! AwaitingStartConfirmation --yes--> CollectingRowField --last field--> AwaitingAddMoreRows
//!          |                              ^    |                              |      |
//!          no                             +----+ (next field)                 yes    no
//!          v                                                                  |      v
//!       Skipped                          CollectingRowField <-----------------+   Finished
//! ```

use serde::{Deserialize, Serialize};

use super::FlowError;
use crate::domain::foundation::StateMachine;
use crate::domain::schema::{FieldDescriptor, FieldValue, RecordType, RowData, SubgroupDescriptor};

/// Stage of the nested group sub-flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupStage {
    /// Asked whether to start adding rows.
    AwaitingStartConfirmation,
    /// Collecting one row field.
    CollectingRowField,
    /// Row finished, asked whether to add another.
    AwaitingAddMoreRows,
}

impl StateMachine for GroupStage {
    fn can_transition_to(&self, target: &Self) -> bool {
        use GroupStage::*;
        matches!(
            (self, target),
            (AwaitingStartConfirmation, CollectingRowField)
                | (CollectingRowField, CollectingRowField)
                | (CollectingRowField, AwaitingAddMoreRows)
                | (AwaitingAddMoreRows, CollectingRowField)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use GroupStage::*;
        match self {
            AwaitingStartConfirmation => vec![CollectingRowField],
            CollectingRowField => vec![CollectingRowField, AwaitingAddMoreRows],
            AwaitingAddMoreRows => vec![CollectingRowField],
        }
    }
}

/// What the collector needs from the user next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GroupAwaiting<'a> {
    /// A yes/no answer for the given stage.
    Confirmation(GroupStage),
    /// A value for this row field.
    Field(&'a FieldDescriptor),
}

/// Outcome of feeding one answer to the collector.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupStep {
    /// Ask for the next row field.
    AskField(FieldDescriptor),
    /// A row was completed; ask whether to add another.
    RowCompleted { row_number: usize },
    /// The user declined to start; no rows were collected.
    Skipped,
    /// The group is done with these rows.
    Finished(Vec<RowData>),
}

/// State of the subgroup currently being collected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestedGroupContext {
    /// Field name the rows are stored under on the parent record.
    pub group_field: String,
    pub label: String,
    pub row_type: RecordType,
    /// Required row fields, asked in order.
    pub row_fields: Vec<FieldDescriptor>,
    /// Optional row fields, only mentioned in the introduction.
    pub optional_row_fields: Vec<FieldDescriptor>,
    pub accepted_rows: Vec<RowData>,
    pub current_row: RowData,
    pub field_index: usize,
    pub stage: GroupStage,
}

impl NestedGroupContext {
    /// Starts a group at the confirmation stage.
    pub fn new(
        subgroup: &SubgroupDescriptor,
        row_fields: Vec<FieldDescriptor>,
        optional_row_fields: Vec<FieldDescriptor>,
    ) -> Self {
        Self {
            group_field: subgroup.name.clone(),
            label: subgroup.label.clone(),
            row_type: subgroup.row_type.clone(),
            row_fields,
            optional_row_fields,
            accepted_rows: Vec::new(),
            current_row: RowData::new(),
            field_index: 0,
            stage: GroupStage::AwaitingStartConfirmation,
        }
    }

    /// What the next input answers.
    pub fn awaiting(&self) -> GroupAwaiting<'_> {
        match (self.stage, self.current_field()) {
            (GroupStage::CollectingRowField, Some(field)) => GroupAwaiting::Field(field),
            (stage, _) => GroupAwaiting::Confirmation(stage),
        }
    }

    /// Row field currently being asked, if collecting.
    pub fn current_field(&self) -> Option<&FieldDescriptor> {
        match self.stage {
            GroupStage::CollectingRowField => self.row_fields.get(self.field_index),
            _ => None,
        }
    }

    /// 1-based number of the row in progress.
    pub fn row_number(&self) -> usize {
        self.accepted_rows.len() + 1
    }

    /// Handles a yes/no answer at either confirmation stage.
    pub fn answer_confirmation(&mut self, affirmative: bool) -> Result<GroupStep, FlowError> {
        match (self.stage, affirmative) {
            (GroupStage::AwaitingStartConfirmation, false) => Ok(GroupStep::Skipped),
            (GroupStage::AwaitingAddMoreRows, false) => {
                Ok(GroupStep::Finished(std::mem::take(&mut self.accepted_rows)))
            }
            (GroupStage::AwaitingStartConfirmation, true)
            | (GroupStage::AwaitingAddMoreRows, true) => self.begin_row(),
            (GroupStage::CollectingRowField, _) => Err(FlowError::NothingAwaited),
        }
    }

    /// Stores a resolved value for the current row field and advances.
    pub fn accept_value(&mut self, value: FieldValue) -> Result<GroupStep, FlowError> {
        let field = self.current_field().ok_or(FlowError::NothingAwaited)?.name.clone();
        self.current_row.insert(field, value);
        self.field_index += 1;
        self.advance_row()
    }

    fn begin_row(&mut self) -> Result<GroupStep, FlowError> {
        self.move_to(GroupStage::CollectingRowField)?;
        self.current_row = RowData::new();
        self.field_index = 0;
        self.advance_row()
    }

    fn advance_row(&mut self) -> Result<GroupStep, FlowError> {
        if let Some(next) = self.row_fields.get(self.field_index) {
            let next = next.clone();
            self.move_to(GroupStage::CollectingRowField)?;
            return Ok(GroupStep::AskField(next));
        }

        self.accepted_rows.push(std::mem::take(&mut self.current_row));
        self.field_index = 0;
        self.move_to(GroupStage::AwaitingAddMoreRows)?;
        Ok(GroupStep::RowCompleted {
            row_number: self.accepted_rows.len(),
        })
    }

    fn move_to(&mut self, target: GroupStage) -> Result<(), FlowError> {
        self.stage = self
            .stage
            .transition_to(target)
            .map_err(|_| FlowError::InvalidTransition {
                from: format!("{:?}", self.stage),
                to: format!("{:?}", target),
            })?;
        Ok(())
    }
}
