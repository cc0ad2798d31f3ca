//! Field Presenter Port - Renders prompts and candidate lists.
//!
//! Presentation is pluggable. The flow controller stores the returned
//! candidate list verbatim and never invents or reorders candidates, so
//! numbered answers always bind to exactly what the user saw.

use chrono::NaiveDate;

use crate::domain::intake::{NestedGroupContext, ResolveError};
use crate::domain::schema::{FieldDescriptor, RecordType};

/// A rendered prompt.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Prompt {
    pub text: String,
    /// Ordered candidates a numeric answer indexes into; empty if none.
    pub candidates: Vec<String>,
}

/// Position of a row field inside a nested group.
#[derive(Debug, Clone, Copy)]
pub struct GroupPosition<'a> {
    pub label: &'a str,
    pub row_number: usize,
    /// 1-based index of the field within the row.
    pub field_number: usize,
    pub field_count: usize,
}

/// Everything a presenter may use to render one field prompt.
#[derive(Debug, Clone, Copy)]
pub struct PromptContext<'a> {
    /// Record type owning the field (the row type inside a group).
    pub record_type: &'a RecordType,
    pub field: &'a FieldDescriptor,
    pub group: Option<GroupPosition<'a>>,
    /// Existing record names for reference fields.
    pub references: &'a [String],
    pub today: NaiveDate,
    /// Set when re-asking after a failed answer.
    pub error: Option<&'a ResolveError>,
}

/// Introduction shown before collecting a subgroup.
#[derive(Debug, Clone, Copy)]
pub struct GroupIntro<'a> {
    pub record_type: &'a RecordType,
    pub group: &'a NestedGroupContext,
    /// True when the user already declined this group once.
    pub declined_before: bool,
}

/// Port for rendering intake prompts
pub trait FieldPresenter: Send + Sync {
    /// Prompt for one field, with candidates for enumerable types
    fn field_prompt(&self, ctx: &PromptContext<'_>) -> Prompt;

    /// Yes/no question asking whether to start a subgroup
    fn group_intro(&self, intro: &GroupIntro<'_>) -> String;

    /// Summary after a row was completed, asking whether to add another
    fn row_added(&self, group: &NestedGroupContext, row_number: usize) -> String;
}
