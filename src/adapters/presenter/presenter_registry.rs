//! Presenter Registry - Per-field presenter overrides.
//!
//! Record types occasionally need a hand-tuned prompt for one field (a
//! priority picker, a fixed list of warehouses). The registry routes those
//! fields to their override and everything else to the default presenter.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::intake::NestedGroupContext;
use crate::domain::schema::RecordType;
use crate::ports::{FieldPresenter, GroupIntro, Prompt, PromptContext};

/// `FieldPresenter` dispatching on (record type, field name).
#[derive(Clone)]
pub struct PresenterRegistry {
    default: Arc<dyn FieldPresenter>,
    overrides: HashMap<(RecordType, String), Arc<dyn FieldPresenter>>,
}

impl PresenterRegistry {
    pub fn new(default: Arc<dyn FieldPresenter>) -> Self {
        Self {
            default,
            overrides: HashMap::new(),
        }
    }

    /// Renders `field` of `record_type` with `presenter`.
    pub fn with_override(
        mut self,
        record_type: RecordType,
        field: impl Into<String>,
        presenter: Arc<dyn FieldPresenter>,
    ) -> Self {
        self.overrides.insert((record_type, field.into()), presenter);
        self
    }

    fn presenter_for(&self, record_type: &RecordType, field: &str) -> &dyn FieldPresenter {
        self.overrides
            .get(&(record_type.clone(), field.to_string()))
            .map(|p| p.as_ref())
            .unwrap_or_else(|| self.default.as_ref())
    }
}

impl FieldPresenter for PresenterRegistry {
    fn field_prompt(&self, ctx: &PromptContext<'_>) -> Prompt {
        self.presenter_for(ctx.record_type, &ctx.field.name)
            .field_prompt(ctx)
    }

    fn group_intro(&self, intro: &GroupIntro<'_>) -> String {
        self.default.group_intro(intro)
    }

    fn row_added(&self, group: &NestedGroupContext, row_number: usize) -> String {
        self.default.row_added(group, row_number)
    }
}
