//! Update flow for an existing record: choose a field, then give its new
//! value. Both answers go through the field input resolver.

use serde::{Deserialize, Serialize};

use crate::domain::schema::{FieldDescriptor, FieldType};

/// Name of the pseudo-field asking which field to change.
pub const FIELD_CHOOSER: &str = "field_to_change";

/// State of an update flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateContext {
    /// Id of the record being changed.
    pub target: String,
    /// Display name of the record.
    pub target_name: String,
    /// Fields that may be changed, in catalog order.
    pub fields: Vec<FieldDescriptor>,
    /// Field whose new value is awaited; `None` while choosing.
    pub field: Option<FieldDescriptor>,
}

impl UpdateContext {
    pub fn new(
        target: impl Into<String>,
        target_name: impl Into<String>,
        fields: Vec<FieldDescriptor>,
    ) -> Self {
        Self {
            target: target.into(),
            target_name: target_name.into(),
            fields,
            field: None,
        }
    }

    /// Select field whose options are the labels of the changeable fields.
    pub fn chooser(&self) -> FieldDescriptor {
        let options = self.fields.iter().map(|f| f.label.clone()).collect();
        FieldDescriptor::new(FIELD_CHOOSER, "Field to change", FieldType::Select { options })
    }

    /// Field named by its label or its name, ignoring case and spacing.
    pub fn find_field(&self, key: &str) -> Option<&FieldDescriptor> {
        let key = key.trim();
        let as_name = key.to_lowercase().split_whitespace().collect::<Vec<_>>().join("_");
        self.fields
            .iter()
            .find(|f| f.label.eq_ignore_ascii_case(key) || f.name == as_name)
    }

    /// Makes `field` the one whose value is awaited next.
    pub fn choose(&mut self, field: FieldDescriptor) {
        self.field = Some(field);
    }
}

/// Splits `field to value`, `field = value` and `field: value` answers.
pub fn split_assignment(input: &str) -> Option<(&str, &str)> {
    let input = input.trim();
    let at = input
        .find('=')
        .map(|i| (i, 1))
        .or_else(|| input.find(':').map(|i| (i, 1)))
        .or_else(|| input.to_ascii_lowercase().find(" to ").map(|i| (i, 4)))?;

    let (key, value) = (input[..at.0].trim(), input[at.0 + at.1..].trim());
    if key.is_empty() || value.is_empty() {
        return None;
    }
    Some((key, value))
}
