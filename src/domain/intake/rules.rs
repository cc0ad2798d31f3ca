//! Pluggable field rules.
//!
//! Extra constraints that run after type conversion. Rules are looked up by
//! (record type, field name) so the resolver itself stays free of any
//! record-specific business logic.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::ResolveError;
use crate::domain::schema::{FieldDescriptor, FieldValue, RecordType};

/// A constraint applied to an already converted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldRule {
    /// Dates must be today or later.
    NotInPast,
    /// Numbers must be zero or greater.
    NonNegative,
    /// Numbers must be greater than zero.
    Positive,
}

impl FieldRule {
    /// Checks the value; rules that do not apply to its type pass.
    pub fn check(
        &self,
        field: &FieldDescriptor,
        value: &FieldValue,
        today: NaiveDate,
    ) -> Result<(), ResolveError> {
        let number = match value {
            FieldValue::Integer(i) => Some(*i as f64),
            FieldValue::Number(n) => Some(*n),
            _ => None,
        };

        match (self, value, number) {
            (Self::NotInPast, FieldValue::Date(date), _) if *date < today => Err(
                ResolveError::invalid(&field.label, "date cannot be in the past"),
            ),
            (Self::NonNegative, _, Some(n)) if n < 0.0 => Err(ResolveError::invalid(
                &field.label,
                "value cannot be negative",
            )),
            (Self::Positive, _, Some(n)) if n <= 0.0 => Err(ResolveError::invalid(
                &field.label,
                "value must be greater than zero",
            )),
            _ => Ok(()),
        }
    }
}

/// Lookup table of rules keyed by (record type, field name).
#[derive(Debug, Clone, Default)]
pub struct FieldRules {
    rules: HashMap<(RecordType, String), Vec<FieldRule>>,
}

impl FieldRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule for one field.
    pub fn with_rule(mut self, record_type: RecordType, field: impl Into<String>, rule: FieldRule) -> Self {
        self.add(record_type, field, rule);
        self
    }

    /// Adds a rule for one field, ignoring duplicates.
    pub fn add(&mut self, record_type: RecordType, field: impl Into<String>, rule: FieldRule) {
        let rules = self.rules.entry((record_type, field.into())).or_default();
        if !rules.contains(&rule) {
            rules.push(rule);
        }
    }

    /// Rules registered for the field, empty if none.
    pub fn for_field(&self, record_type: &RecordType, field: &str) -> &[FieldRule] {
        self.rules
            .get(&(record_type.clone(), field.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
