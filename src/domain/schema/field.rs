//! Field and subgroup descriptors.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::RecordType;

/// Type tag of a scalar field, carrying the data enumerable types need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldType {
    ShortText,
    LongText,
    Integer,
    Decimal,
    Currency,
    Percent,
    Date,
    /// Single choice from a fixed option set.
    Select { options: Vec<String> },
    /// Name of an existing record of another type.
    Reference { record_type: RecordType },
    Boolean,
}

impl FieldType {
    /// Returns true for types answered by picking from a known set.
    pub fn is_enumerable(&self) -> bool {
        matches!(self, Self::Select { .. } | Self::Reference { .. })
    }

    /// Returns true for integer, decimal, currency and percent.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Integer | Self::Decimal | Self::Currency | Self::Percent
        )
    }

    /// Returns true for short and long text.
    pub fn is_text(&self) -> bool {
        matches!(self, Self::ShortText | Self::LongText)
    }

    /// Fixed options of a select field, empty for every other type.
    pub fn options(&self) -> &[String] {
        match self {
            Self::Select { options } => options,
            _ => &[],
        }
    }

    /// Referenced record type of a reference field.
    pub fn referenced_type(&self) -> Option<&RecordType> {
        match self {
            Self::Reference { record_type } => Some(record_type),
            _ => None,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ShortText => "short text",
            Self::LongText => "long text",
            Self::Integer => "integer",
            Self::Decimal => "decimal",
            Self::Currency => "currency",
            Self::Percent => "percent",
            Self::Date => "date",
            Self::Select { .. } => "select",
            Self::Reference { .. } => "reference",
            Self::Boolean => "boolean",
        };
        write!(f, "{}", s)
    }
}

/// Metadata for one scalar field of a record type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub label: String,
    pub field_type: FieldType,
    /// Raw default applied instead of asking, e.g. "Today".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl FieldDescriptor {
    /// Creates a descriptor without a default.
    pub fn new(name: impl Into<String>, label: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            field_type,
            default: None,
        }
    }

    /// Sets the default value.
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// A repeating subgroup (child rows) of a record type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubgroupDescriptor {
    /// Field name the rows are stored under.
    pub name: String,
    pub label: String,
    /// Record type describing a single row.
    pub row_type: RecordType,
}

impl SubgroupDescriptor {
    pub fn new(name: impl Into<String>, label: impl Into<String>, row_type: RecordType) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            row_type,
        }
    }
}
