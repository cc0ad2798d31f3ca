//! Intent domain module.
//!
//! Structured output of the `IntentParser` port: either an action on a
//! record type or a clarification to show the user as-is.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::domain::schema::RecordType;

/// Operation requested by a free-form command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentAction {
    Create,
    List,
    Get,
    Update,
    Delete,
    Help,
}

impl IntentAction {
    /// Parses an action name or common synonym.
    pub fn parse(word: &str) -> Option<Self> {
        match word.trim().to_lowercase().as_str() {
            "create" | "make" | "add" | "new" => Some(Self::Create),
            "list" | "show" | "display" | "find" | "search" => Some(Self::List),
            "get" | "open" | "view" | "read" => Some(Self::Get),
            "update" | "change" | "modify" | "edit" | "set" => Some(Self::Update),
            "delete" | "remove" => Some(Self::Delete),
            "help" => Some(Self::Help),
            _ => None,
        }
    }
}

impl fmt::Display for IntentAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Create => "create",
            Self::List => "list",
            Self::Get => "get",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Help => "help",
        };
        write!(f, "{}", s)
    }
}

/// A structured request extracted from free text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentRequest {
    pub action: IntentAction,
    /// Absent only for `Help`.
    pub record_type: Option<RecordType>,
    /// Field values supplied with the command.
    #[serde(default)]
    pub data: Map<String, Value>,
    /// Record selector for get/update/delete and filters for list.
    #[serde(default)]
    pub filters: Map<String, Value>,
}

impl IntentRequest {
    pub fn new(action: IntentAction, record_type: Option<RecordType>) -> Self {
        Self {
            action,
            record_type,
            data: Map::new(),
            filters: Map::new(),
        }
    }

    pub fn with_data(mut self, data: Map<String, Value>) -> Self {
        self.data = data;
        self
    }

    pub fn with_filters(mut self, filters: Map<String, Value>) -> Self {
        self.filters = filters;
        self
    }

    /// Name of the single record the request targets, if any.
    ///
    /// Looks for `name` first, then any string filter value.
    pub fn target_name(&self) -> Option<&str> {
        self.filters
            .get("name")
            .and_then(Value::as_str)
            .or_else(|| self.filters.values().find_map(Value::as_str))
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Result of parsing one free-form message.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedIntent {
    Action(IntentRequest),
    /// Text to return to the user verbatim.
    Clarification(String),
}
