//! Keyword Intent Parser - Offline rule-based intent extraction.
//!
//! Understands short imperative commands:
//!
//! ```text
//! create sales order customer=Acme, delivery date: 2030-01-01
//! show all customers
//! get customer Acme
//! update customer Acme city=Lyon
//! delete sales order SO-00003
//! help
//! ```
//!
//! The record type is the longest known record type name (case-insensitive,
//! optional plural `s`) following the action verb. Anything the parser cannot
//! place yields a clarification instead of an error.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::domain::foundation::Actor;
use crate::domain::intent::{IntentAction, IntentRequest, ParsedIntent};
use crate::domain::schema::RecordType;
use crate::ports::{IntentError, IntentParser, SchemaProvider};

const FILLER_WORDS: &[&str] = &["a", "an", "the", "new", "all", "my", "me"];
const NAME_PREFIXES: &[&str] = &["for", "named", "called", "with name"];

/// Rule-based `IntentParser` using the catalog's record type names.
#[derive(Clone)]
pub struct KeywordIntentParser {
    schema: Arc<dyn SchemaProvider>,
}

impl KeywordIntentParser {
    pub fn new(schema: Arc<dyn SchemaProvider>) -> Self {
        Self { schema }
    }

    fn not_understood(record_types: &[RecordType]) -> ParsedIntent {
        ParsedIntent::Clarification(format!(
            "Sorry, I didn't catch that. Try \"create <record type>\" or \"list <record type>\". \
             Known record types: {}. Type \"help\" to see everything I can do.",
            join_names(record_types)
        ))
    }
}

fn join_names(record_types: &[RecordType]) -> String {
    record_types
        .iter()
        .map(RecordType::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Splits off the first whitespace-delimited word.
fn split_first_word(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.find(char::is_whitespace) {
        Some(index) => (&text[..index], text[index..].trim_start()),
        None => (text, ""),
    }
}

fn strip_fillers(mut text: &str) -> &str {
    loop {
        let (word, rest) = split_first_word(text);
        if FILLER_WORDS.iter().any(|f| word.eq_ignore_ascii_case(f)) {
            text = rest;
        } else {
            return text;
        }
    }
}

/// Byte length of `name` if `text` starts with it (or its plural) on a word boundary.
fn prefix_match_len(text: &str, name: &str) -> Option<usize> {
    let lower = text.to_lowercase();
    let name = name.to_lowercase();
    if !lower.starts_with(&name) {
        return None;
    }

    let mut end = name.len();
    if lower[end..].starts_with('s') {
        let after_plural = &lower[end + 1..];
        if after_plural.is_empty() || after_plural.starts_with(|c: char| !c.is_alphanumeric()) {
            end += 1;
        }
    }

    let rest = &lower[end..];
    if rest.is_empty() || rest.starts_with(|c: char| !c.is_alphanumeric()) {
        Some(end)
    } else {
        None
    }
}

/// Finds the longest record type name at the start of `text`.
fn match_record_type<'a>(text: &'a str, record_types: &[RecordType]) -> Option<(RecordType, &'a str)> {
    record_types
        .iter()
        .filter_map(|rt| prefix_match_len(text, rt.as_str()).map(|len| (rt, len)))
        .max_by_key(|(_, len)| *len)
        .and_then(|(rt, len)| text.get(len..).map(|rest| (rt.clone(), rest.trim())))
}

fn normalize_key(key: &str) -> String {
    key.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

fn strip_name_prefix(text: &str) -> &str {
    let trimmed = text.trim();
    for prefix in NAME_PREFIXES {
        if let Some(head) = trimmed.get(..prefix.len()) {
            if head.eq_ignore_ascii_case(prefix) && trimmed[prefix.len()..].starts_with(' ') {
                return trimmed[prefix.len()..].trim();
            }
        }
    }
    trimmed
}

/// Splits the tail of a command into `key=value` pairs and free text.
///
/// Pairs are separated by commas; a segment without `=` or `:` counts as
/// free text. In the first segment, free text may precede the first pair
/// (`Acme city=Lyon`), split on the last word before the separator.
fn parse_arguments(text: &str) -> (Map<String, Value>, Option<String>) {
    let mut pairs = Map::new();
    let mut free = Vec::new();

    for (index, segment) in text.split(',').map(str::trim).enumerate() {
        if segment.is_empty() {
            continue;
        }
        let Some(separator) = segment.find(['=', ':']) else {
            free.push(segment.to_string());
            continue;
        };

        let (mut key, value) = (&segment[..separator], segment[separator + 1..].trim());
        if index == 0 {
            if let Some(split) = key.trim_end().rfind(char::is_whitespace) {
                free.push(key[..split].trim().to_string());
                key = &key[split..];
            }
        }

        let key = normalize_key(key);
        if !key.is_empty() && !value.is_empty() {
            pairs.insert(key, Value::String(value.to_string()));
        }
    }

    let name = free
        .into_iter()
        .map(|s| strip_name_prefix(&s).to_string())
        .find(|s| !s.is_empty());
    (pairs, name)
}

fn name_filter(name: Option<String>) -> Map<String, Value> {
    let mut filters = Map::new();
    if let Some(name) = name {
        filters.insert("name".to_string(), Value::String(name));
    }
    filters
}

#[async_trait]
impl IntentParser for KeywordIntentParser {
    async fn parse(&self, text: &str, _actor: &Actor) -> Result<ParsedIntent, IntentError> {
        let record_types = self
            .schema
            .record_types()
            .await
            .map_err(|e| IntentError::Unavailable(e.to_string()))?;

        let (verb, rest) = split_first_word(text.trim());
        let verb = verb.trim_matches(|c: char| !c.is_alphanumeric());
        let Some(action) = IntentAction::parse(verb) else {
            return Ok(Self::not_understood(&record_types));
        };

        if action == IntentAction::Help {
            return Ok(ParsedIntent::Action(IntentRequest::new(action, None)));
        }

        let rest = strip_fillers(rest);
        let Some((record_type, tail)) = match_record_type(rest, &record_types) else {
            return Ok(ParsedIntent::Clarification(format!(
                "Which kind of record do you want to {}? I know about: {}.",
                action,
                join_names(&record_types)
            )));
        };

        let (pairs, name) = parse_arguments(tail);
        let request = IntentRequest::new(action, Some(record_type));
        let request = match action {
            IntentAction::Create => request.with_data(pairs),
            IntentAction::List => {
                let mut filters = pairs;
                filters.extend(name_filter(name));
                request.with_filters(filters)
            }
            IntentAction::Update => request.with_data(pairs).with_filters(name_filter(name)),
            IntentAction::Get | IntentAction::Delete => request.with_filters(name_filter(name)),
            IntentAction::Help => request,
        };

        tracing::debug!(action = %request.action, "Parsed keyword intent");
        Ok(ParsedIntent::Action(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::catalog::CatalogSchemaProvider;
    use crate::domain::foundation::UserKey;
    use serde_json::json;

    const CATALOG: &str = r#"
record_types:
  - name: Customer
    fields:
      - { name: customer_name, type: short_text, required: true }
  - name: Sales Order
    fields:
      - { name: customer, type: reference, record_type: Customer, required: true }
  - name: Sales Order Item
    fields:
      - { name: item_code, type: short_text, required: true }
"#;

    fn parser() -> KeywordIntentParser {
        let schema = CatalogSchemaProvider::from_yaml_str(CATALOG).unwrap();
        KeywordIntentParser::new(Arc::new(schema))
    }

    fn actor() -> Actor {
        Actor::new(UserKey::new("ana@example.com").unwrap(), Vec::new())
    }

    async fn action(text: &str) -> IntentRequest {
        match parser().parse(text, &actor()).await.unwrap() {
            ParsedIntent::Action(request) => request,
            other => panic!("Expected action for {:?}, got {:?}", text, other),
        }
    }

    mod record_types {
        use super::*;

        #[tokio::test]
        async fn picks_longest_record_type_name() {
            let request = action("create a new sales order item").await;
            assert_eq!(request.action, IntentAction::Create);
            assert_eq!(request.record_type.unwrap().as_str(), "Sales Order Item");
        }

        #[tokio::test]
        async fn accepts_plural_after_show_all() {
            let request = action("show all Customers").await;
            assert_eq!(request.action, IntentAction::List);
            assert_eq!(request.record_type.unwrap().as_str(), "Customer");
        }

        #[tokio::test]
        async fn unknown_record_type_asks_which_one() {
            let parsed = parser().parse("create spaceship", &actor()).await.unwrap();
            match parsed {
                ParsedIntent::Clarification(text) => assert!(text.contains("Sales Order")),
                other => panic!("Expected clarification, got {:?}", other),
            }
        }

        #[test]
        fn prefix_match_requires_word_boundary() {
            assert_eq!(prefix_match_len("customers", "Customer"), Some(9));
            assert_eq!(prefix_match_len("customer Acme", "Customer"), Some(8));
            assert_eq!(prefix_match_len("customerx", "Customer"), None);
        }
    }

    mod arguments {
        use super::*;

        #[tokio::test]
        async fn create_collects_key_value_pairs() {
            let request = action("create sales order customer=Acme, delivery date: 2030-01-01").await;
            assert_eq!(request.data["customer"], json!("Acme"));
            assert_eq!(request.data["delivery_date"], json!("2030-01-01"));
            assert!(request.filters.is_empty());
        }

        #[tokio::test]
        async fn get_uses_trailing_text_as_name() {
            let request = action("get customer named Acme Corp").await;
            assert_eq!(request.action, IntentAction::Get);
            assert_eq!(request.target_name(), Some("Acme Corp"));
        }

        #[tokio::test]
        async fn update_splits_name_from_first_pair() {
            let request = action("update customer Acme city=Lyon, group=Retail").await;
            assert_eq!(request.target_name(), Some("Acme"));
            assert_eq!(request.data["city"], json!("Lyon"));
            assert_eq!(request.data["group"], json!("Retail"));
        }

        #[tokio::test]
        async fn list_pairs_become_filters() {
            let request = action("list customers group=Retail").await;
            assert_eq!(request.filters["group"], json!("Retail"));
        }
    }

    mod fallbacks {
        use super::*;

        #[tokio::test]
        async fn help_has_no_record_type() {
            let request = action("help").await;
            assert_eq!(request.action, IntentAction::Help);
            assert!(request.record_type.is_none());
        }

        #[tokio::test]
        async fn unknown_verb_returns_clarification() {
            let parsed = parser().parse("good morning", &actor()).await.unwrap();
            assert!(matches!(parsed, ParsedIntent::Clarification(_)));
        }
    }
}
