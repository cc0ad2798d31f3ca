//! Field Input Resolver.
//!
//! Turns one line of raw user input into a typed [`FieldValue`] for a single
//! field. Resolution runs in priority order:
//!
//! 1. Numbered selection against the candidate list last shown to the user.
//! 2. Matching against the full option set for select and reference fields
//!    (exact, then substring, then near-miss spelling).
//! 3. Type-specific conversion, followed by any pluggable [`FieldRule`]s.
//!
//! The resolver is pure: it never touches the session, so a failure leaves
//! all collected data exactly as it was.

use chrono::{Duration, NaiveDate};

use super::{FieldRule, ResolveError};
use crate::domain::schema::{FieldDescriptor, FieldType, FieldValue};

/// Inputs shorter than this never take part in near-miss matching.
const MIN_TYPO_INPUT_LEN: usize = 4;

/// Inputs at least this long tolerate two edits instead of one.
const LONG_INPUT_LEN: usize = 8;

/// Everything the resolver needs besides the raw input and the descriptor.
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    /// Candidates presented with the prompt for this field, in display order.
    pub candidates: &'a [String],
    /// Names of existing records, used for reference fields.
    pub references: &'a [String],
    /// Extra rules registered for this field.
    pub rules: &'a [FieldRule],
    pub today: NaiveDate,
}

impl<'a> ResolveContext<'a> {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            candidates: &[],
            references: &[],
            rules: &[],
            today,
        }
    }

    pub fn with_candidates(mut self, candidates: &'a [String]) -> Self {
        self.candidates = candidates;
        self
    }

    pub fn with_references(mut self, references: &'a [String]) -> Self {
        self.references = references;
        self
    }

    pub fn with_rules(mut self, rules: &'a [FieldRule]) -> Self {
        self.rules = rules;
        self
    }
}

/// Resolves raw input for one field.
pub fn resolve(
    raw: &str,
    field: &FieldDescriptor,
    ctx: &ResolveContext<'_>,
) -> Result<FieldValue, ResolveError> {
    let input = raw.trim();

    let value = match select_numbered(input, ctx.candidates)? {
        Some(candidate) => from_candidate(candidate, field, ctx.today)?,
        None => match &field.field_type {
            FieldType::Select { options } => {
                FieldValue::Choice(match_option(input, options, &field.label)?)
            }
            FieldType::Reference { .. } => {
                FieldValue::Reference(match_option(input, ctx.references, &field.label)?)
            }
            _ => convert(input, field, ctx.today)?,
        },
    };

    for rule in ctx.rules {
        rule.check(field, &value, ctx.today)?;
    }
    Ok(value)
}

/// Step 1: an all-digit input indexes the candidate list (1-based).
///
/// Returns `Ok(None)` when numbered selection does not apply.
fn select_numbered<'c>(input: &str, candidates: &'c [String]) -> Result<Option<&'c str>, ResolveError> {
    if candidates.is_empty() || input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(None);
    }

    let out_of_range = || ResolveError::OutOfRange {
        selection: input.to_string(),
        max: candidates.len(),
    };

    let index = input.parse::<usize>().map_err(|_| out_of_range())?;
    if index == 0 || index > candidates.len() {
        return Err(out_of_range());
    }
    Ok(Some(candidates[index - 1].as_str()))
}

/// A chosen candidate is taken as-is for enumerable fields and converted
/// like typed input for everything else (quick dates, Yes/No).
fn from_candidate(
    candidate: &str,
    field: &FieldDescriptor,
    today: NaiveDate,
) -> Result<FieldValue, ResolveError> {
    match &field.field_type {
        FieldType::Select { .. } => Ok(FieldValue::Choice(candidate.to_string())),
        FieldType::Reference { .. } => Ok(FieldValue::Reference(candidate.to_string())),
        _ => convert(candidate, field, today),
    }
}

/// Step 2: match free text against the full option set.
pub fn match_option(input: &str, options: &[String], label: &str) -> Result<String, ResolveError> {
    let needle = input.trim().to_lowercase();
    if needle.is_empty() {
        return Err(ResolveError::invalid(label, "please choose one of the options"));
    }

    let options: Vec<(&String, String)> = options
        .iter()
        .filter(|o| !o.trim().is_empty())
        .map(|o| (o, o.to_lowercase()))
        .collect();

    if let Some((exact, _)) = options.iter().find(|(_, lower)| *lower == needle) {
        return Ok((*exact).clone());
    }

    let substring: Vec<&String> = options
        .iter()
        .filter(|(_, lower)| lower.contains(&needle) || needle.contains(lower.as_str()))
        .map(|(o, _)| *o)
        .collect();

    let matches = if substring.is_empty() {
        near_misses(&needle, &options)
    } else {
        substring
    };

    match matches.as_slice() {
        [] => Err(ResolveError::NotFound {
            label: label.to_string(),
            input: input.trim().to_string(),
        }),
        [only] => Ok((*only).clone()),
        many => Err(ResolveError::Ambiguous {
            label: label.to_string(),
            input: input.trim().to_string(),
            matches: many.iter().map(|m| (*m).clone()).collect(),
        }),
    }
}

/// Options within a small edit distance of the input (transpositions count
/// as one edit).
fn near_misses<'o>(needle: &str, options: &[(&'o String, String)]) -> Vec<&'o String> {
    let len = needle.chars().count();
    if len < MIN_TYPO_INPUT_LEN {
        return Vec::new();
    }
    let max_edits = if len >= LONG_INPUT_LEN { 2 } else { 1 };

    options
        .iter()
        .filter(|(_, lower)| strsim::osa_distance(needle, lower) <= max_edits)
        .map(|(o, _)| *o)
        .collect()
}

/// Step 3: type-specific conversion of free text.
fn convert(input: &str, field: &FieldDescriptor, today: NaiveDate) -> Result<FieldValue, ResolveError> {
    let label = field.label.as_str();
    match &field.field_type {
        FieldType::ShortText | FieldType::LongText => {
            if input.is_empty() {
                Err(ResolveError::invalid(label, "a value is required"))
            } else {
                Ok(FieldValue::Text(input.to_string()))
            }
        }
        FieldType::Integer => parse_integer(input, label).map(FieldValue::Integer),
        FieldType::Decimal | FieldType::Currency => parse_number(input, label).map(FieldValue::Number),
        FieldType::Percent => {
            let input = input.strip_suffix('%').unwrap_or(input).trim_end();
            parse_number(input, label).map(FieldValue::Number)
        }
        FieldType::Date => parse_date(input, label, today).map(FieldValue::Date),
        FieldType::Boolean => parse_boolean(input, label).map(FieldValue::Boolean),
        FieldType::Select { options } => match_option(input, options, label).map(FieldValue::Choice),
        FieldType::Reference { .. } => Err(ResolveError::NotFound {
            label: label.to_string(),
            input: input.to_string(),
        }),
    }
}

fn parse_integer(input: &str, label: &str) -> Result<i64, ResolveError> {
    if let Ok(i) = input.parse::<i64>() {
        return Ok(i);
    }
    let n = parse_number(input, label)
        .map_err(|_| ResolveError::invalid(label, format!("'{}' is not a whole number", input)))?;
    if n.fract() != 0.0 || n < i64::MIN as f64 || n > i64::MAX as f64 {
        return Err(ResolveError::invalid(
            label,
            format!("'{}' is not a whole number", input),
        ));
    }
    Ok(n as i64)
}

fn parse_number(input: &str, label: &str) -> Result<f64, ResolveError> {
    match input.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(n),
        _ => Err(ResolveError::invalid(
            label,
            format!("'{}' is not a valid number", input),
        )),
    }
}

/// Accepts `YYYY-MM-DD` naming a real calendar date, or "today"/"tomorrow".
fn parse_date(input: &str, label: &str, today: NaiveDate) -> Result<NaiveDate, ResolveError> {
    match input.to_lowercase().as_str() {
        "today" => return Ok(today),
        "tomorrow" => return Ok(today + Duration::days(1)),
        _ => {}
    }

    let shape_ok = input.len() == 10
        && input.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shape_ok {
        return Err(ResolveError::invalid(
            label,
            format!("'{}' is not a date, use YYYY-MM-DD", input),
        ));
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d").map_err(|_| {
        ResolveError::invalid(label, format!("'{}' is not a real calendar date", input))
    })
}

fn parse_boolean(input: &str, label: &str) -> Result<bool, ResolveError> {
    match input.to_lowercase().as_str() {
        "yes" | "y" | "true" | "1" | "on" => Ok(true),
        "no" | "n" | "false" | "0" | "off" => Ok(false),
        _ => Err(ResolveError::invalid(label, "please answer yes or no")),
    }
}
