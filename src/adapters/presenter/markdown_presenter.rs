//! Markdown Field Presenter
//!
//! Renders chat prompts as lightweight markdown. Enumerable fields get a
//! numbered list; the returned candidates are exactly the listed entries,
//! in the listed order.

use chrono::{Duration, NaiveDate};

use crate::domain::intake::{NestedGroupContext, ResolveError};
use crate::domain::schema::{FieldDescriptor, FieldType};
use crate::ports::{FieldPresenter, GroupIntro, Prompt, PromptContext};

const DEFAULT_PAGE_SIZE: usize = 20;

/// Offsets (in days) and captions of the quick date options.
const QUICK_DATES: [(i64, &str); 4] = [
    (0, "Today"),
    (1, "Tomorrow"),
    (7, "Next Week"),
    (30, "Next Month"),
];

/// Default `FieldPresenter`.
#[derive(Debug, Clone)]
pub struct MarkdownPresenter {
    page_size: usize,
}

impl Default for MarkdownPresenter {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl MarkdownPresenter {
    /// Creates a presenter listing at most `page_size` candidates.
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
        }
    }

    fn numbered_list(&self, lines: &mut Vec<String>, options: &[String]) -> Vec<String> {
        let page: Vec<String> = options.iter().take(self.page_size).cloned().collect();
        for (index, option) in page.iter().enumerate() {
            lines.push(format!("`{}` {}", index + 1, option));
        }
        if options.len() > page.len() {
            lines.push(format!(
                "_Showing {} of {}. Type a name to search all of them._",
                page.len(),
                options.len()
            ));
        }
        page
    }

    fn choice_prompt(&self, lines: &mut Vec<String>, options: &[String], noun: &str) -> Vec<String> {
        let candidates = self.numbered_list(lines, options);
        lines.push(String::new());
        lines.push(format!("Type a **number** or the {} name.", noun));
        candidates
    }

    fn reference_prompt(&self, lines: &mut Vec<String>, ctx: &PromptContext<'_>) -> Vec<String> {
        if ctx.references.is_empty() {
            let target = ctx
                .field
                .field_type
                .referenced_type()
                .map(|rt| rt.as_str())
                .unwrap_or("matching");
            lines.push(format!("No existing {} records found. Type the exact name.", target));
            return Vec::new();
        }
        self.choice_prompt(lines, ctx.references, "record")
    }

    fn date_prompt(lines: &mut Vec<String>, today: NaiveDate) -> Vec<String> {
        lines.push("**Quick options:**".to_string());
        let mut candidates = Vec::with_capacity(QUICK_DATES.len());
        for (index, (offset, caption)) in QUICK_DATES.iter().enumerate() {
            let date = today + Duration::days(*offset);
            let iso = date.format("%Y-%m-%d").to_string();
            lines.push(format!(
                "`{}` **{}** - {} ({})",
                index + 1,
                caption,
                iso,
                date.format("%A")
            ));
            candidates.push(iso);
        }
        lines.push(String::new());
        lines.push("Type a **number** or a date as YYYY-MM-DD.".to_string());
        candidates
    }

    fn boolean_prompt(lines: &mut Vec<String>) -> Vec<String> {
        let candidates = vec!["Yes".to_string(), "No".to_string()];
        for (index, option) in candidates.iter().enumerate() {
            lines.push(format!("`{}` {}", index + 1, option));
        }
        candidates
    }

    fn typed_prompt(lines: &mut Vec<String>, field: &FieldDescriptor) {
        let examples: &[&str] = match field.field_type {
            FieldType::Integer => &["100", "250"],
            FieldType::Decimal => &["25.75", "1000.5"],
            FieldType::Currency => &["100.50", "25000"],
            FieldType::Percent => &["15", "25.5%"],
            FieldType::LongText => &["A few sentences of free text"],
            _ => &[],
        };

        let hint = match field.field_type {
            FieldType::Integer => "Type a whole number.".to_string(),
            FieldType::Decimal | FieldType::Currency => "Type an amount.".to_string(),
            FieldType::Percent => "Type a percentage.".to_string(),
            _ => format!("Type the {} directly.", field.label.to_lowercase()),
        };
        lines.push(hint);

        if !examples.is_empty() {
            let examples: Vec<String> = examples.iter().map(|e| format!("`{}`", e)).collect();
            lines.push(format!("Examples: {}", examples.join(", ")));
        }
    }
}

fn row_summary(group: &NestedGroupContext, row_number: usize) -> Option<String> {
    let row = group.accepted_rows.get(row_number.checked_sub(1)?)?;
    let parts: Vec<String> = group
        .row_fields
        .iter()
        .filter_map(|field| {
            row.get(&field.name)
                .map(|value| format!("{}: {}", field.label, value))
        })
        .collect();
    Some(parts.join(", "))
}

impl FieldPresenter for MarkdownPresenter {
    fn field_prompt(&self, ctx: &PromptContext<'_>) -> Prompt {
        let mut lines = Vec::new();

        if let Some(error) = ctx.error {
            lines.push(format!("{}", error));
            lines.push(String::new());
        }

        if let Some(group) = ctx.group {
            lines.push(format!(
                "**{} Row {}** (field {} of {})",
                group.label, group.row_number, group.field_number, group.field_count
            ));
        }
        lines.push(format!("**{}** for {}:", ctx.field.label, ctx.record_type));

        let candidates = match (ctx.error.and_then(ResolveError::disambiguation), &ctx.field.field_type) {
            (Some(matches), _) => self.choice_prompt(&mut lines, matches, "exact"),
            (None, FieldType::Select { options }) => self.choice_prompt(&mut lines, options, "option"),
            (None, FieldType::Reference { .. }) => self.reference_prompt(&mut lines, ctx),
            (None, FieldType::Date) => Self::date_prompt(&mut lines, ctx.today),
            (None, FieldType::Boolean) => Self::boolean_prompt(&mut lines),
            (None, _) => {
                Self::typed_prompt(&mut lines, ctx.field);
                Vec::new()
            }
        };

        lines.push("_Type `cancel` to stop._".to_string());
        Prompt {
            text: lines.join("\n"),
            candidates,
        }
    }

    fn group_intro(&self, intro: &GroupIntro<'_>) -> String {
        let group = intro.group;
        let mut lines = Vec::new();

        if intro.declined_before {
            lines.push(format!(
                "A {} can't be saved without at least one {} row.",
                intro.record_type, group.label
            ));
        } else {
            lines.push(format!(
                "**{}** ({}) needs at least one row.",
                group.label, group.row_type
            ));
        }

        let required: Vec<&str> = group.row_fields.iter().map(|f| f.label.as_str()).collect();
        if !required.is_empty() {
            lines.push(format!("Each row asks for: {}", required.join(", ")));
        }
        let optional: Vec<&str> = group
            .optional_row_fields
            .iter()
            .map(|f| f.label.as_str())
            .collect();
        if !optional.is_empty() {
            lines.push(format!("Optional, not asked: {}", optional.join(", ")));
        }

        lines.push(String::new());
        lines.push(format!("Add a {} row now? (yes/no)", group.label));
        lines.join("\n")
    }

    fn row_added(&self, group: &NestedGroupContext, row_number: usize) -> String {
        let mut text = format!("Row {} added to {}.", row_number, group.label);
        if let Some(summary) = row_summary(group, row_number).filter(|s| !s.is_empty()) {
            text.push_str(&format!(" ({})", summary));
        }
        text.push_str("\n\nAdd another row? (yes/no)");
        text
    }
}
