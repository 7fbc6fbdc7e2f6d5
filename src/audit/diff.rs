//! Field diffs for change records
//!
//! `changed_fields` computes the change set stored on UPDATE records;
//! `summarize_change` renders a record's changes for terminal output.

use serde_json::Value;

use crate::models::{Action, ChangeRecord, FieldMap};

/// Fields of `after` whose value differs from `before`, with their new values
///
/// Comparison is by value. A field absent from `before` counts as changed.
pub fn changed_fields(before: &FieldMap, after: &FieldMap) -> FieldMap {
    after
        .iter()
        .filter(|(name, value)| before.get(name.as_str()) != Some(*value))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

/// Human-readable summary of a change record, or `None` if nothing changed
pub fn summarize_change(record: &ChangeRecord) -> Option<String> {
    if record.action == Action::Delete {
        return Some("(deleted)".to_string());
    }

    let empty = FieldMap::new();
    let before = record.pre_change_state.as_ref().unwrap_or(&empty);

    let changes: Vec<String> = record
        .changes
        .iter()
        .map(|(field, after)| match before.get(field) {
            Some(old) => format!("{}: {} -> {}", field, format_value(old), format_value(after)),
            None => format!("{}: (added) -> {}", field, format_value(after)),
        })
        .collect();

    if changes.is_empty() {
        None
    } else {
        Some(changes.join(", "))
    }
}

/// Format a JSON value for human-readable display
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => {
            // Truncate long strings
            if s.chars().count() > 50 {
                let head: String = s.chars().take(47).collect();
                format!("\"{}...\"", head)
            } else {
                format!("\"{}\"", s)
            }
        }
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(obj) => format!("{{{} fields}}", obj.len()),
    }
}
