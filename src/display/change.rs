//! Change record display formatting
//!
//! Formats change records for terminal output in table and detail views.

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::audit::{format_value, summarize_change};
use crate::models::{ChangeRecord, FieldMap};

#[derive(Tabled)]
struct ChangeRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Timestamp")]
    timestamp: String,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Entity")]
    entity: String,
    #[tabled(rename = "User")]
    user: String,
    #[tabled(rename = "Changes")]
    summary: String,
}

impl From<&ChangeRecord> for ChangeRow {
    fn from(record: &ChangeRecord) -> Self {
        Self {
            id: record.id.to_string(),
            timestamp: record.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            action: record.action.to_string(),
            entity: format!("{} {}", record.entity_type, record.entity_pk),
            user: record
                .user_id
                .as_ref()
                .map(|u| u.to_string())
                .unwrap_or_else(|| "-".to_string()),
            summary: summarize_change(record).unwrap_or_default(),
        }
    }
}

/// Format change records as a table, in the order given
pub fn format_change_list(records: &[ChangeRecord]) -> String {
    if records.is_empty() {
        return "No changes found.".to_string();
    }

    let rows: Vec<ChangeRow> = records.iter().map(ChangeRow::from).collect();
    let mut output = Table::new(rows).with(Style::psql()).to_string();
    output.push('\n');
    output
}

/// Format a single change record's details
pub fn format_change_details(record: &ChangeRecord) -> String {
    let mut output = String::new();

    output.push_str(&format!("Change: {}\n", record));
    output.push_str(&format!("  ID:           {}\n", record.id.as_uuid()));
    output.push_str(&format!("  Entity:       {}\n", record.entity_type));
    output.push_str(&format!("  Primary Key:  {}\n", record.entity_pk));
    output.push_str(&format!("  Action:       {}\n", record.action));
    output.push_str(&format!(
        "  User:         {}\n",
        record.user_id.as_ref().map(|u| u.as_str()).unwrap_or("-")
    ));
    output.push_str(&format!(
        "  Remote Addr:  {}\n",
        record.remote_addr.as_deref().unwrap_or("-")
    ));
    if let Some(host) = &record.remote_host {
        output.push_str(&format!("  Remote Host:  {}\n", host));
    }
    if let Some(request_id) = &record.request_id {
        output.push_str(&format!("  Request:      {}\n", request_id));
    }

    if let Some(summary) = summarize_change(record) {
        output.push_str(&format!("\nSummary: {}\n", summary));
    }

    if let Some(before) = &record.pre_change_state {
        output.push_str("\nPre-change state:\n");
        push_fields(&mut output, before);
    }

    if !record.changes.is_empty() {
        output.push_str("\nPost-change state:\n");
        push_fields(&mut output, &record.post_change_state());
    }

    output
}

fn push_fields(output: &mut String, fields: &FieldMap) {
    let width = fields.keys().map(|k| k.len()).max().unwrap_or(0);
    for (name, value) in fields {
        output.push_str(&format!(
            "  {:<width$}  {}\n",
            name,
            format_value(value),
            width = width
        ));
    }
}
