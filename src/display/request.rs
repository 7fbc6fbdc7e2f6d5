//! Request record display formatting

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::models::{ChangeRecord, RequestRecord};

use super::change::format_change_list;

#[derive(Tabled)]
struct RequestRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Timestamp")]
    timestamp: String,
    #[tabled(rename = "Method")]
    method: String,
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "User")]
    user: String,
    #[tabled(rename = "Remote Addr")]
    remote_addr: String,
}

impl From<&RequestRecord> for RequestRow {
    fn from(record: &RequestRecord) -> Self {
        Self {
            id: record.id.to_string(),
            timestamp: record.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            method: record.http_method.clone(),
            path: record.path.clone(),
            user: record
                .user_id
                .as_ref()
                .map(|u| u.to_string())
                .unwrap_or_else(|| "-".to_string()),
            remote_addr: record.remote_addr.clone(),
        }
    }
}

/// Format request records as a table, in the order given
pub fn format_request_list(records: &[RequestRecord]) -> String {
    if records.is_empty() {
        return "No requests found.".to_string();
    }

    let rows: Vec<RequestRow> = records.iter().map(RequestRow::from).collect();
    let mut output = Table::new(rows).with(Style::psql()).to_string();
    output.push('\n');
    output
}

/// Format a request record with the changes made while handling it
pub fn format_request_details(record: &RequestRecord, changes: &[ChangeRecord]) -> String {
    let mut output = String::new();

    output.push_str(&format!("Request: {}\n", record));
    output.push_str(&format!("  ID:           {}\n", record.id.as_uuid()));
    output.push_str(&format!(
        "  Timestamp:    {}\n",
        record.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    output.push_str(&format!(
        "  User:         {}\n",
        record.user_id.as_ref().map(|u| u.as_str()).unwrap_or("-")
    ));
    output.push_str(&format!("  Remote Addr:  {}\n", record.remote_addr));

    if !record.http_meta.is_empty() {
        output.push_str("\nMeta:\n");
        for (key, value) in &record.http_meta {
            output.push_str(&format!("  {} = {}\n", key, value));
        }
    }

    if !record.http_params.is_empty() {
        output.push_str("\nQuery:\n");
        for (key, value) in &record.http_params {
            output.push_str(&format!("  {} = {}\n", key, value));
        }
    }

    if let Some(data) = &record.data {
        output.push_str(&format!("\nBody:\n  {}\n", data));
    }

    output.push_str(&format!("\nChanges ({}):\n", changes.len()));
    output.push_str(&format_change_list(changes));

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InboundRequest;
    use serde_json::json;

    fn record() -> RequestRecord {
        RequestRecord::from_request(
            &InboundRequest::new("post", "/orders")
                .with_meta("REMOTE_ADDR", "10.1.1.1")
                .with_query("page", json!("2"))
                .with_body(json!({"qty": 3}))
                .with_user("bob"),
        )
    }

    #[test]
    fn test_list() {
        let output = format_request_list(&[record()]);
        assert!(output.contains("POST"));
        assert!(output.contains("/orders"));
        assert!(output.contains("10.1.1.1"));
        assert_eq!(format_request_list(&[]), "No requests found.");
    }

    #[test]
    fn test_details_without_changes() {
        let output = format_request_details(&record(), &[]);
        assert!(output.starts_with("Request: POST - /orders"));
        assert!(output.contains("REMOTE_ADDR = 10.1.1.1"));
        assert!(output.contains("Changes (0):"));
        assert!(output.contains("No changes found."));
    }
}
