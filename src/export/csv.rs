//! CSV Export functionality
//!
//! Flattens change and request records into spreadsheet-friendly rows.
//! Nested values (snapshots, meta, bodies) are written as JSON text.

use std::io::Write;

use crate::error::{AuditError, AuditResult};
use crate::models::{ChangeRecord, RequestRecord};
use crate::storage::AuditStore;

const CHANGE_HEADER: [&str; 11] = [
    "ID",
    "Timestamp",
    "Action",
    "Entity Type",
    "Primary Key",
    "User",
    "Remote Addr",
    "Remote Host",
    "Request",
    "Pre-change State",
    "Changes",
];

const REQUEST_HEADER: [&str; 9] = [
    "ID",
    "Timestamp",
    "Method",
    "Path",
    "User",
    "Remote Addr",
    "Meta",
    "Params",
    "Data",
];

fn export_error(e: impl std::fmt::Display) -> AuditError {
    AuditError::Export(e.to_string())
}

fn change_row(record: &ChangeRecord) -> AuditResult<Vec<String>> {
    let pre = match &record.pre_change_state {
        Some(state) => serde_json::to_string(state)?,
        None => String::new(),
    };

    Ok(vec![
        record.id.as_uuid().to_string(),
        record.timestamp.to_rfc3339(),
        record.action.to_string(),
        record.entity_type.to_string(),
        record.entity_pk.clone(),
        record.user_id.as_ref().map(|u| u.to_string()).unwrap_or_default(),
        record.remote_addr.clone().unwrap_or_default(),
        record.remote_host.clone().unwrap_or_default(),
        record
            .request_id
            .map(|r| r.as_uuid().to_string())
            .unwrap_or_default(),
        pre,
        serde_json::to_string(&record.changes)?,
    ])
}

fn request_row(record: &RequestRecord) -> AuditResult<Vec<String>> {
    let data = match &record.data {
        Some(data) => serde_json::to_string(data)?,
        None => String::new(),
    };

    Ok(vec![
        record.id.as_uuid().to_string(),
        record.timestamp.to_rfc3339(),
        record.http_method.clone(),
        record.path.clone(),
        record.user_id.as_ref().map(|u| u.to_string()).unwrap_or_default(),
        record.remote_addr.clone(),
        serde_json::to_string(&record.http_meta)?,
        serde_json::to_string(&record.http_params)?,
        data,
    ])
}

/// Write change records as CSV
pub fn write_changes_csv<W: Write>(records: &[ChangeRecord], writer: W) -> AuditResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(CHANGE_HEADER).map_err(export_error)?;
    for record in records {
        wtr.write_record(change_row(record)?).map_err(export_error)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write request records as CSV
pub fn write_requests_csv<W: Write>(records: &[RequestRecord], writer: W) -> AuditResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(REQUEST_HEADER).map_err(export_error)?;
    for record in records {
        wtr.write_record(request_row(record)?).map_err(export_error)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Export every change in the store to CSV
pub fn export_changes_csv<W: Write>(store: &dyn AuditStore, writer: &mut W) -> AuditResult<()> {
    write_changes_csv(&store.changes()?, writer)
}

/// Export every request in the store to CSV
pub fn export_requests_csv<W: Write>(store: &dyn AuditStore, writer: &mut W) -> AuditResult<()> {
    write_requests_csv(&store.requests()?, writer)
}
