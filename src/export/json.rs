//! JSON Export functionality
//!
//! Exports every change and request record to JSON with schema versioning.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::io::Write;

use crate::error::{AuditError, AuditResult};
use crate::models::{ChangeRecord, RequestRecord};
use crate::storage::AuditStore;

/// Current export schema version
pub const EXPORT_SCHEMA_VERSION: &str = "1.0.0";

/// Full audit log export structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditExport {
    /// Schema version for compatibility checking
    pub schema_version: String,

    pub exported_at: DateTime<Utc>,

    /// Application version that created the export
    pub app_version: String,

    pub changes: Vec<ChangeRecord>,

    pub requests: Vec<RequestRecord>,

    pub metadata: ExportMetadata,
}

/// Export metadata for reference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub change_count: usize,

    pub request_count: usize,

    /// Distinct entity types with at least one change
    pub entity_types: Vec<String>,

    pub earliest_change: Option<DateTime<Utc>>,

    pub latest_change: Option<DateTime<Utc>>,
}

impl AuditExport {
    /// Snapshot the contents of a store
    pub fn from_store(store: &dyn AuditStore) -> AuditResult<Self> {
        let changes = store.changes()?;
        let requests = store.requests()?;

        let entity_types: Vec<String> = changes
            .iter()
            .map(|c| c.entity_type.to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let metadata = ExportMetadata {
            change_count: changes.len(),
            request_count: requests.len(),
            entity_types,
            earliest_change: changes.iter().map(|c| c.timestamp).min(),
            latest_change: changes.iter().map(|c| c.timestamp).max(),
        };

        Ok(Self {
            schema_version: EXPORT_SCHEMA_VERSION.to_string(),
            exported_at: Utc::now(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            changes,
            requests,
            metadata,
        })
    }

    /// Check the schema version and that every change's request exists
    pub fn validate(&self) -> Result<(), String> {
        if self.schema_version != EXPORT_SCHEMA_VERSION {
            return Err(format!(
                "Schema version mismatch: expected {}, got {}",
                EXPORT_SCHEMA_VERSION, self.schema_version
            ));
        }

        let request_ids: HashSet<_> = self.requests.iter().map(|r| r.id).collect();
        for change in &self.changes {
            if let Some(request_id) = change.request_id {
                if !request_ids.contains(&request_id) {
                    return Err(format!(
                        "Change {} references unknown request {}",
                        change.id, request_id
                    ));
                }
            }
        }

        Ok(())
    }
}

/// Export the full audit log to JSON
pub fn export_full_json<W: Write>(
    store: &dyn AuditStore,
    writer: &mut W,
    pretty: bool,
) -> AuditResult<()> {
    let export = AuditExport::from_store(store)?;

    if pretty {
        serde_json::to_writer_pretty(writer, &export)
    } else {
        serde_json::to_writer(writer, &export)
    }
    .map_err(|e| AuditError::Export(e.to_string()))?;

    Ok(())
}

/// Read back a JSON export
pub fn import_from_json(json_str: &str) -> AuditResult<AuditExport> {
    let export: AuditExport =
        serde_json::from_str(json_str).map_err(|e| AuditError::Export(e.to_string()))?;
    export.validate().map_err(AuditError::Export)?;
    Ok(export)
}
