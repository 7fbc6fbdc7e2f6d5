//! YAML Export functionality
//!
//! Exports the full audit log to YAML for human review.

use std::io::Write;

use crate::error::{AuditError, AuditResult};
use crate::export::json::AuditExport;
use crate::storage::AuditStore;

/// Export the full audit log to YAML format
pub fn export_full_yaml<W: Write>(store: &dyn AuditStore, writer: &mut W) -> AuditResult<()> {
    let export = AuditExport::from_store(store)?;

    let header = format!(
        "# auditlog export\n# Generated: {}\n# App Version: {}\n\n",
        export.exported_at, export.app_version
    );
    writer
        .write_all(header.as_bytes())
        .map_err(|e| AuditError::Export(e.to_string()))?;

    serde_yaml::to_writer(writer, &export).map_err(|e| AuditError::Export(e.to_string()))?;

    Ok(())
}

/// Read back a YAML export
pub fn import_from_yaml(yaml_str: &str) -> AuditResult<AuditExport> {
    let export: AuditExport =
        serde_yaml::from_str(yaml_str).map_err(|e| AuditError::Export(e.to_string()))?;
    export.validate().map_err(AuditError::Export)?;
    Ok(export)
}
