//! Export module for auditlog
//!
//! Provides audit log export in multiple formats:
//! - CSV: change or request records as flat rows (spreadsheet-compatible)
//! - JSON: machine-readable full export
//! - YAML: human-readable full export

pub mod csv;
pub mod json;
pub mod yaml;

pub use csv::{export_changes_csv, export_requests_csv, write_changes_csv, write_requests_csv};
pub use json::{export_full_json, import_from_json, AuditExport, ExportMetadata, EXPORT_SCHEMA_VERSION};
pub use yaml::{export_full_yaml, import_from_yaml};
