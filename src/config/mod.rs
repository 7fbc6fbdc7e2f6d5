//! Configuration module for auditlog
//!
//! This module provides:
//! - Data directory resolution
//! - The settings overlay with scoped overrides

pub mod paths;
pub mod settings;

pub use paths::AuditPaths;
pub use settings::{disable_audit, AuditSettings, OverrideGuard, SettingValue};
