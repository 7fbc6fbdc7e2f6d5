//! Custom error types for auditlog
//!
//! This module defines the error hierarchy for the crate using thiserror
//! for ergonomic error definitions.

use thiserror::Error;

/// The main error type for audit operations
#[derive(Error, Debug)]
pub enum AuditError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A settings key that the overlay does not recognize
    #[error("Invalid audit setting: '{0}'")]
    UnknownSetting(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Validation errors for entities and records
    #[error("Validation error: {0}")]
    Validation(String),

    /// Record or entity not found
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Duplicate registration or record
    #[error("{entity_type} already exists: {identifier}")]
    Duplicate {
        entity_type: &'static str,
        identifier: String,
    },

    /// Export errors
    #[error("Export error: {0}")]
    Export(String),

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),
}

impl AuditError {
    /// Create a "not found" error for change records
    pub fn change_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Change",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for request records
    pub fn request_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Request",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for tracked entities
    pub fn entity_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Entity",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a configuration error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_) | Self::UnknownSetting(_))
    }
}

impl From<std::io::Error> for AuditError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for AuditError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for audit operations
pub type AuditResult<T> = Result<T, AuditError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AuditError::Config("test error".into());
        assert_eq!(err.to_string(), "Configuration error: test error");
    }

    #[test]
    fn test_unknown_setting_display() {
        let err = AuditError::UnknownSetting("NOPE".into());
        assert_eq!(err.to_string(), "Invalid audit setting: 'NOPE'");
        assert!(err.is_config());
    }

    #[test]
    fn test_not_found_error() {
        let err = AuditError::change_not_found("chg-1234abcd");
        assert_eq!(err.to_string(), "Change not found: chg-1234abcd");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let audit_err: AuditError = io_err.into();
        assert!(matches!(audit_err, AuditError::Io(_)));
    }
}
