//! auditlog - change tracking for persisted entities
//!
//! This library records who changed what on tracked entities: every create,
//! update and delete produces a change record holding the prior field values
//! and the changed fields, optionally linked to the inbound request that
//! caused it.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `audit`: Change capture hooks, request correlation and the pre-write bus
//! - `config`: Data directory paths and the layered audit settings
//! - `error`: Custom error types
//! - `models`: Change and request records, identifiers
//! - `storage`: Audit stores and the entity repository
//! - `display`, `export`, `cli`: Terminal output and the `auditlog` binary
//!
//! # Example
//!
//! ```rust,ignore
//! use auditlog::audit::{AuditLog, TrackOptions};
//! use auditlog::config::{AuditPaths, AuditSettings};
//! use auditlog::storage::JsonlAuditStore;
//! use std::sync::Arc;
//!
//! let paths = AuditPaths::new()?;
//! let settings = Arc::new(AuditSettings::load_or_default(&paths)?);
//! let log = AuditLog::with_settings(settings, Arc::new(JsonlAuditStore::open(&paths)?));
//! let tracker = log.register::<Order>(TrackOptions::new())?;
//! ```

pub mod audit;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod export;
pub mod models;
pub mod storage;

pub use error::{AuditError, AuditResult};
