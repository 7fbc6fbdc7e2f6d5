//! Change tracking for persisted entities
//!
//! Records create, update and delete operations with the pre-change state
//! and the changed fields, and correlates them with the request that caused
//! them.
//!
//! # Architecture
//!
//! - `AuditLog`: owns the settings, the pre-write bus and the store. Entity
//!   types are registered here and request auditors are built from it.
//! - `ChangeTracker`: before/after hooks for one entity type. The before-hook
//!   snapshots the persisted row and returns an `AuditMeta` that the
//!   after-hook consumes to produce a `ChangeRecord`.
//! - `RequestAuditor`: connects a subscriber for the lifetime of a request
//!   so changes pick up its user, origin and request record.
//! - `TrackedRepository`: an entity repository that calls the hooks.
//!
//! # Example
//!
//! ```rust,ignore
//! use auditlog::audit::{AuditLog, TrackOptions, TrackedRepository};
//! use auditlog::storage::{EntityRepository, MemoryAuditStore};
//! use std::sync::Arc;
//!
//! let log = AuditLog::new(Arc::new(MemoryAuditStore::new()));
//! let orders = TrackedRepository::new(
//!     EntityRepository::<Order>::new(),
//!     log.register::<Order>(TrackOptions::new().exclude("updated_at"))?,
//! );
//!
//! let scope = log.view_audit().enter(&request)?;
//! orders.save(&mut order)?;
//! drop(scope);
//! ```

mod diff;
mod entity;
mod meta;
mod registry;
mod repository;
mod request;
mod signals;
mod tracker;

pub use diff::{changed_fields, format_value, summarize_change};
pub use entity::{field_map, Auditable, PersistedLookup};
pub use meta::{AuditMeta, ChangeContext};
pub use registry::AuditLog;
pub use repository::TrackedRepository;
pub use request::{RequestAuditor, RequestScope, VIEW_AUDIT_SUFFIX};
pub use signals::{DispatchKey, PresaveBus, PresaveEvent, PresaveHandler, WritePhase};
pub use tracker::{ChangeTracker, TrackOptions};
