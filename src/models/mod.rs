//! Core data models for auditlog
//!
//! Persisted audit records (changes and requests), the inbound request shape
//! consumed by request correlation, and the identifier newtypes.

pub mod change;
pub mod ids;
pub mod request;

pub use change::{Action, ChangeRecord, FieldMap};
pub use ids::{ChangeId, EntityType, RequestId, UserId};
pub use request::{InboundRequest, RequestRecord, RequestToken, META_OPTIONS};
