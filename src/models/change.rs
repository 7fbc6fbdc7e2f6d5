//! Change records
//!
//! A `ChangeRecord` is one detected mutation of a tracked entity. Records are
//! append-only: they are written once by the change tracker and never edited,
//! except that `forget_user` may null out the user reference.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use super::ids::{ChangeId, EntityType, RequestId, UserId};

/// Field name to value mapping of an entity
pub type FieldMap = Map<String, Value>;

/// Kind of mutation recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Create,
    Update,
    Delete,
}

impl Action {
    /// Parse an action from a string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "create" => Some(Self::Create),
            "update" => Some(Self::Update),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Create => write!(f, "CREATE"),
            Action::Update => write!(f, "UPDATE"),
            Action::Delete => write!(f, "DELETE"),
        }
    }
}

/// One detected mutation of a tracked entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub id: ChangeId,

    /// When the change was recorded (UTC)
    pub timestamp: DateTime<Utc>,

    /// Acting user, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_addr: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_host: Option<String>,

    pub entity_type: EntityType,

    pub entity_pk: String,

    pub action: Action,

    /// Field values captured before the write, when a prior row existed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_change_state: Option<FieldMap>,

    /// New values: every field for CREATE, the differing subset for UPDATE,
    /// empty for DELETE
    #[serde(default)]
    pub changes: FieldMap,

    /// Request during which the change happened
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<RequestId>,
}

impl ChangeRecord {
    /// Create a record stamped with the current time and no request context
    pub fn new(
        entity_type: EntityType,
        entity_pk: impl Into<String>,
        action: Action,
        pre_change_state: Option<FieldMap>,
        changes: FieldMap,
    ) -> Self {
        Self {
            id: ChangeId::new(),
            timestamp: Utc::now(),
            user_id: None,
            remote_addr: None,
            remote_host: None,
            entity_type,
            entity_pk: entity_pk.into(),
            action,
            pre_change_state,
            changes,
            request_id: None,
        }
    }

    /// Field values after the change: the prior state overlaid with `changes`
    pub fn post_change_state(&self) -> FieldMap {
        let mut state = self.pre_change_state.clone().unwrap_or_default();
        for (field, value) in &self.changes {
            state.insert(field.clone(), value.clone());
        }
        state
    }

    /// Names of the fields carried in `changes`
    pub fn fields_changed(&self) -> Vec<&str> {
        self.changes.keys().map(String::as_str).collect()
    }
}

impl fmt::Display for ChangeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -- {} [{} {}]",
            self.action,
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            self.entity_type,
            self.entity_pk
        )
    }
}
