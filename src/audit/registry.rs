//! Entry point tying settings, the pre-write bus and the store together

use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, RwLock};

use crate::config::settings::{self, AuditSettings};
use crate::error::{AuditError, AuditResult};
use crate::models::{ChangeRecord, EntityType};
use crate::storage::{AuditStore, ChangeFilter};

use super::entity::Auditable;
use super::request::RequestAuditor;
use super::signals::PresaveBus;
use super::tracker::{ChangeTracker, TrackOptions};

/// Shared audit state for one application
pub struct AuditLog {
    settings: Arc<AuditSettings>,
    bus: Arc<PresaveBus>,
    store: Arc<dyn AuditStore>,
    registered: RwLock<BTreeSet<EntityType>>,
}

impl fmt::Debug for AuditLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuditLog")
            .field("settings", &self.settings)
            .field("bus", &self.bus)
            .field("registered", &self.registered)
            .finish()
    }
}

impl AuditLog {
    /// Create an audit log using the process-wide settings
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self::with_settings(Arc::clone(settings::global()), store)
    }

    pub fn with_settings(settings: Arc<AuditSettings>, store: Arc<dyn AuditStore>) -> Self {
        Self {
            settings,
            bus: Arc::new(PresaveBus::new()),
            store,
            registered: RwLock::new(BTreeSet::new()),
        }
    }

    /// Start tracking changes to `T`
    ///
    /// Each entity type can be registered once.
    pub fn register<T: Auditable>(&self, options: TrackOptions) -> AuditResult<ChangeTracker<T>> {
        let entity_type = T::entity_type();
        let mut registered = self.registered.write().map_err(|e| {
            AuditError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        if !registered.insert(entity_type.clone()) {
            return Err(AuditError::Duplicate {
                entity_type: "Tracked type",
                identifier: entity_type.to_string(),
            });
        }

        tracing::debug!(entity_type = %entity_type, exclude = ?options.exclude, "registered tracked type");
        Ok(ChangeTracker::new(
            options,
            Arc::clone(&self.settings),
            Arc::clone(&self.bus),
            Arc::clone(&self.store),
        ))
    }

    pub fn is_registered<T: Auditable>(&self) -> bool {
        self.registered
            .read()
            .map(|registered| registered.contains(&T::entity_type()))
            .unwrap_or(false)
    }

    /// Request auditing that persists a request record and links changes to it
    pub fn view_audit(&self) -> RequestAuditor {
        RequestAuditor::view(
            Arc::clone(&self.settings),
            Arc::clone(&self.bus),
            Arc::clone(&self.store),
        )
    }

    /// Request auditing that only attaches user and origin to changes
    pub fn middleware(&self) -> RequestAuditor {
        RequestAuditor::middleware(
            Arc::clone(&self.settings),
            Arc::clone(&self.bus),
            Arc::clone(&self.store),
        )
    }

    /// Every change recorded for entities of type `T`
    pub fn changes_for<T: Auditable>(&self) -> AuditResult<Vec<ChangeRecord>> {
        self.store
            .find_changes(&ChangeFilter::new().entity_type(T::entity_type()))
    }

    /// Change history of one entity, oldest first
    pub fn changes_for_entity<T: Auditable>(&self, entity: &T) -> AuditResult<Vec<ChangeRecord>> {
        let Some(pk) = entity.primary_key() else {
            return Ok(Vec::new());
        };
        self.store.find_changes(
            &ChangeFilter::new()
                .entity_type(T::entity_type())
                .entity_pk(pk),
        )
    }

    pub fn settings(&self) -> &Arc<AuditSettings> {
        &self.settings
    }

    pub fn bus(&self) -> &Arc<PresaveBus> {
        &self.bus
    }

    pub fn store(&self) -> &Arc<dyn AuditStore> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryAuditStore;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Ticket {
        id: Option<String>,
    }

    impl Auditable for Ticket {
        const ENTITY_TYPE: &'static str = "support.ticket";

        fn primary_key(&self) -> Option<String> {
            self.id.clone()
        }
    }

    fn audit_log() -> AuditLog {
        AuditLog::with_settings(
            Arc::new(AuditSettings::new()),
            Arc::new(MemoryAuditStore::new()),
        )
    }

    #[test]
    fn test_register_once() {
        let log = audit_log();
        assert!(!log.is_registered::<Ticket>());

        let tracker = log.register::<Ticket>(TrackOptions::new()).unwrap();
        assert_eq!(tracker.entity_type().as_str(), "support.ticket");
        assert!(log.is_registered::<Ticket>());

        let err = log.register::<Ticket>(TrackOptions::new()).unwrap_err();
        assert!(matches!(err, AuditError::Duplicate { .. }));
    }

    #[test]
    fn test_unsaved_entity_has_no_history() {
        let log = audit_log();
        assert!(log.changes_for_entity(&Ticket { id: None }).unwrap().is_empty());
    }
}
