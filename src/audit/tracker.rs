//! Change capture for one tracked entity type

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::config::settings::AuditSettings;
use crate::error::{AuditError, AuditResult};
use crate::models::{Action, ChangeRecord, EntityType, FieldMap};
use crate::storage::AuditStore;

use super::diff::changed_fields;
use super::entity::{field_map, Auditable, PersistedLookup};
use super::meta::AuditMeta;
use super::signals::{PresaveBus, PresaveEvent, WritePhase};

/// Options given when registering a type for tracking
#[derive(Debug, Clone, Default)]
pub struct TrackOptions {
    /// Fields left out of snapshots and change sets
    pub exclude: Vec<String>,
}

impl TrackOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exclude(mut self, field: impl Into<String>) -> Self {
        self.exclude.push(field.into());
        self
    }
}

/// Handle returned by `AuditLog::register` for one entity type
///
/// The host calls the before-hook ahead of a write or delete, keeps the
/// returned [`AuditMeta`], and hands it to the matching after-hook.
pub struct ChangeTracker<T> {
    entity_type: EntityType,
    options: TrackOptions,
    settings: Arc<AuditSettings>,
    bus: Arc<PresaveBus>,
    store: Arc<dyn AuditStore>,
    _entity: PhantomData<fn() -> T>,
}

impl<T> fmt::Debug for ChangeTracker<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeTracker")
            .field("entity_type", &self.entity_type)
            .field("options", &self.options)
            .finish()
    }
}

impl<T> Clone for ChangeTracker<T> {
    fn clone(&self) -> Self {
        Self {
            entity_type: self.entity_type.clone(),
            options: self.options.clone(),
            settings: Arc::clone(&self.settings),
            bus: Arc::clone(&self.bus),
            store: Arc::clone(&self.store),
            _entity: PhantomData,
        }
    }
}

impl<T: Auditable> ChangeTracker<T> {
    pub(crate) fn new(
        options: TrackOptions,
        settings: Arc<AuditSettings>,
        bus: Arc<PresaveBus>,
        store: Arc<dyn AuditStore>,
    ) -> Self {
        Self {
            entity_type: T::entity_type(),
            options,
            settings,
            bus,
            store,
            _entity: PhantomData,
        }
    }

    pub fn entity_type(&self) -> &EntityType {
        &self.entity_type
    }

    pub fn options(&self) -> &TrackOptions {
        &self.options
    }

    /// Capture the persisted state of `entity` before it is saved
    pub fn before_write(
        &self,
        entity: &T,
        lookup: &dyn PersistedLookup<T>,
    ) -> AuditResult<AuditMeta> {
        self.capture(entity, lookup, WritePhase::Save)
    }

    /// Capture the persisted state of `entity` before it is deleted
    pub fn before_delete(
        &self,
        entity: &T,
        lookup: &dyn PersistedLookup<T>,
    ) -> AuditResult<AuditMeta> {
        self.capture(entity, lookup, WritePhase::Delete)
    }

    /// Record a CREATE (`created`) or UPDATE after the entity was saved
    pub fn after_write(
        &self,
        entity: &T,
        created: bool,
        meta: AuditMeta,
    ) -> AuditResult<Option<ChangeRecord>> {
        let action = if created { Action::Create } else { Action::Update };
        self.record(entity, action, meta)
    }

    /// Record a DELETE after the entity was removed
    pub fn after_delete(&self, entity: &T, meta: AuditMeta) -> AuditResult<Option<ChangeRecord>> {
        self.record(entity, Action::Delete, meta)
    }

    fn capture(
        &self,
        entity: &T,
        lookup: &dyn PersistedLookup<T>,
        phase: WritePhase,
    ) -> AuditResult<AuditMeta> {
        if !self.settings.change_logging() {
            return Ok(AuditMeta::disabled());
        }

        let mut meta = AuditMeta::enabled();
        let pk = entity.primary_key();

        if let Some(pk) = &pk {
            match lookup.load_persisted(pk)? {
                Some(prior) => meta.pre_save = Some(field_map(&prior, &self.options.exclude)?),
                None => tracing::warn!(
                    entity_type = %self.entity_type,
                    pk = %pk,
                    "no persisted row for entity with an assigned key; recording without a snapshot"
                ),
            }
        }

        let event = PresaveEvent {
            entity_type: &self.entity_type,
            entity_pk: pk.as_deref(),
            phase,
        };
        self.bus.emit(&event, &mut meta);

        tracing::trace!(
            meta = %self.settings.audit_meta_name(),
            entity_type = %self.entity_type,
            snapshot = meta.pre_save.is_some(),
            "captured pre-write state"
        );

        Ok(meta)
    }

    fn record(
        &self,
        entity: &T,
        action: Action,
        meta: AuditMeta,
    ) -> AuditResult<Option<ChangeRecord>> {
        if !meta.enabled || !self.settings.change_logging() {
            return Ok(None);
        }

        let pk = entity.primary_key().ok_or_else(|| {
            AuditError::Validation(format!(
                "{} has no primary key after {}",
                self.entity_type, action
            ))
        })?;

        let changes = match action {
            Action::Delete => FieldMap::new(),
            Action::Update => {
                let current = field_map(entity, &self.options.exclude)?;
                match &meta.pre_save {
                    Some(before) if !before.is_empty() => changed_fields(before, &current),
                    _ => current,
                }
            }
            Action::Create => field_map(entity, &self.options.exclude)?,
        };

        if changes.is_empty() && action != Action::Delete {
            tracing::debug!(entity_type = %self.entity_type, pk = %pk, "no field changes; nothing recorded");
            return Ok(None);
        }

        let AuditMeta {
            pre_save, context, ..
        } = meta;

        let mut record = ChangeRecord::new(self.entity_type.clone(), pk, action, pre_save, changes);
        record.user_id = context.user_id;
        record.remote_addr = context.remote_addr;
        record.remote_host = context.remote_host;
        record.request_id = context.request_id;

        self.store.insert_change(&record)?;
        tracing::debug!(
            id = %record.id,
            action = %record.action,
            entity_type = %record.entity_type,
            pk = %record.entity_pk,
            "recorded change"
        );

        Ok(Some(record))
    }
}
