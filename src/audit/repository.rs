//! Repository that drives the change hooks around every write

use crate::error::{AuditError, AuditResult};
use crate::models::ChangeRecord;
use crate::storage::{EntityRepository, Persistable};

use super::tracker::ChangeTracker;

/// An [`EntityRepository`] whose saves and deletes are change-tracked
#[derive(Debug)]
pub struct TrackedRepository<T> {
    repo: EntityRepository<T>,
    tracker: ChangeTracker<T>,
}

impl<T: Persistable> TrackedRepository<T> {
    pub fn new(repo: EntityRepository<T>, tracker: ChangeTracker<T>) -> Self {
        Self { repo, tracker }
    }

    pub fn tracker(&self) -> &ChangeTracker<T> {
        &self.tracker
    }

    pub fn get(&self, pk: &str) -> AuditResult<Option<T>> {
        self.repo.get(pk)
    }

    pub fn all(&self) -> AuditResult<Vec<T>> {
        self.repo.get_all()
    }

    /// Insert or update `entity`, assigning a key on first save
    ///
    /// Returns the change recorded for this write, if any.
    pub fn save(&self, entity: &mut T) -> AuditResult<Option<ChangeRecord>> {
        let created = match entity.primary_key() {
            None => true,
            Some(pk) => !self.repo.exists(&pk)?,
        };

        let meta = self.tracker.before_write(entity, &self.repo)?;
        self.repo.put(entity)?;
        self.repo.save()?;
        self.tracker.after_write(entity, created, meta)
    }

    /// Delete the row stored under `pk`
    pub fn delete(&self, pk: &str) -> AuditResult<Option<ChangeRecord>> {
        let entity = self
            .repo
            .get(pk)?
            .ok_or_else(|| AuditError::entity_not_found(format!("{} {}", T::ENTITY_TYPE, pk)))?;

        let meta = self.tracker.before_delete(&entity, &self.repo)?;
        self.repo.remove(pk)?;
        self.repo.save()?;
        self.tracker.after_delete(&entity, meta)
    }
}
