//! Storage layer for auditlog
//!
//! Audit records go through the [`AuditStore`] trait. Two implementations are
//! provided: an in-memory store and an append-only JSONL store. The
//! [`EntityRepository`] is a small keyed repository for application entities
//! that the change tracker can snapshot from.

pub mod entities;
pub mod file_io;
pub mod jsonl;
pub mod memory;

pub use entities::{EntityRepository, Persistable};
pub use jsonl::JsonlAuditStore;
pub use memory::MemoryAuditStore;

use crate::error::{AuditError, AuditResult};
use crate::models::{Action, ChangeRecord, EntityType, RequestId, RequestRecord, UserId};

/// Persistence for audit records
///
/// Records are returned in insertion (chronological) order.
pub trait AuditStore: Send + Sync {
    fn insert_change(&self, record: &ChangeRecord) -> AuditResult<()>;

    fn insert_request(&self, record: &RequestRecord) -> AuditResult<()>;

    fn changes(&self) -> AuditResult<Vec<ChangeRecord>>;

    fn requests(&self) -> AuditResult<Vec<RequestRecord>>;

    /// Null out every reference to `user`; returns the number of records touched
    fn forget_user(&self, user: &UserId) -> AuditResult<usize>;

    /// Changes matching a filter, oldest first
    fn find_changes(&self, filter: &ChangeFilter) -> AuditResult<Vec<ChangeRecord>> {
        Ok(self
            .changes()?
            .into_iter()
            .filter(|record| filter.matches(record))
            .collect())
    }

    /// The most recent change matching a filter
    fn latest_change(&self, filter: &ChangeFilter) -> AuditResult<Option<ChangeRecord>> {
        Ok(self.find_changes(filter)?.pop())
    }

    /// Changes recorded while handling a request
    fn changes_for_request(&self, request_id: RequestId) -> AuditResult<Vec<ChangeRecord>> {
        self.find_changes(&ChangeFilter::new().request(request_id))
    }

    /// Look up a change by full id or short displayed form
    fn resolve_change(&self, reference: &str) -> AuditResult<ChangeRecord> {
        let mut matches: Vec<_> = self
            .changes()?
            .into_iter()
            .filter(|record| record.id.matches_reference(reference))
            .collect();
        match matches.len() {
            0 => Err(AuditError::change_not_found(reference)),
            1 => Ok(matches.remove(0)),
            n => Err(AuditError::Validation(format!(
                "'{}' matches {} changes; use a longer id",
                reference, n
            ))),
        }
    }

    /// Look up a request by full id or short displayed form
    fn resolve_request(&self, reference: &str) -> AuditResult<RequestRecord> {
        let mut matches: Vec<_> = self
            .requests()?
            .into_iter()
            .filter(|record| record.id.matches_reference(reference))
            .collect();
        match matches.len() {
            0 => Err(AuditError::request_not_found(reference)),
            1 => Ok(matches.remove(0)),
            n => Err(AuditError::Validation(format!(
                "'{}' matches {} requests; use a longer id",
                reference, n
            ))),
        }
    }
}

/// Criteria for selecting change records
///
/// Unset criteria match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeFilter {
    pub entity_type: Option<EntityType>,
    pub entity_pk: Option<String>,
    pub action: Option<Action>,
    pub user_id: Option<UserId>,
    pub request_id: Option<RequestId>,
}

impl ChangeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entity_type(mut self, entity_type: impl Into<EntityType>) -> Self {
        self.entity_type = Some(entity_type.into());
        self
    }

    pub fn entity_pk(mut self, pk: impl Into<String>) -> Self {
        self.entity_pk = Some(pk.into());
        self
    }

    pub fn action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    pub fn user(mut self, user: impl Into<UserId>) -> Self {
        self.user_id = Some(user.into());
        self
    }

    pub fn request(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    pub fn matches(&self, record: &ChangeRecord) -> bool {
        self.entity_type
            .as_ref()
            .map_or(true, |t| *t == record.entity_type)
            && self
                .entity_pk
                .as_ref()
                .map_or(true, |pk| *pk == record.entity_pk)
            && self.action.map_or(true, |a| a == record.action)
            && self
                .user_id
                .as_ref()
                .map_or(true, |u| record.user_id.as_ref() == Some(u))
            && self
                .request_id
                .map_or(true, |r| record.request_id == Some(r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldMap;

    fn record(entity_type: &str, pk: &str, action: Action) -> ChangeRecord {
        ChangeRecord::new(EntityType::from(entity_type), pk, action, None, FieldMap::new())
    }

    #[test]
    fn test_empty_filter_matches_all() {
        let filter = ChangeFilter::new();
        assert!(filter.matches(&record("a.b", "1", Action::Create)));
    }

    #[test]
    fn test_filter_combines_criteria() {
        let filter = ChangeFilter::new()
            .entity_type("shop.order")
            .entity_pk("7")
            .action(Action::Update);

        assert!(filter.matches(&record("shop.order", "7", Action::Update)));
        assert!(!filter.matches(&record("shop.order", "7", Action::Delete)));
        assert!(!filter.matches(&record("shop.order", "8", Action::Update)));
        assert!(!filter.matches(&record("shop.item", "7", Action::Update)));
    }

    #[test]
    fn test_user_filter_requires_user() {
        let filter = ChangeFilter::new().user("alice");
        let mut change = record("a.b", "1", Action::Create);
        assert!(!filter.matches(&change));

        change.user_id = Some(UserId::new("alice"));
        assert!(filter.matches(&change));
    }

    #[test]
    fn test_provided_lookups() {
        let store = MemoryAuditStore::new();
        let first = record("shop.order", "1", Action::Create);
        let second = record("shop.order", "1", Action::Update);
        store.insert_change(&first).unwrap();
        store.insert_change(&second).unwrap();

        let latest = store
            .latest_change(&ChangeFilter::new().entity_pk("1"))
            .unwrap()
            .unwrap();
        assert_eq!(latest.id, second.id);

        let resolved = store.resolve_change(&first.id.as_uuid().to_string()).unwrap();
        assert_eq!(resolved.id, first.id);

        assert!(store.resolve_change("chg-zzzzzzzz").unwrap_err().is_not_found());
    }
}
