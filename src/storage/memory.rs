//! In-memory audit store

use std::sync::RwLock;

use crate::error::{AuditError, AuditResult};
use crate::models::{ChangeRecord, RequestRecord, UserId};

use super::AuditStore;

/// Audit store that keeps records in memory
#[derive(Debug, Default)]
pub struct MemoryAuditStore {
    changes: RwLock<Vec<ChangeRecord>>,
    requests: RwLock<Vec<RequestRecord>>,
}

impl MemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn change_count(&self) -> AuditResult<usize> {
        Ok(self.changes()?.len())
    }

    pub fn request_count(&self) -> AuditResult<usize> {
        Ok(self.requests()?.len())
    }
}

impl AuditStore for MemoryAuditStore {
    fn insert_change(&self, record: &ChangeRecord) -> AuditResult<()> {
        let mut changes = self.changes.write().map_err(|e| {
            AuditError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;
        changes.push(record.clone());
        Ok(())
    }

    fn insert_request(&self, record: &RequestRecord) -> AuditResult<()> {
        let mut requests = self.requests.write().map_err(|e| {
            AuditError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;
        requests.push(record.clone());
        Ok(())
    }

    fn changes(&self) -> AuditResult<Vec<ChangeRecord>> {
        let changes = self.changes.read().map_err(|e| {
            AuditError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;
        Ok(changes.clone())
    }

    fn requests(&self) -> AuditResult<Vec<RequestRecord>> {
        let requests = self.requests.read().map_err(|e| {
            AuditError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;
        Ok(requests.clone())
    }

    fn forget_user(&self, user: &UserId) -> AuditResult<usize> {
        let mut touched = 0;

        let mut changes = self.changes.write().map_err(|e| {
            AuditError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;
        for record in changes.iter_mut().filter(|r| r.user_id.as_ref() == Some(user)) {
            record.user_id = None;
            touched += 1;
        }

        let mut requests = self.requests.write().map_err(|e| {
            AuditError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;
        for record in requests.iter_mut().filter(|r| r.user_id.as_ref() == Some(user)) {
            record.user_id = None;
            touched += 1;
        }

        Ok(touched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Action, EntityType, FieldMap, InboundRequest};

    #[test]
    fn test_insert_and_read() {
        let store = MemoryAuditStore::new();
        let change = ChangeRecord::new(
            EntityType::from("shop.order"),
            "1",
            Action::Create,
            None,
            FieldMap::new(),
        );
        store.insert_change(&change).unwrap();
        store
            .insert_request(&RequestRecord::from_request(&InboundRequest::new("GET", "/")))
            .unwrap();

        assert_eq!(store.change_count().unwrap(), 1);
        assert_eq!(store.request_count().unwrap(), 1);
        assert_eq!(store.changes().unwrap()[0], change);
    }

    #[test]
    fn test_forget_user() {
        let store = MemoryAuditStore::new();
        let mut change = ChangeRecord::new(
            EntityType::from("shop.order"),
            "1",
            Action::Create,
            None,
            FieldMap::new(),
        );
        change.user_id = Some(UserId::new("bob"));
        store.insert_change(&change).unwrap();

        let request = InboundRequest::new("POST", "/orders/").with_user("bob");
        store
            .insert_request(&RequestRecord::from_request(&request))
            .unwrap();

        assert_eq!(store.forget_user(&UserId::new("bob")).unwrap(), 2);
        assert!(store.changes().unwrap()[0].user_id.is_none());
        assert!(store.requests().unwrap()[0].user_id.is_none());
        assert_eq!(store.forget_user(&UserId::new("bob")).unwrap(), 0);
    }
}
