//! Keyed repository for application entities
//!
//! Rows are held in memory and can be loaded from and saved to a JSON file.
//! Entities without a primary key get the next integer key on save.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::RwLock;

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::audit::{Auditable, PersistedLookup};
use crate::error::{AuditError, AuditResult};

use super::file_io::{read_json, write_json_atomic};

/// An entity the repository can store
pub trait Persistable: Auditable + Clone + DeserializeOwned {
    /// Called once when the repository assigns an identity on first save
    fn set_primary_key(&mut self, pk: String);
}

/// Serializable repository contents
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
struct RepositoryData<T> {
    rows: Vec<T>,
}

impl<T> Default for RepositoryData<T> {
    fn default() -> Self {
        Self { rows: Vec::new() }
    }
}

#[derive(Debug)]
struct Rows<T> {
    by_pk: BTreeMap<String, T>,
    next_key: u64,
}

/// Repository for one entity type
#[derive(Debug)]
pub struct EntityRepository<T> {
    path: Option<PathBuf>,
    data: RwLock<Rows<T>>,
}

impl<T: Persistable> Default for EntityRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Persistable> EntityRepository<T> {
    /// Create an in-memory repository
    pub fn new() -> Self {
        Self {
            path: None,
            data: RwLock::new(Rows {
                by_pk: BTreeMap::new(),
                next_key: 1,
            }),
        }
    }

    /// Create a repository backed by a JSON file
    pub fn with_file(path: PathBuf) -> Self {
        Self {
            path: Some(path),
            ..Self::new()
        }
    }

    /// Load rows from the backing file, if any
    pub fn load(&self) -> AuditResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let file_data: RepositoryData<T> = read_json(path)?;

        let mut data = self.data.write().map_err(|e| {
            AuditError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        data.by_pk.clear();
        data.next_key = 1;
        for row in file_data.rows {
            let pk = row.primary_key().ok_or_else(|| {
                AuditError::Storage(format!("{} row without a primary key", T::ENTITY_TYPE))
            })?;
            if let Ok(numeric) = pk.parse::<u64>() {
                data.next_key = data.next_key.max(numeric + 1);
            }
            data.by_pk.insert(pk, row);
        }

        Ok(())
    }

    /// Save rows to the backing file, if any
    pub fn save(&self) -> AuditResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let data = self.data.read().map_err(|e| {
            AuditError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let file_data = RepositoryData {
            rows: data.by_pk.values().cloned().collect(),
        };
        write_json_atomic(path, &file_data)
    }

    /// Insert or update a row, assigning a key when the entity has none
    ///
    /// Returns the primary key the row is stored under.
    pub fn put(&self, entity: &mut T) -> AuditResult<String> {
        let mut data = self.data.write().map_err(|e| {
            AuditError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        let pk = match entity.primary_key() {
            Some(pk) => pk,
            None => {
                let pk = data.next_key.to_string();
                data.next_key += 1;
                entity.set_primary_key(pk.clone());
                pk
            }
        };

        data.by_pk.insert(pk.clone(), entity.clone());
        Ok(pk)
    }

    pub fn get(&self, pk: &str) -> AuditResult<Option<T>> {
        let data = self.data.read().map_err(|e| {
            AuditError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;
        Ok(data.by_pk.get(pk).cloned())
    }

    pub fn exists(&self, pk: &str) -> AuditResult<bool> {
        let data = self.data.read().map_err(|e| {
            AuditError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;
        Ok(data.by_pk.contains_key(pk))
    }

    /// Remove a row, returning it if it existed
    pub fn remove(&self, pk: &str) -> AuditResult<Option<T>> {
        let mut data = self.data.write().map_err(|e| {
            AuditError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;
        Ok(data.by_pk.remove(pk))
    }

    pub fn get_all(&self) -> AuditResult<Vec<T>> {
        let data = self.data.read().map_err(|e| {
            AuditError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;
        Ok(data.by_pk.values().cloned().collect())
    }

    pub fn count(&self) -> AuditResult<usize> {
        let data = self.data.read().map_err(|e| {
            AuditError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;
        Ok(data.by_pk.len())
    }
}

impl<T: Persistable> PersistedLookup<T> for EntityRepository<T> {
    fn load_persisted(&self, pk: &str) -> AuditResult<Option<T>> {
        self.get(pk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        id: Option<String>,
        body: String,
    }

    impl Auditable for Note {
        const ENTITY_TYPE: &'static str = "notes.note";

        fn primary_key(&self) -> Option<String> {
            self.id.clone()
        }
    }

    impl Persistable for Note {
        fn set_primary_key(&mut self, pk: String) {
            self.id = Some(pk);
        }
    }

    fn note(body: &str) -> Note {
        Note {
            id: None,
            body: body.to_string(),
        }
    }

    #[test]
    fn test_put_assigns_sequential_keys() {
        let repo = EntityRepository::new();
        let mut first = note("a");
        let mut second = note("b");

        assert_eq!(repo.put(&mut first).unwrap(), "1");
        assert_eq!(repo.put(&mut second).unwrap(), "2");
        assert_eq!(first.id.as_deref(), Some("1"));
        assert_eq!(repo.count().unwrap(), 2);
    }

    #[test]
    fn test_put_keeps_existing_key() {
        let repo = EntityRepository::new();
        let mut manual = Note {
            id: Some("abc".into()),
            body: "x".into(),
        };
        assert_eq!(repo.put(&mut manual).unwrap(), "abc");
        assert!(repo.exists("abc").unwrap());
    }

    #[test]
    fn test_remove() {
        let repo = EntityRepository::new();
        let mut row = note("gone");
        let pk = repo.put(&mut row).unwrap();

        assert_eq!(repo.remove(&pk).unwrap(), Some(row));
        assert!(repo.get(&pk).unwrap().is_none());
        assert!(repo.remove(&pk).unwrap().is_none());
    }

    #[test]
    fn test_save_and_reload_continues_keys() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("notes.json");

        let repo = EntityRepository::with_file(path.clone());
        repo.put(&mut note("a")).unwrap();
        repo.put(&mut note("b")).unwrap();
        repo.save().unwrap();

        let reloaded: EntityRepository<Note> = EntityRepository::with_file(path);
        reloaded.load().unwrap();
        assert_eq!(reloaded.count().unwrap(), 2);

        let mut third = note("c");
        assert_eq!(reloaded.put(&mut third).unwrap(), "3");
    }

    #[test]
    fn test_lookup_reads_persisted_row() {
        let repo = EntityRepository::new();
        let mut row = note("persisted");
        let pk = repo.put(&mut row).unwrap();

        row.body = "edited in memory".into();
        let persisted = repo.load_persisted(&pk).unwrap().unwrap();
        assert_eq!(persisted.body, "persisted");
    }
}
