//! Append-only JSONL audit store
//!
//! Changes and requests are written to two line-delimited JSON files, one
//! record per line, flushed after every write.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::config::paths::AuditPaths;
use crate::error::{AuditError, AuditResult};
use crate::models::{ChangeRecord, RequestRecord, UserId};

use super::file_io::{append_jsonl, read_jsonl, write_jsonl_atomic};
use super::AuditStore;

/// Audit store backed by JSONL files
#[derive(Debug)]
pub struct JsonlAuditStore {
    changes_path: PathBuf,
    requests_path: PathBuf,
    // Serializes appends against the rewrite in `forget_user`
    write_lock: Mutex<()>,
}

impl JsonlAuditStore {
    pub fn new(changes_path: PathBuf, requests_path: PathBuf) -> Self {
        Self {
            changes_path,
            requests_path,
            write_lock: Mutex::new(()),
        }
    }

    /// Store using the standard file names under the data directory
    pub fn open(paths: &AuditPaths) -> AuditResult<Self> {
        paths.ensure_directories()?;
        Ok(Self::new(paths.changes_log(), paths.requests_log()))
    }

    pub fn changes_path(&self) -> &Path {
        &self.changes_path
    }

    pub fn requests_path(&self) -> &Path {
        &self.requests_path
    }

    fn lock(&self) -> AuditResult<std::sync::MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|e| AuditError::Storage(format!("Failed to acquire write lock: {}", e)))
    }
}

impl AuditStore for JsonlAuditStore {
    fn insert_change(&self, record: &ChangeRecord) -> AuditResult<()> {
        let _guard = self.lock()?;
        append_jsonl(&self.changes_path, record)
    }

    fn insert_request(&self, record: &RequestRecord) -> AuditResult<()> {
        let _guard = self.lock()?;
        append_jsonl(&self.requests_path, record)
    }

    fn changes(&self) -> AuditResult<Vec<ChangeRecord>> {
        read_jsonl(&self.changes_path)
    }

    fn requests(&self) -> AuditResult<Vec<RequestRecord>> {
        read_jsonl(&self.requests_path)
    }

    fn forget_user(&self, user: &UserId) -> AuditResult<usize> {
        let _guard = self.lock()?;
        let mut touched = 0;

        let mut changes: Vec<ChangeRecord> = read_jsonl(&self.changes_path)?;
        let before = touched;
        for record in changes.iter_mut().filter(|r| r.user_id.as_ref() == Some(user)) {
            record.user_id = None;
            touched += 1;
        }
        if touched > before {
            write_jsonl_atomic(&self.changes_path, &changes)?;
        }

        let mut requests: Vec<RequestRecord> = read_jsonl(&self.requests_path)?;
        let before = touched;
        for record in requests.iter_mut().filter(|r| r.user_id.as_ref() == Some(user)) {
            record.user_id = None;
            touched += 1;
        }
        if touched > before {
            write_jsonl_atomic(&self.requests_path, &requests)?;
        }

        Ok(touched)
    }
}
