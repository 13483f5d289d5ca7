//! In-memory backup store
//!
//! Behaves like the SQLite store, including the "table absent until
//! created" bootstrap state, without touching disk.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::RwLock;
use vaultsync_core::{BackupEntry, Error, Result};

use crate::BackupStore;

/// Backup store held in process memory.
#[derive(Debug, Default)]
pub struct MemoryBackupStore {
    /// `None` until the table is created
    rows: RwLock<Option<BTreeMap<String, BackupEntry>>>,
    fail_upserts: AtomicBool,
    upsert_calls: AtomicUsize,
}

impl MemoryBackupStore {
    /// Empty store with no table
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose table already holds `rows`
    pub fn with_rows(rows: impl IntoIterator<Item = BackupEntry>) -> Self {
        let map = rows.into_iter().map(|r| (r.id.clone(), r)).collect();
        MemoryBackupStore {
            rows: RwLock::new(Some(map)),
            ..Self::default()
        }
    }

    /// Make subsequent `bulk_upsert` calls fail without writing
    pub fn set_fail_upserts(&self, fail: bool) {
        self.fail_upserts.store(fail, Ordering::SeqCst);
    }

    /// Whether the table has been created
    pub fn table_exists(&self) -> bool {
        self.rows.read().is_some()
    }

    /// Number of `bulk_upsert` calls that reached the store
    pub fn upsert_calls(&self) -> usize {
        self.upsert_calls.load(Ordering::SeqCst)
    }

    /// Copy of the current rows, ordered by id
    pub fn rows(&self) -> Vec<BackupEntry> {
        self.rows
            .read()
            .as_ref()
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default()
    }

    fn missing_table() -> Error {
        Error::not_found("backup table (memory)")
    }
}

impl BackupStore for MemoryBackupStore {
    fn describe(&self) -> String {
        "memory".to_string()
    }

    fn select_all_ids(&self) -> Result<HashSet<String>> {
        self.rows
            .read()
            .as_ref()
            .map(|m| m.keys().cloned().collect())
            .ok_or_else(Self::missing_table)
    }

    fn select_all(&self) -> Result<Vec<Result<BackupEntry>>> {
        self.rows
            .read()
            .as_ref()
            .map(|m| m.values().cloned().map(Ok).collect())
            .ok_or_else(Self::missing_table)
    }

    fn create_table_if_not_exists(&self) -> Result<()> {
        let mut guard = self.rows.write();
        if guard.is_none() {
            *guard = Some(BTreeMap::new());
        }
        Ok(())
    }

    fn bulk_upsert(&self, rows: &[BackupEntry]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_upserts.load(Ordering::SeqCst) {
            return Err(Error::write_rejected(
                "backup table (memory)",
                "injected upsert failure",
            ));
        }

        let mut guard = self.rows.write();
        let map = guard.as_mut().ok_or_else(|| {
            Error::write_rejected("backup table (memory)", "table does not exist")
        })?;
        for row in rows {
            map.insert(row.id.clone(), row.clone());
        }
        Ok(rows.len())
    }
}
