//! Shared test utilities for the integration suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's main.rs.

#![allow(dead_code)]
#![allow(unused_imports)]

use std::path::Path;
use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;
pub use vaultsync::{
    BackupEntry, BackupStore, ErrorKind, HealthStatus, MemoryPrimaryStore, PrimaryStore,
    Reconciler, ReconcilerConfig, Record, RestoreOutcome, SqliteBackupStore,
};

/// Operational collection name used by every harness
pub const LIVE: &str = "my_collection";
/// Restore collection name used by every harness
pub const RESTORED: &str = "imported_collection";
/// Backup table name used by every harness
pub const TABLE: &str = "chroma_data";

/// In-memory primary plus a SQLite backup in a temp dir.
pub struct Harness {
    pub dir: TempDir,
    pub primary: Arc<MemoryPrimaryStore>,
    pub backup: Arc<SqliteBackupStore>,
    pub reconciler: Reconciler,
}

impl Harness {
    /// Live collection holding `records`, default config
    pub fn new(records: Vec<Record>) -> Self {
        Self::with_config(records, ReconcilerConfig::default())
    }

    /// Live collection holding `records`, custom config
    pub fn with_config(records: Vec<Record>, config: ReconcilerConfig) -> Self {
        let dir = TempDir::new().expect("temp dir");
        let primary = Arc::new(MemoryPrimaryStore::with_collection(LIVE, records));
        let backup = Arc::new(
            SqliteBackupStore::new(dir.path().join("vaultsync.db"), TABLE).expect("backup store"),
        );
        let reconciler =
            Reconciler::new(config, primary.clone(), backup.clone()).expect("reconciler");
        Harness {
            dir,
            primary,
            backup,
            reconciler,
        }
    }

    /// Every backup row, ordered by id
    pub fn backup_rows(&self) -> Vec<BackupEntry> {
        self.backup
            .select_all()
            .expect("backup rows")
            .into_iter()
            .collect::<vaultsync::Result<Vec<_>>>()
            .expect("readable backup rows")
    }

    /// Run raw SQL against the backup database
    pub fn execute_raw(&self, sql: &str) {
        self.backup
            .create_table_if_not_exists()
            .expect("create table");
        rusqlite::Connection::open(self.backup.path())
            .expect("open backup db")
            .execute_batch(sql)
            .expect("raw sql");
    }

    /// Insert a row bypassing the codec
    pub fn insert_raw(&self, id: &str, embedding: Option<&str>, metadata: Option<&str>) {
        self.backup
            .create_table_if_not_exists()
            .expect("create table");
        insert_raw(self.backup.path(), id, embedding, metadata);
    }
}

fn insert_raw(path: &Path, id: &str, embedding: Option<&str>, metadata: Option<&str>) {
    let conn = rusqlite::Connection::open(path).expect("open backup db");
    conn.execute(
        &format!(
            "INSERT INTO {} (id, embedding, metadata, document) VALUES (?1, ?2, ?3, NULL)",
            TABLE
        ),
        rusqlite::params![id, embedding, metadata],
    )
    .expect("raw insert");
}

/// A fully populated record
pub fn record(id: &str) -> Record {
    Record::new(id)
        .with_embedding(vec![0.5, -1.25, 3.0])
        .with_metadata(json!({ "source": id, "tags": ["a", "b"], "rank": 7 }))
        .with_document(format!("document {}", id))
}

/// `count` fully populated records named `r000`, `r001`, ...
pub fn records(count: usize) -> Vec<Record> {
    (0..count).map(|i| record(&format!("r{:03}", i))).collect()
}

/// Ids of `records`, in order
pub fn ids(records: &[Record]) -> Vec<String> {
    records.iter().map(|r| r.id.clone()).collect()
}
