//! SQLite-backed backup store.
//!
//! Table shape:
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS {table} (
//!     id        TEXT PRIMARY KEY,
//!     embedding TEXT,
//!     metadata  TEXT,
//!     document  TEXT
//! );
//! ```
//!
//! Every operation opens its own connection and drops it before returning,
//! on success and on failure alike.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info, warn};
use vaultsync_core::{BackupEntry, Error, Result};

use crate::BackupStore;

/// How long a connection waits on a lock held by a concurrent writer.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Check that `name` is safe to splice into SQL as a table identifier.
///
/// Accepts `[A-Za-z_][A-Za-z0-9_]*`.
pub fn validate_table_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(Error::config(format!(
            "invalid backup table name '{}': expected [A-Za-z_][A-Za-z0-9_]*",
            name
        )))
    }
}

fn transient(context: &str, e: rusqlite::Error) -> Error {
    Error::transient(format!("{}: {}", context, e))
}

/// Column as text. Numbers are rendered; text and blobs must be UTF-8.
fn column_text(value: ValueRef<'_>) -> std::result::Result<Option<String>, String> {
    match value {
        ValueRef::Null => Ok(None),
        ValueRef::Integer(i) => Ok(Some(i.to_string())),
        ValueRef::Real(f) => Ok(Some(f.to_string())),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => std::str::from_utf8(bytes)
            .map(|text| Some(text.to_string()))
            .map_err(|e| format!("not valid UTF-8: {}", e)),
    }
}

fn lossy_text(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => "<null>".to_string(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Decode one scanned row. The outer error is a failed read; the inner one
/// is a row whose columns are not text.
fn read_entry(row: &Row<'_>) -> rusqlite::Result<Result<BackupEntry>> {
    let id_value = row.get_ref(0)?;
    let id = match column_text(id_value) {
        Ok(Some(id)) => id,
        Ok(None) => return Ok(Err(Error::malformed("<null>", "id is NULL"))),
        Err(reason) => {
            return Ok(Err(Error::malformed(
                lossy_text(id_value),
                format!("id: {}", reason),
            )))
        }
    };

    let mut columns: [Option<String>; 3] = [None, None, None];
    for (i, name) in ["embedding", "metadata", "document"].iter().enumerate() {
        match column_text(row.get_ref(i + 1)?) {
            Ok(text) => columns[i] = text,
            Err(reason) => {
                return Ok(Err(Error::malformed(id, format!("{}: {}", name, reason))));
            }
        }
    }
    let [embedding, metadata, document] = columns;

    Ok(Ok(BackupEntry {
        id,
        embedding,
        metadata,
        document,
    }))
}

/// Backup store persisted in a SQLite database file.
#[derive(Debug, Clone)]
pub struct SqliteBackupStore {
    path: PathBuf,
    table: String,
}

impl SqliteBackupStore {
    /// Create a store for `table` inside the database file at `path`.
    ///
    /// Nothing is opened until the first operation. The file is created on
    /// first use if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns a config error if `table` is not a valid identifier.
    pub fn new(path: impl AsRef<Path>, table: &str) -> Result<Self> {
        validate_table_name(table)?;
        Ok(SqliteBackupStore {
            path: path.as_ref().to_path_buf(),
            table: table.to_string(),
        })
    }

    /// Database file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Table name
    pub fn table(&self) -> &str {
        &self.table
    }

    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path).map_err(|e| {
            transient(
                &format!("failed to open backup database '{}'", self.path.display()),
                e,
            )
        })?;
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| transient("failed to set busy timeout", e))?;
        Ok(conn)
    }

    fn table_exists(&self, conn: &Connection) -> Result<bool> {
        conn.query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![self.table],
            |_| Ok(()),
        )
        .optional()
        .map(|found| found.is_some())
        .map_err(|e| transient("failed to inspect schema", e))
    }

    fn require_table(&self, conn: &Connection) -> Result<()> {
        if self.table_exists(conn)? {
            Ok(())
        } else {
            Err(Error::not_found(format!("backup table '{}'", self.table)))
        }
    }
}

impl BackupStore for SqliteBackupStore {
    fn describe(&self) -> String {
        format!("sqlite://{}#{}", self.path.display(), self.table)
    }

    fn select_all_ids(&self) -> Result<HashSet<String>> {
        let conn = self.connect()?;
        self.require_table(&conn)?;

        let mut stmt = conn
            .prepare(&format!("SELECT id FROM {}", self.table))
            .map_err(|e| transient("failed to prepare id scan", e))?;
        let mut rows = stmt
            .query([])
            .map_err(|e| transient("failed to read backup ids", e))?;
        let mut ids = HashSet::new();
        while let Some(row) = rows
            .next()
            .map_err(|e| transient("failed to read backup ids", e))?
        {
            let value = row
                .get_ref(0)
                .map_err(|e| transient("failed to read backup ids", e))?;
            match column_text(value) {
                Ok(Some(id)) => {
                    ids.insert(id);
                }
                _ => warn!(
                    target: "vaultsync::backup",
                    table = %self.table,
                    id = %lossy_text(value),
                    "Ignoring backup row with unreadable id"
                ),
            }
        }

        debug!(
            target: "vaultsync::backup",
            table = %self.table,
            count = ids.len(),
            "Fetched backup ids"
        );
        Ok(ids)
    }

    fn select_all(&self) -> Result<Vec<Result<BackupEntry>>> {
        let conn = self.connect()?;
        self.require_table(&conn)?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT id, embedding, metadata, document FROM {} ORDER BY id",
                self.table
            ))
            .map_err(|e| transient("failed to prepare row scan", e))?;
        let mut rows = stmt
            .query([])
            .map_err(|e| transient("failed to read backup rows", e))?;
        let mut entries = Vec::new();
        while let Some(row) = rows
            .next()
            .map_err(|e| transient("failed to read backup rows", e))?
        {
            entries.push(read_entry(row).map_err(|e| transient("failed to read backup rows", e))?);
        }

        debug!(
            target: "vaultsync::backup",
            table = %self.table,
            count = entries.len(),
            unreadable = entries.iter().filter(|e| e.is_err()).count(),
            "Fetched backup rows"
        );
        Ok(entries)
    }

    fn create_table_if_not_exists(&self) -> Result<()> {
        let conn = self.connect()?;
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id TEXT PRIMARY KEY,
                embedding TEXT,
                metadata TEXT,
                document TEXT
            );",
            self.table
        ))
        .map_err(|e| transient("failed to create backup table", e))?;

        info!(
            target: "vaultsync::backup",
            table = %self.table,
            "Ensured backup table exists"
        );
        Ok(())
    }

    fn bulk_upsert(&self, rows: &[BackupEntry]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut conn = self.connect()?;
        let rejected = |e: rusqlite::Error| {
            Error::write_rejected(format!("backup table '{}'", self.table), e.to_string())
        };

        // Dropping an uncommitted transaction rolls it back.
        let tx = conn.transaction().map_err(rejected)?;
        {
            let mut stmt = tx
                .prepare(&format!(
                    "INSERT INTO {} (id, embedding, metadata, document)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(id) DO UPDATE SET
                        embedding = excluded.embedding,
                        metadata = excluded.metadata,
                        document = excluded.document",
                    self.table
                ))
                .map_err(rejected)?;
            for row in rows {
                stmt.execute(params![row.id, row.embedding, row.metadata, row.document])
                    .map_err(rejected)?;
            }
        }
        tx.commit().map_err(rejected)?;

        Ok(rows.len())
    }
}
