//! Backup store for vaultsync
//!
//! The backup store is a durable table keyed by record id, holding the last
//! exported embedding, metadata and document of every record. Rows are only
//! ever inserted or overwritten; nothing here deletes a row.
//!
//! Two implementations are provided:
//! - [`SqliteBackupStore`]: a SQLite file, one connection per operation
//! - [`MemoryBackupStore`]: an in-process map, used by tests and dry runs

#![warn(missing_docs)]

mod memory;
mod sqlite;

pub use memory::MemoryBackupStore;
pub use sqlite::{validate_table_name, SqliteBackupStore};

use std::collections::HashSet;
use vaultsync_core::{BackupEntry, Result};

/// Backup store abstraction
///
/// Thread safety: all methods must be safe to call concurrently from
/// multiple threads (requires Send + Sync). Export and a health-triggered
/// restore may run against the same store at the same time.
pub trait BackupStore: Send + Sync {
    /// Human-readable location, used in log fields
    fn describe(&self) -> String;

    /// Ids of every row currently in the table
    ///
    /// # Errors
    ///
    /// Returns [`vaultsync_core::Error::NotFound`] if the table does not
    /// exist yet, or a transient error if the read fails.
    fn select_all_ids(&self) -> Result<HashSet<String>>;

    /// Every row in the table, ordered by id
    ///
    /// A row whose columns cannot be read as text is returned as its own
    /// [`vaultsync_core::Error::Malformed`] item; the rest of the scan is
    /// unaffected.
    ///
    /// # Errors
    ///
    /// Returns [`vaultsync_core::Error::NotFound`] if the table does not
    /// exist yet, or a transient error if the read fails.
    fn select_all(&self) -> Result<Vec<Result<BackupEntry>>>;

    /// Create the table if it is absent; never recreates an existing one
    ///
    /// # Errors
    ///
    /// Returns an error if the schema statement fails.
    fn create_table_if_not_exists(&self) -> Result<()>;

    /// Insert or overwrite `rows` by id, as one atomic batch
    ///
    /// Returns the number of rows written. Either every row is written or
    /// none is.
    ///
    /// # Errors
    ///
    /// Returns [`vaultsync_core::Error::WriteRejected`] if the batch fails.
    fn bulk_upsert(&self, rows: &[BackupEntry]) -> Result<usize>;
}
