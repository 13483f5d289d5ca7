//! The reconciler: Export, Restore and HealthCheck over injected stores
//!
//! # Example
//!
//! ```ignore
//! let config = SyncConfig::load(Some(Path::new("vaultsync.toml")))?;
//! let reconciler = Reconciler::from_config(&config)?;
//! let report = reconciler.export()?;
//! println!("backed up {} new records", report.upserted);
//! ```

use std::sync::Arc;

use vaultsync_backup::{BackupStore, SqliteBackupStore};
use vaultsync_core::Result;
use vaultsync_primary::{HttpPrimaryStore, PrimaryStore};

use crate::config::{ReconcilerConfig, SyncConfig};
use crate::export::run_export;
use crate::health::{run_health_check, HealthStatus, RestoreGate};
use crate::report::{ExportReport, RestoreReport};
use crate::restore::run_restore;

/// Keeps a backup of the primary collection and restores from it.
///
/// Holds no lock across operations: export, restore and health checks may
/// run concurrently from several threads. Every write path is either an
/// idempotent upsert by id or a rebuild of a separately named collection.
pub struct Reconciler {
    config: ReconcilerConfig,
    primary: Arc<dyn PrimaryStore>,
    backup: Arc<dyn BackupStore>,
    restore_gate: RestoreGate,
}

impl Reconciler {
    /// Create a reconciler over the given stores.
    ///
    /// # Errors
    ///
    /// Returns a config error if `config` fails validation.
    pub fn new(
        config: ReconcilerConfig,
        primary: Arc<dyn PrimaryStore>,
        backup: Arc<dyn BackupStore>,
    ) -> Result<Self> {
        config.validate()?;
        let restore_gate = RestoreGate::new(config.restore_cooldown);
        Ok(Reconciler {
            config,
            primary,
            backup,
            restore_gate,
        })
    }

    /// Build the HTTP primary and SQLite backup described by `config`.
    ///
    /// # Errors
    ///
    /// Returns a config error if `config` fails validation.
    pub fn from_config(config: &SyncConfig) -> Result<Self> {
        config.validate()?;
        let primary = HttpPrimaryStore::new(&config.endpoint(), config.primary.timeout_ms);
        let backup = SqliteBackupStore::new(&config.backup.path, &config.backup_table)?;
        Self::new(
            config.reconciler_config(),
            Arc::new(primary),
            Arc::new(backup),
        )
    }

    /// Configuration in use
    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Copy records not yet in the backup from the operational collection.
    ///
    /// # Errors
    ///
    /// Fails without writing if the primary cannot be read; fails if the
    /// backup table cannot be created or the batch upsert is rejected.
    pub fn export(&self) -> Result<ExportReport> {
        run_export(
            self.primary.as_ref(),
            self.backup.as_ref(),
            &self.config.collection_name,
        )
    }

    /// Rebuild the restore collection from every backup row.
    ///
    /// # Errors
    ///
    /// Fails if the backup cannot be read or the primary rejects the
    /// delete, create or bulk write. Unparseable rows are skipped, not
    /// errors.
    pub fn restore(&self) -> Result<RestoreReport> {
        run_restore(
            self.primary.as_ref(),
            self.backup.as_ref(),
            &self.config.restore_collection,
        )
    }

    /// Probe the operational collection; restore if the probe fails.
    pub fn health_check(&self) -> HealthStatus {
        run_health_check(
            self.primary.as_ref(),
            &self.config.collection_name,
            &self.restore_gate,
            || self.restore(),
        )
    }
}
