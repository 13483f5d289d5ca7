//! vaultsync - incremental backup and self-healing restore for vector collections
//!
//! vaultsync keeps a relational backup of a vector-store collection and
//! rebuilds the collection from that backup when the primary stops
//! answering.
//!
//! # Quick Start
//!
//! ```ignore
//! use vaultsync::{Reconciler, SyncConfig};
//!
//! let config = SyncConfig::load(None)?;
//! let reconciler = Reconciler::from_config(&config)?;
//!
//! // Copy records not yet backed up
//! let report = reconciler.export()?;
//!
//! // Probe the primary; restores from the backup on failure
//! let status = reconciler.health_check();
//! ```
//!
//! # Architecture
//!
//! | Crate | Role |
//! |-------|------|
//! | `vaultsync-core` | records, backup rows, codec, errors |
//! | `vaultsync-backup` | [`BackupStore`] trait, SQLite and in-memory stores |
//! | `vaultsync-primary` | [`PrimaryStore`] trait, HTTP and in-memory stores |
//! | `vaultsync-reconcile` | [`Reconciler`] and configuration |
//!
//! The stores are trait objects, so a [`Reconciler`] can run against any
//! primary/backup pair via [`Reconciler::new`].

pub use vaultsync_core::{
    decode_entry, encode_record, BackupEntry, CollectionSnapshot, Error, ErrorKind, Record, Result,
};

pub use vaultsync_backup::{BackupStore, MemoryBackupStore, SqliteBackupStore};

pub use vaultsync_primary::{Endpoint, HttpPrimaryStore, MemoryPrimaryStore, PrimaryStore};

pub use vaultsync_reconcile::{
    BackupConfig, ExportReport, HealthStatus, PrimaryConfig, Reconciler, ReconcilerConfig,
    RestoreOutcome, RestoreReport, ScheduleConfig, SyncConfig, CONFIG_FILE_NAME,
};
