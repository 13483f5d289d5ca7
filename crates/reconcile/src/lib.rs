//! Reconciliation core for vaultsync
//!
//! Three operations keep a primary vector collection and its relational
//! backup in step:
//!
//! | Operation | Direction | Writes |
//! |-----------|-----------|--------|
//! | [`Reconciler::export`] | primary → backup | upsert of ids not yet backed up |
//! | [`Reconciler::restore`] | backup → primary | fresh restore collection |
//! | [`Reconciler::health_check`] | probe primary | restore on failure |
//!
//! Backup wins on restore, primary wins on export. Scheduling is left to
//! the caller (see the `vaultsync` CLI's `run` command).

#![warn(missing_docs)]

pub mod config;
mod export;
mod health;
mod reconciler;
mod report;
mod restore;

pub use config::{
    BackupConfig, PrimaryConfig, ReconcilerConfig, ScheduleConfig, SyncConfig, CONFIG_FILE_NAME,
};
pub use health::{HealthStatus, RestoreOutcome};
pub use reconciler::Reconciler;
pub use report::{ExportReport, RestoreReport};
