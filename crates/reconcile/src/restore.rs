//! Restore: rebuild a collection from the backup
//!
//! Algorithm:
//! 1. Read every backup row (absent table = no rows); none means done
//! 2. Decode rows, skipping and logging any that cannot be read or parsed
//! 3. Delete the target collection if it exists
//! 4. Create it fresh
//! 5. Write all decoded records in one bulk call
//!
//! The target is never the operational collection, so a failed or partial
//! restore cannot corrupt a collection still serving traffic. The backup is
//! only read.

use tracing::{error, info, warn};
use vaultsync_backup::BackupStore;
use vaultsync_core::{decode_entry, Record, Result};
use vaultsync_primary::PrimaryStore;

use crate::report::RestoreReport;

const TARGET: &str = "vaultsync::restore";

/// Run one restore of `backup` into the collection named `target_collection`.
pub(crate) fn run_restore(
    primary: &dyn PrimaryStore,
    backup: &dyn BackupStore,
    target_collection: &str,
) -> Result<RestoreReport> {
    info!(
        target: TARGET,
        collection = target_collection,
        backup = %backup.describe(),
        "Starting restore"
    );

    let rows = match backup.select_all() {
        Ok(rows) => rows,
        Err(e) if e.is_not_found() => Vec::new(),
        Err(e) => {
            error!(target: TARGET, error = %e, "Failed to fetch backup rows");
            return Err(e);
        }
    };

    let mut report = RestoreReport {
        read: rows.len(),
        ..RestoreReport::default()
    };
    if rows.is_empty() {
        info!(target: TARGET, "No backup data found to restore");
        return Ok(report);
    }

    let mut records: Vec<Record> = Vec::with_capacity(rows.len());
    for row in rows {
        match row.and_then(decode_entry) {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!(target: TARGET, error = %e, "Skipping unparseable backup row");
                report.skipped += 1;
            }
        }
    }

    report.replaced_existing = match primary.delete_collection(target_collection) {
        Ok(existed) => existed,
        Err(e) if e.is_not_found() => false,
        Err(e) => {
            error!(
                target: TARGET,
                collection = target_collection,
                error = %e,
                "Failed to delete existing restore collection"
            );
            return Err(e);
        }
    };

    primary.create_collection(target_collection).map_err(|e| {
        error!(
            target: TARGET,
            collection = target_collection,
            error = %e,
            "Failed to create restore collection"
        );
        e
    })?;

    if !records.is_empty() {
        report.written = primary
            .bulk_add(target_collection, &records)
            .map_err(|e| {
                error!(
                    target: TARGET,
                    collection = target_collection,
                    records = records.len(),
                    error = %e,
                    "Failed to write restored records"
                );
                e
            })?;
    }

    info!(
        target: TARGET,
        collection = target_collection,
        read = report.read,
        skipped = report.skipped,
        written = report.written,
        "Restore complete"
    );
    Ok(report)
}
