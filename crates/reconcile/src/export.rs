//! Export: incremental copy of not-yet-backed-up records
//!
//! Algorithm:
//! 1. Read the ids already in the backup (absent table = empty set)
//! 2. Fetch the whole operational collection from the primary
//! 3. Keep records whose id is not yet backed up
//! 4. Encode them to their text form
//! 5. Nothing new: return without writing
//! 6. Create the backup table if absent
//! 7. Upsert the batch atomically
//!
//! Re-running is always safe: backed-up ids are skipped and the upsert is
//! idempotent per row.

use std::collections::HashSet;

use tracing::{debug, error, info};
use vaultsync_backup::BackupStore;
use vaultsync_core::{encode_record, BackupEntry, Result};
use vaultsync_primary::PrimaryStore;

use crate::report::ExportReport;

const TARGET: &str = "vaultsync::export";

/// Run one export of `collection` into `backup`.
pub(crate) fn run_export(
    primary: &dyn PrimaryStore,
    backup: &dyn BackupStore,
    collection: &str,
) -> Result<ExportReport> {
    info!(target: TARGET, collection, backup = %backup.describe(), "Starting export");

    let mut report = ExportReport::default();

    let known_ids = match backup.select_all_ids() {
        Ok(ids) => ids,
        Err(e) if e.is_not_found() => {
            info!(target: TARGET, "Backup table does not exist yet, treating as empty");
            report.bootstrapped = true;
            HashSet::new()
        }
        Err(e) => {
            error!(target: TARGET, error = %e, "Failed to fetch backup ids");
            return Err(e);
        }
    };

    let snapshot = primary.get_all(collection).map_err(|e| {
        error!(
            target: TARGET,
            collection,
            error = %e,
            "Failed to retrieve records from primary store"
        );
        e
    })?;

    let records = snapshot.records();
    report.fetched = records.len();

    let mut rows: Vec<BackupEntry> = Vec::new();
    for record in records.iter().filter(|r| !known_ids.contains(&r.id)) {
        debug!(target: TARGET, id = %record.id, "Adding new record");
        rows.push(encode_record(record)?);
    }
    report.already_backed_up = report.fetched - rows.len();

    if rows.is_empty() {
        info!(
            target: TARGET,
            fetched = report.fetched,
            "No new records to export"
        );
        return Ok(report);
    }

    backup.create_table_if_not_exists().map_err(|e| {
        error!(target: TARGET, error = %e, "Failed to ensure backup table exists");
        e
    })?;

    report.upserted = backup.bulk_upsert(&rows).map_err(|e| {
        error!(
            target: TARGET,
            rows = rows.len(),
            error = %e,
            "Failed to upsert records"
        );
        e
    })?;

    info!(
        target: TARGET,
        fetched = report.fetched,
        already_backed_up = report.already_backed_up,
        upserted = report.upserted,
        "Export complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vaultsync_backup::MemoryBackupStore;
    use vaultsync_core::{decode_entry, ErrorKind, Record};
    use vaultsync_primary::MemoryPrimaryStore;

    const LIVE: &str = "my_collection";

    fn record(id: &str) -> Record {
        Record::new(id)
            .with_embedding(vec![0.5, -1.0])
            .with_metadata(json!({ "source": id }))
            .with_document(format!("doc {}", id))
    }

    #[test]
    fn test_bootstrap_creates_table_and_copies_everything() {
        let primary = MemoryPrimaryStore::with_collection(LIVE, vec![record("a"), record("b")]);
        let backup = MemoryBackupStore::new();

        let report = run_export(&primary, &backup, LIVE).unwrap();

        assert!(report.bootstrapped);
        assert_eq!(report.upserted, 2);
        assert!(backup.table_exists());
        assert_eq!(backup.rows().len(), 2);
    }

    #[test]
    fn test_delta_writes_only_new_ids() {
        let primary = MemoryPrimaryStore::with_collection(
            LIVE,
            vec![record("A"), record("B"), record("C")],
        );
        let backup = MemoryBackupStore::with_rows(vec![
            encode_record(&record("A")).unwrap(),
            encode_record(&record("B")).unwrap(),
        ]);

        let report = run_export(&primary, &backup, LIVE).unwrap();

        assert_eq!(report.fetched, 3);
        assert_eq!(report.already_backed_up, 2);
        assert_eq!(report.upserted, 1);
        let ids: Vec<_> = backup.rows().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_second_run_is_noop() {
        let primary = MemoryPrimaryStore::with_collection(LIVE, vec![record("a"), record("b")]);
        let backup = MemoryBackupStore::new();

        assert_eq!(run_export(&primary, &backup, LIVE).unwrap().upserted, 2);
        let after_first = backup.rows();
        assert_eq!(run_export(&primary, &backup, LIVE).unwrap().upserted, 0);

        assert_eq!(backup.rows(), after_first);
        assert_eq!(backup.upsert_calls(), 1);
    }

    #[test]
    fn test_known_ids_are_not_refreshed() {
        // Primary wins only for ids not yet backed up.
        let primary = MemoryPrimaryStore::with_collection(LIVE, vec![record("a")]);
        let backup = MemoryBackupStore::new();
        run_export(&primary, &backup, LIVE).unwrap();

        primary.upsert(LIVE, vec![Record::new("a").with_document("changed")]);
        run_export(&primary, &backup, LIVE).unwrap();

        let stored = decode_entry(backup.rows().remove(0)).unwrap();
        assert_eq!(stored.document.as_deref(), Some("doc a"));
    }

    #[test]
    fn test_empty_primary_does_not_create_table() {
        let primary = MemoryPrimaryStore::with_collection(LIVE, vec![]);
        let backup = MemoryBackupStore::new();

        let report = run_export(&primary, &backup, LIVE).unwrap();

        assert_eq!(report.upserted, 0);
        assert!(!backup.table_exists());
    }

    #[test]
    fn test_primary_failure_leaves_backup_untouched() {
        let primary = MemoryPrimaryStore::with_collection(LIVE, vec![record("a")]);
        primary.set_available(false);
        let backup = MemoryBackupStore::new();

        let err = run_export(&primary, &backup, LIVE).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Transient);
        assert!(!backup.table_exists());
        assert_eq!(backup.upsert_calls(), 0);
    }

    #[test]
    fn test_missing_primary_collection_is_error() {
        let primary = MemoryPrimaryStore::new();
        let backup = MemoryBackupStore::new();
        let err = run_export(&primary, &backup, LIVE).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_upsert_failure_is_reported_and_retry_succeeds() {
        let primary = MemoryPrimaryStore::with_collection(LIVE, vec![record("a"), record("b")]);
        let backup = MemoryBackupStore::new();
        backup.set_fail_upserts(true);

        let err = run_export(&primary, &backup, LIVE).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PartialWrite);
        assert!(backup.rows().is_empty());

        backup.set_fail_upserts(false);
        assert_eq!(run_export(&primary, &backup, LIVE).unwrap().upserted, 2);
    }

    #[test]
    fn test_absent_fields_are_exported_as_null() {
        let primary = MemoryPrimaryStore::with_collection(LIVE, vec![Record::new("bare")]);
        let backup = MemoryBackupStore::new();
        run_export(&primary, &backup, LIVE).unwrap();

        let row = backup.rows().remove(0);
        assert_eq!(row.embedding.as_deref(), Some("null"));
        assert_eq!(row.metadata.as_deref(), Some("null"));
        assert_eq!(row.document, None);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;
        use std::collections::BTreeSet;

        proptest! {
            #[test]
            fn backup_converges_to_union_of_ids(
                first in prop::collection::btree_set("[a-z]{1,6}", 0..20),
                later in prop::collection::btree_set("[a-z]{1,6}", 0..20),
            ) {
                let primary =
                    MemoryPrimaryStore::with_collection(LIVE, first.iter().map(|id| record(id)));
                let backup = MemoryBackupStore::new();
                run_export(&primary, &backup, LIVE).unwrap();

                primary.upsert(LIVE, later.iter().map(|id| record(id)));
                let report = run_export(&primary, &backup, LIVE).unwrap();
                prop_assert_eq!(report.upserted, later.difference(&first).count());

                let expected: BTreeSet<String> = first.union(&later).cloned().collect();
                let stored: BTreeSet<String> = backup.rows().into_iter().map(|r| r.id).collect();
                prop_assert_eq!(stored, expected);

                prop_assert_eq!(run_export(&primary, &backup, LIVE).unwrap().upserted, 0);
            }
        }
    }
}
