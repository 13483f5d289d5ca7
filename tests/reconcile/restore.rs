//! Restore: backup → fresh restore collection

use crate::common::*;

#[test]
fn restore_writes_every_backed_up_record() {
    let h = Harness::new(records(20));
    h.reconciler.export().unwrap();

    let report = h.reconciler.restore().unwrap();

    assert_eq!(report.read, 20);
    assert_eq!(report.written, 20);
    assert_eq!(report.skipped, 0);
    assert_eq!(h.primary.records(RESTORED).unwrap(), records(20));
}

#[test]
fn restore_replaces_prior_restore_collection() {
    let h = Harness::new(vec![record("a"), record("b")]);
    h.reconciler.export().unwrap();
    h.primary.upsert(RESTORED, vec![record("stale")]);

    let report = h.reconciler.restore().unwrap();

    assert!(report.replaced_existing);
    let restored = h.primary.records(RESTORED).unwrap();
    assert_eq!(ids(&restored), vec!["a", "b"]);
}

#[test]
fn restore_leaves_live_collection_alone() {
    let h = Harness::new(vec![record("a")]);
    h.reconciler.export().unwrap();
    h.primary.upsert(LIVE, vec![record("not_backed_up")]);

    h.reconciler.restore().unwrap();

    assert_eq!(h.primary.records(LIVE).unwrap().len(), 2);
    assert_eq!(h.primary.records(RESTORED).unwrap().len(), 1);
}

#[test]
fn missing_backup_table_makes_no_primary_calls() {
    let h = Harness::new(records(3));

    let report = h.reconciler.restore().unwrap();

    assert_eq!(report.read, 0);
    assert_eq!(h.primary.delete_calls(), 0);
    assert_eq!(h.primary.create_calls(), 0);
    assert_eq!(h.primary.bulk_add_calls(), 0);
    assert!(!h.primary.has_collection(RESTORED));
}

#[test]
fn empty_backup_table_makes_no_primary_calls() {
    let h = Harness::new(vec![]);
    h.backup.create_table_if_not_exists().unwrap();

    let report = h.reconciler.restore().unwrap();

    assert_eq!(report.written, 0);
    assert_eq!(h.primary.delete_calls(), 0);
    assert_eq!(h.primary.create_calls(), 0);
}

#[test]
fn malformed_rows_are_skipped() {
    let h = Harness::new(vec![record("good")]);
    h.reconciler.export().unwrap();
    h.insert_raw("bad_embedding", Some("[1.0, oops"), Some("{}"));
    h.insert_raw("bad_metadata", Some("[1.0]"), Some("{not json"));

    let report = h.reconciler.restore().unwrap();

    assert_eq!(report.read, 3);
    assert_eq!(report.skipped, 2);
    assert_eq!(report.written, 1);
    assert_eq!(ids(&h.primary.records(RESTORED).unwrap()), vec!["good"]);
}

#[test]
fn non_utf8_row_is_skipped_not_fatal() {
    let h = Harness::new(vec![record("good")]);
    h.reconciler.export().unwrap();
    h.execute_raw(
        "INSERT INTO chroma_data (id, embedding, metadata, document)
         VALUES ('bad_utf8', CAST(X'5BFF5D' AS TEXT), '{}', NULL);",
    );

    let report = h.reconciler.restore().unwrap();

    assert_eq!(report.read, 2);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.written, 1);
    assert_eq!(h.primary.records(RESTORED).unwrap(), vec![record("good")]);
}

#[test]
fn null_columns_restore_as_absent_fields() {
    let h = Harness::new(vec![]);
    h.insert_raw("sql_null", None, None);
    h.insert_raw("json_null", Some("null"), Some("null"));

    h.reconciler.restore().unwrap();

    let restored = h.primary.records(RESTORED).unwrap();
    assert_eq!(
        restored,
        vec![Record::new("json_null"), Record::new("sql_null")]
    );
}

#[test]
fn all_malformed_rows_still_recreate_collection() {
    let h = Harness::new(vec![]);
    h.insert_raw("bad", Some("{"), None);

    let report = h.reconciler.restore().unwrap();

    assert_eq!(report.skipped, 1);
    assert_eq!(h.primary.create_calls(), 1);
    assert_eq!(h.primary.bulk_add_calls(), 0);
    assert!(h.primary.records(RESTORED).unwrap().is_empty());
}

#[test]
fn rejected_bulk_write_surfaces_as_error() {
    let h = Harness::new(records(2));
    h.reconciler.export().unwrap();
    h.primary.set_fail_bulk_add(true);

    let err = h.reconciler.restore().unwrap_err();

    assert_eq!(err.kind(), ErrorKind::PartialWrite);
    // The backup is only read.
    assert_eq!(h.backup_rows().len(), 2);
}
