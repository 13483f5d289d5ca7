//! Export: primary → backup

use crate::common::*;

#[test]
fn first_export_bootstraps_table_and_copies_everything() {
    let h = Harness::new(records(5));

    let report = h.reconciler.export().unwrap();

    assert!(report.bootstrapped);
    assert_eq!(report.fetched, 5);
    assert_eq!(report.upserted, 5);
    let rows = h.backup_rows();
    assert_eq!(
        rows.iter().map(|r| r.id.clone()).collect::<Vec<_>>(),
        ids(&records(5))
    );
}

#[test]
fn second_export_writes_nothing() {
    let h = Harness::new(records(3));

    assert_eq!(h.reconciler.export().unwrap().upserted, 3);
    let before = h.backup_rows();

    let report = h.reconciler.export().unwrap();
    assert_eq!(report.upserted, 0);
    assert_eq!(report.already_backed_up, 3);
    assert!(!report.bootstrapped);
    assert_eq!(h.backup_rows(), before);
}

#[test]
fn export_backs_up_only_the_delta() {
    let h = Harness::new(vec![record("A"), record("B")]);
    h.reconciler.export().unwrap();

    h.primary.upsert(LIVE, vec![record("C")]);
    let report = h.reconciler.export().unwrap();

    assert_eq!(report.fetched, 3);
    assert_eq!(report.upserted, 1);
    let ids: Vec<String> = h.backup_rows().into_iter().map(|r| r.id).collect();
    assert_eq!(ids, vec!["A", "B", "C"]);
}

#[test]
fn export_does_not_rewrite_backed_up_ids() {
    let h = Harness::new(vec![record("a")]);
    h.reconciler.export().unwrap();
    let before = h.backup_rows();

    h.primary
        .upsert(LIVE, vec![Record::new("a").with_document("changed upstream")]);
    assert_eq!(h.reconciler.export().unwrap().upserted, 0);
    assert_eq!(h.backup_rows(), before);
}

#[test]
fn empty_collection_leaves_backup_untouched() {
    let h = Harness::new(vec![]);

    let report = h.reconciler.export().unwrap();

    assert_eq!(report.upserted, 0);
    assert_eq!(
        h.backup.select_all_ids().unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

#[test]
fn primary_outage_fails_without_writing() {
    let h = Harness::new(records(2));
    h.primary.set_available(false);

    let err = h.reconciler.export().unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Transient);
    assert_eq!(
        h.backup.select_all_ids().unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

#[test]
fn missing_live_collection_is_an_error() {
    let h = Harness::new(vec![]);
    h.primary.drop_collection(LIVE);

    assert_eq!(h.reconciler.export().unwrap_err().kind(), ErrorKind::NotFound);
}

#[test]
fn sparse_records_export_as_null_text() {
    let h = Harness::new(vec![Record::new("bare")]);
    h.reconciler.export().unwrap();

    let rows = h.backup_rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].embedding.as_deref(), Some("null"));
    assert_eq!(rows[0].metadata.as_deref(), Some("null"));
    assert_eq!(rows[0].document, None);
}
