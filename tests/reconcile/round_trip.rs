//! Export followed by Restore preserves records field for field

use serde_json::json;

use crate::common::*;

fn assert_round_trip(original: Vec<Record>) {
    let h = Harness::new(original.clone());
    h.reconciler.export().unwrap();
    h.reconciler.restore().unwrap();

    let mut expected = original;
    expected.sort_by(|a, b| a.id.cmp(&b.id));
    assert_eq!(h.primary.records(RESTORED).unwrap(), expected);
}

#[test]
fn full_records_survive() {
    assert_round_trip(records(10));
}

#[test]
fn sparse_records_survive() {
    assert_round_trip(vec![
        Record::new("only_id"),
        Record::new("only_embedding").with_embedding(vec![0.125, -0.5]),
        Record::new("only_metadata").with_metadata(json!({ "k": null })),
        Record::new("only_document").with_document(""),
    ]);
}

#[test]
fn unusual_payloads_survive() {
    assert_round_trip(vec![
        Record::new("unicode")
            .with_document("résumé 日本語 \u{1F600}")
            .with_metadata(json!({ "quote": "it's \"quoted\"", "nested": { "deep": [1, 2, { "x": true }] } })),
        Record::new("empty_vector").with_embedding(vec![]),
        Record::new("with'quote").with_document("Robert'); DROP TABLE chroma_data;--"),
        Record::new("large").with_embedding((0..1536).map(|i| f64::from(i) / 4.0).collect()),
    ]);
}

#[test]
fn high_precision_embeddings_survive() {
    assert_round_trip(vec![
        Record::new("fifteen_digits").with_embedding(vec![0.123456789012345, -9.87654321098765e-3]),
        Record::new("beyond_f32").with_embedding(vec![1e40, -3.4e300, 1e-300]),
        Record::new("raw_shape").with_raw_embedding(json!({ "indices": [1, 7], "values": [0.25, 0.75] })),
    ]);
}

#[test]
fn restored_collection_matches_live_collection() {
    let h = Harness::new(records(8));
    h.reconciler.export().unwrap();
    h.reconciler.restore().unwrap();

    assert_eq!(
        h.primary.get_all(RESTORED).unwrap(),
        h.primary.get_all(LIVE).unwrap()
    );
}
