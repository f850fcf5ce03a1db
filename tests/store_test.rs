mod helpers;

use helpers::{spike_vector, test_db};
use serde_json::json;

use bhumi::store::{self, DistanceMetric, Filter, Point, StoreError};

fn point(id: &str, vector: Vec<f32>, payload: serde_json::Value) -> Point {
    Point {
        id: id.to_string(),
        vector,
        payload,
    }
}

#[test]
fn ensure_collection_is_idempotent() {
    let conn = test_db();

    store::ensure_collection(&conn, "notes", 4, DistanceMetric::Cosine).unwrap();
    store::ensure_collection(&conn, "notes", 4, DistanceMetric::Cosine).unwrap();

    assert_eq!(store::point_count(&conn, "notes").unwrap(), 0);
}

#[test]
fn ensure_collection_rejects_width_change() {
    let conn = test_db();
    store::ensure_collection(&conn, "notes", 4, DistanceMetric::Cosine).unwrap();

    let err = store::ensure_collection(&conn, "notes", 8, DistanceMetric::Cosine).unwrap_err();
    assert!(matches!(err, StoreError::SchemaMismatch { .. }));
}

#[test]
fn ensure_collection_rejects_metric_change() {
    let conn = test_db();
    store::ensure_collection(&conn, "notes", 4, DistanceMetric::Cosine).unwrap();

    let err = store::ensure_collection(&conn, "notes", 4, DistanceMetric::L2).unwrap_err();
    assert!(matches!(err, StoreError::SchemaMismatch { .. }));
}

#[test]
fn upsert_then_retrieve_round_trips_vector_and_payload() {
    let mut conn = test_db();
    store::ensure_collection(&conn, "notes", 4, DistanceMetric::Cosine).unwrap();

    let payload = json!({"kind": "a", "weight": 3});
    let vector = vec![0.25f32, -1.5, 7.0, 30.0];
    store::upsert(&mut conn, "notes", &[point("note_1", vector.clone(), payload.clone())])
        .unwrap();

    let got = store::retrieve(&conn, "notes", "note_1").unwrap();
    assert_eq!(got.id, "note_1");
    assert_eq!(got.vector, vector);
    assert_eq!(got.payload, payload);
}

#[test]
fn upsert_overwrites_existing_point() {
    let mut conn = test_db();
    store::ensure_collection(&conn, "notes", 4, DistanceMetric::Cosine).unwrap();

    store::upsert(
        &mut conn,
        "notes",
        &[point("note_1", spike_vector(4, 0), json!({"v": 1}))],
    )
    .unwrap();
    store::upsert(
        &mut conn,
        "notes",
        &[point("note_1", spike_vector(4, 1), json!({"v": 2}))],
    )
    .unwrap();

    assert_eq!(store::point_count(&conn, "notes").unwrap(), 1);
    let got = store::retrieve(&conn, "notes", "note_1").unwrap();
    assert_eq!(got.payload, json!({"v": 2}));
    assert_eq!(got.vector, spike_vector(4, 1));
}

#[test]
fn retrieve_missing_point_is_not_found() {
    let conn = test_db();
    store::ensure_collection(&conn, "notes", 4, DistanceMetric::Cosine).unwrap();

    let err = store::retrieve(&conn, "notes", "note_9").unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
}

#[test]
fn upsert_rejects_malformed_identifier() {
    let mut conn = test_db();
    store::ensure_collection(&conn, "notes", 4, DistanceMetric::Cosine).unwrap();

    let err = store::upsert(
        &mut conn,
        "notes",
        &[point("note-one", spike_vector(4, 0), json!({}))],
    )
    .unwrap_err();
    assert!(matches!(err, StoreError::InvalidIdentifier(_)));
}

#[test]
fn upsert_rejects_wrong_vector_width() {
    let mut conn = test_db();
    store::ensure_collection(&conn, "notes", 4, DistanceMetric::Cosine).unwrap();

    let err = store::upsert(
        &mut conn,
        "notes",
        &[point("note_1", spike_vector(8, 0), json!({}))],
    )
    .unwrap_err();
    assert!(matches!(err, StoreError::SchemaMismatch { .. }));
}

#[test]
fn unknown_collection_is_unavailable() {
    let conn = test_db();

    let err = store::retrieve(&conn, "notes", "note_1").unwrap_err();
    assert!(matches!(err, StoreError::CollectionUnavailable(_)));

    let err = store::search(&conn, "notes", &spike_vector(4, 0), None, 3).unwrap_err();
    assert!(matches!(err, StoreError::CollectionUnavailable(_)));
}

#[test]
fn search_ranks_by_cosine_similarity() {
    let mut conn = test_db();
    store::ensure_collection(&conn, "notes", 4, DistanceMetric::Cosine).unwrap();

    // Exact match, 45-degree neighbor, orthogonal.
    store::upsert(
        &mut conn,
        "notes",
        &[
            point("note_1", vec![1.0, 0.0, 0.0, 0.0], json!({"n": 1})),
            point("note_2", vec![1.0, 1.0, 0.0, 0.0], json!({"n": 2})),
            point("note_3", vec![0.0, 1.0, 0.0, 0.0], json!({"n": 3})),
        ],
    )
    .unwrap();

    let hits = store::search(&conn, "notes", &[1.0, 0.0, 0.0, 0.0], None, 10).unwrap();
    let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
    assert_eq!(ids, ["note_1", "note_2", "note_3"]);

    assert!((hits[0].score - 1.0).abs() < 1e-4);
    assert!((hits[1].score - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-4);
    assert!(hits[2].score.abs() < 1e-4);
}

#[test]
fn search_respects_limit_and_allows_zero() {
    let mut conn = test_db();
    store::ensure_collection(&conn, "notes", 4, DistanceMetric::Cosine).unwrap();

    let points: Vec<Point> = (0..4)
        .map(|i| point(&format!("note_{i}"), spike_vector(4, i), json!({})))
        .collect();
    store::upsert(&mut conn, "notes", &points).unwrap();

    assert_eq!(store::search(&conn, "notes", &spike_vector(4, 0), None, 2).unwrap().len(), 2);
    assert!(store::search(&conn, "notes", &spike_vector(4, 0), None, 0).unwrap().is_empty());
}

#[test]
fn search_rejects_wrong_query_width() {
    let conn = test_db();
    store::ensure_collection(&conn, "notes", 4, DistanceMetric::Cosine).unwrap();

    let err = store::search(&conn, "notes", &spike_vector(8, 0), None, 3).unwrap_err();
    assert!(matches!(err, StoreError::SchemaMismatch { .. }));
}

#[test]
fn filtered_search_returns_exact_top_k_among_matches() {
    let mut conn = test_db();
    store::ensure_collection(&conn, "notes", 4, DistanceMetric::Cosine).unwrap();

    // The three nearest neighbors fail the predicate; the farthest passes.
    // A KNN pass truncated at the limit would miss it.
    store::upsert(
        &mut conn,
        "notes",
        &[
            point("note_1", vec![1.0, 0.0, 0.0, 0.0], json!({"kind": "a"})),
            point("note_2", vec![1.0, 0.1, 0.0, 0.0], json!({"kind": "a"})),
            point("note_3", vec![1.0, 0.2, 0.0, 0.0], json!({"kind": "a"})),
            point("note_4", vec![0.0, 0.0, 1.0, 0.0], json!({"kind": "b"})),
        ],
    )
    .unwrap();

    let filter = Filter::new().must_match("kind", "b");
    let hits =
        store::search(&conn, "notes", &[1.0, 0.0, 0.0, 0.0], Some(&filter), 1).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "note_4");
}

#[test]
fn filtered_search_with_no_matches_is_empty() {
    let mut conn = test_db();
    store::ensure_collection(&conn, "notes", 4, DistanceMetric::Cosine).unwrap();
    store::upsert(
        &mut conn,
        "notes",
        &[point("note_1", spike_vector(4, 0), json!({"kind": "a"}))],
    )
    .unwrap();

    let filter = Filter::new().must_match("kind", "z");
    let hits =
        store::search(&conn, "notes", &spike_vector(4, 0), Some(&filter), 5).unwrap();
    assert!(hits.is_empty());
}

#[test]
fn update_payload_merges_fields_and_keeps_vector() {
    let mut conn = test_db();
    store::ensure_collection(&conn, "notes", 4, DistanceMetric::Cosine).unwrap();

    let vector = spike_vector(4, 2);
    store::upsert(
        &mut conn,
        "notes",
        &[point("note_1", vector.clone(), json!({"kind": "a", "count": 1}))],
    )
    .unwrap();

    store::update_payload(&conn, "notes", "note_1", &json!({"count": 2, "extra": true}))
        .unwrap();

    let got = store::retrieve(&conn, "notes", "note_1").unwrap();
    assert_eq!(got.payload, json!({"kind": "a", "count": 2, "extra": true}));
    assert_eq!(got.vector, vector);
}

#[test]
fn update_payload_rejects_non_object_patch() {
    let mut conn = test_db();
    store::ensure_collection(&conn, "notes", 4, DistanceMetric::Cosine).unwrap();
    store::upsert(
        &mut conn,
        "notes",
        &[point("note_1", spike_vector(4, 0), json!({"kind": "a"}))],
    )
    .unwrap();

    let err = store::update_payload(&conn, "notes", "note_1", &json!(5)).unwrap_err();
    assert!(matches!(err, StoreError::InvalidPatch(_)));

    // The stored payload is untouched.
    let got = store::retrieve(&conn, "notes", "note_1").unwrap();
    assert_eq!(got.payload, json!({"kind": "a"}));
}

#[test]
fn update_payload_on_missing_point_is_not_found() {
    let conn = test_db();
    store::ensure_collection(&conn, "notes", 4, DistanceMetric::Cosine).unwrap();

    let err = store::update_payload(&conn, "notes", "note_9", &json!({"x": 1})).unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
}

#[test]
fn scan_all_pages_in_id_order() {
    let mut conn = test_db();
    store::ensure_collection(&conn, "notes", 4, DistanceMetric::Cosine).unwrap();

    let points: Vec<Point> = (1..=5)
        .map(|i| point(&format!("note_{i}"), spike_vector(4, i), json!({"n": i})))
        .collect();
    store::upsert(&mut conn, "notes", &points).unwrap();

    let page = store::scan_all(&conn, "notes", 3).unwrap();
    let ids: Vec<&str> = page.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids, ["note_1", "note_2", "note_3"]);

    let all = store::scan_all(&conn, "notes", 100).unwrap();
    assert_eq!(all.len(), 5);
}
