mod common;
use common::setup_store;

use level_sync::store::{DocKey, DocumentStore, Filter};
use serde_json::json;

#[test]
fn upsert_find_delete_round_trip() {
    let (_db, store) = setup_store();
    let collection = "records";

    store
        .upsert(
            collection,
            &DocKey::new("AAA", "2025-03-03"),
            &json!({"day_close": 12.34, "close_change_percentage": 10.0}),
        )
        .unwrap();
    store
        .upsert(
            collection,
            &DocKey::new("BBB", "2025-03-03"),
            &json!({"day_close": 5.0, "close_change_percentage": 55.0}),
        )
        .unwrap();

    let found = store
        .find(collection, &Filter::new().eq("symbol", "AAA"))
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["day_close"], json!(12.34));
    // Key fields are stamped into the stored document.
    assert_eq!(found[0]["today_date"], json!("2025-03-03"));

    let removed = store
        .delete(collection, &Filter::new().eq("symbol", "AAA"))
        .unwrap();
    assert_eq!(removed, 1);
    assert_eq!(store.find(collection, &Filter::new()).unwrap().len(), 1);
}

#[test]
fn upsert_replaces_on_conflicting_key() {
    let (_db, store) = setup_store();
    let key = DocKey::new("AAA", "2025-03-03");

    store
        .upsert("records", &key, &json!({"day_close": 1.0}))
        .unwrap();
    store
        .upsert("records", &key, &json!({"day_close": 2.0}))
        .unwrap();

    let found = store
        .find("records", &Filter::new().eq("symbol", "AAA"))
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["day_close"], json!(2.0));
}

#[test]
fn collections_are_isolated() {
    let (_db, store) = setup_store();
    let key = DocKey::new("AAA", "2025-03-03");

    store.upsert("one", &key, &json!({"v": 1})).unwrap();
    store.upsert("two", &key, &json!({"v": 2})).unwrap();

    let one = store.find("one", &Filter::new()).unwrap();
    assert_eq!(one.len(), 1);
    assert_eq!(one[0]["v"], json!(1));
}

#[test]
fn membership_and_date_filters_narrow_results() {
    let (_db, store) = setup_store();
    for (symbol, date) in [
        ("AAA", "2025-03-01"),
        ("AAA", "2025-03-03"),
        ("BBB", "2025-03-03"),
        ("CCC", "2025-03-03"),
    ] {
        store
            .upsert("records", &DocKey::new(symbol, date), &json!({}))
            .unwrap();
    }

    let filter = Filter::new()
        .is_in("symbol", vec!["AAA", "BBB"])
        .eq("today_date", "2025-03-03");
    let found = store.find("records", &filter).unwrap();
    assert_eq!(found.len(), 2);
}

#[test]
fn missing_field_predicate_sees_absent_keys_only() {
    let (_db, store) = setup_store();
    store
        .upsert(
            "records",
            &DocKey::new("OK", "2025-03-03"),
            &json!({"close_change_percentage": null}),
        )
        .unwrap();
    store
        .upsert(
            "records",
            &DocKey::new("BAD", "2025-03-03"),
            &json!({"suggestion": "orphan"}),
        )
        .unwrap();

    let corrupt = store
        .find("records", &Filter::new().missing("close_change_percentage"))
        .unwrap();
    assert_eq!(corrupt.len(), 1);
    assert_eq!(corrupt[0]["symbol"], json!("BAD"));
}
