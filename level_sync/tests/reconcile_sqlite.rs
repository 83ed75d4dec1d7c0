mod common;
use common::setup_store;

use chrono::NaiveDate;
use level_sync::reconcile::{self, scrub};
use level_sync::record::SymbolRecord;
use level_sync::store::{DocKey, DocumentStore};
use serde_json::{Value, json};

const COLLECTION: &str = "fundamentals_of_top_list_symbols";

fn fresh(symbol: &str, day_close: Option<f64>) -> SymbolRecord {
    let mut r = SymbolRecord::seeded(symbol);
    r.set("day_close", day_close.map_or(Value::Null, |v| json!(v)));
    r.set("close_change_percentage", json!(12.5));
    r
}

#[test]
fn full_reconcile_cycle_against_sqlite() {
    let (_db, store) = setup_store();
    let today = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
    let symbols = vec!["AAA".to_string(), "BBB".to_string()];

    // Seed BBB with a two-day-old record carrying a field today's run
    // cannot recompute.
    let mut old = SymbolRecord::seeded("BBB");
    old.set("day_close", json!(50.0));
    old.set("name", json!("Beta Corp"));
    old.set("today_date", json!("2025-03-01"));
    store
        .upsert(
            COLLECTION,
            &DocKey::new("BBB", "2025-03-01"),
            &old.to_value(),
        )
        .unwrap();

    let batch = vec![fresh("AAA", Some(10.0)), fresh("BBB", None)];

    let history = reconcile::fetch_history(&store, COLLECTION, &symbols, today).unwrap();
    assert_eq!(history.len(), 1);

    let plan = reconcile::plan(&batch, &history, "2025-03-03");
    assert_eq!(plan.inserts.len(), 1);
    assert_eq!(plan.updates.len(), 1);

    let applied = reconcile::apply(&store, COLLECTION, &plan, false);
    assert_eq!(applied.inserted, 1);
    assert_eq!(applied.updated, 1);
    assert!(applied.failures.is_empty());

    // The BBB update forward-filled the old fields and landed under today.
    let missing = reconcile::verify(&store, COLLECTION, &symbols, "2025-03-03").unwrap();
    assert!(missing.is_empty());

    let after = reconcile::fetch_history(&store, COLLECTION, &symbols, today).unwrap();
    let bbb_today = after
        .iter()
        .find(|r| r.symbol() == Some("BBB") && r.today_date() == Some("2025-03-03"))
        .unwrap();
    assert_eq!(bbb_today.get("day_close"), Some(&json!(50.0)));
    assert_eq!(bbb_today.get("name"), Some(&json!("Beta Corp")));

    // The old record is superseded, not deleted.
    assert!(
        after
            .iter()
            .any(|r| r.symbol() == Some("BBB") && r.today_date() == Some("2025-03-01"))
    );
}

#[test]
fn second_run_on_the_same_day_is_idempotent() {
    let (_db, store) = setup_store();
    let today = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
    let symbols = vec!["AAA".to_string()];
    let batch = vec![fresh("AAA", Some(10.0))];

    for _ in 0..2 {
        let history = reconcile::fetch_history(&store, COLLECTION, &symbols, today).unwrap();
        let plan = reconcile::plan(&batch, &history, "2025-03-03");
        reconcile::apply(&store, COLLECTION, &plan, false);
    }

    let after = reconcile::fetch_history(&store, COLLECTION, &symbols, today).unwrap();
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].get("day_close"), Some(&json!(10.0)));
}

#[test]
fn scrub_removes_partial_documents() {
    let (_db, store) = setup_store();
    store
        .upsert(
            COLLECTION,
            &DocKey::new("GOOD", "2025-03-03"),
            &fresh("GOOD", Some(1.0)).to_value(),
        )
        .unwrap();
    store
        .upsert(
            COLLECTION,
            &DocKey::new("BAD", "2025-03-03"),
            &json!({"suggestion": "orphaned partial write"}),
        )
        .unwrap();

    let report = scrub(&store, COLLECTION).unwrap();
    assert_eq!(report.found, vec!["BAD".to_string()]);
    assert_eq!(report.deleted, 1);
}
