//! Rolling reconciliation of fresh records against the last seven days of
//! stored history.
//!
//! Per symbol: no history in the lookback window means insert; otherwise the
//! fresh record is overlaid onto the latest prior record (fresh non-null
//! fields win, prior fields forward-fill the gaps) and written as an update
//! for today. Either way at most one record exists per (symbol, day).

use chrono::{Duration, NaiveDate};
use tracing::{info, warn};

use crate::record::SymbolRecord;
use crate::store::{DocKey, DocumentStore, Filter, StoreResult};

/// How many calendar days of history, today inclusive, reconciliation reads.
pub const LOOKBACK_DAYS: i64 = 7;

/// A field every healthy stored record must carry (possibly null). Documents
/// where the key itself is absent are corrupt and are scrub candidates.
pub const REQUIRED_FIELD: &str = "close_change_percentage";

/// The `YYYY-MM-DD` strings for `days` dates ending at `today`, inclusive.
pub fn lookback_dates(today: NaiveDate, days: i64) -> Vec<String> {
    (0..days)
        .map(|back| (today - Duration::days(back)).format("%Y-%m-%d").to_string())
        .collect()
}

/// The outcome of planning one batch: what to insert and what to update.
#[derive(Debug, Clone, Default)]
pub struct ReconcilePlan {
    /// Records for symbols with no stored history in the lookback window.
    pub inserts: Vec<SymbolRecord>,
    /// Forward-filled records for symbols with prior history.
    pub updates: Vec<SymbolRecord>,
}

impl ReconcilePlan {
    /// True when the plan writes nothing.
    pub fn is_noop(&self) -> bool {
        self.inserts.is_empty() && self.updates.is_empty()
    }
}

/// Counters and per-symbol failures from applying a plan.
#[derive(Debug, Clone, Default)]
pub struct ApplyReport {
    /// Inserts that landed.
    pub inserted: usize,
    /// Updates that landed.
    pub updated: usize,
    /// Symbols whose write failed. Failures are isolated: the rest of the
    /// batch is still written.
    pub failures: Vec<String>,
}

/// Reads the lookback history for `symbols` from the store.
pub fn fetch_history(
    store: &dyn DocumentStore,
    collection: &str,
    symbols: &[String],
    today: NaiveDate,
) -> StoreResult<Vec<SymbolRecord>> {
    let filter = Filter::new()
        .is_in("symbol", symbols.to_vec())
        .is_in("today_date", lookback_dates(today, LOOKBACK_DAYS));
    let docs = store.find(collection, &filter)?;
    Ok(docs.iter().filter_map(SymbolRecord::from_value).collect())
}

/// Decides insert-versus-update for each fresh record.
///
/// Records without a symbol field are skipped with a warning; they cannot be
/// keyed.
pub fn plan(fresh: &[SymbolRecord], history: &[SymbolRecord], today: &str) -> ReconcilePlan {
    let mut out = ReconcilePlan::default();

    for record in fresh {
        let Some(symbol) = record.symbol() else {
            warn!("skipping fresh record without a symbol field");
            continue;
        };

        let latest_prior = history
            .iter()
            .filter(|h| h.symbol() == Some(symbol))
            .max_by_key(|h| h.today_date().unwrap_or(""));

        match latest_prior {
            None => {
                let mut insert = record.clone();
                insert.set("today_date", today.into());
                out.inserts.push(insert);
            }
            Some(prior) => {
                let mut merged = prior.clone();
                merged.overlay_non_null(record);
                merged.set("today_date", today.into());
                out.updates.push(merged);
            }
        }
    }
    out
}

/// Writes a plan to the store, one upsert per record.
///
/// In dry-run mode nothing is written; the would-be counts are logged.
pub fn apply(
    store: &dyn DocumentStore,
    collection: &str,
    plan: &ReconcilePlan,
    dry_run: bool,
) -> ApplyReport {
    let mut report = ApplyReport::default();
    if dry_run {
        info!(
            inserts = plan.inserts.len(),
            updates = plan.updates.len(),
            "dry run: skipping store writes"
        );
        return report;
    }

    let mut write = |records: &[SymbolRecord], count: &mut usize| {
        for record in records {
            let (Some(symbol), Some(date)) = (record.symbol(), record.today_date()) else {
                warn!("skipping planned record without a complete key");
                continue;
            };
            let key = DocKey::new(symbol, date);
            match store.upsert(collection, &key, &record.to_value()) {
                Ok(()) => *count += 1,
                Err(e) => {
                    warn!(symbol, error = %e, "record write failed");
                    report.failures.push(symbol.to_string());
                }
            }
        }
    };

    let mut inserted = 0;
    let mut updated = 0;
    write(&plan.inserts, &mut inserted);
    write(&plan.updates, &mut updated);
    report.inserted = inserted;
    report.updated = updated;
    report
}

/// Re-reads today's rows and returns the symbols whose write did not land.
pub fn verify(
    store: &dyn DocumentStore,
    collection: &str,
    symbols: &[String],
    today: &str,
) -> StoreResult<Vec<String>> {
    let filter = Filter::new()
        .is_in("symbol", symbols.to_vec())
        .eq("today_date", today);
    let docs = store.find(collection, &filter)?;

    let written: Vec<&str> = docs
        .iter()
        .filter_map(|d| d.get("symbol").and_then(|v| v.as_str()))
        .collect();
    Ok(symbols
        .iter()
        .filter(|s| !written.contains(&s.as_str()))
        .cloned()
        .collect())
}

/// What a scrub pass found and removed.
#[derive(Debug, Clone, Default)]
pub struct ScrubReport {
    /// Symbols of the corrupt documents found.
    pub found: Vec<String>,
    /// How many documents the deletion removed.
    pub deleted: usize,
}

/// The symbols of stored documents where [`REQUIRED_FIELD`] is absent.
pub fn find_missing_required(
    store: &dyn DocumentStore,
    collection: &str,
) -> StoreResult<Vec<String>> {
    let corrupt = store.find(collection, &Filter::new().missing(REQUIRED_FIELD))?;
    Ok(corrupt
        .iter()
        .filter_map(|d| d.get("symbol").and_then(|v| v.as_str()).map(String::from))
        .collect())
}

/// Deletes every document where [`REQUIRED_FIELD`] is absent.
pub fn delete_missing_required(
    store: &dyn DocumentStore,
    collection: &str,
) -> StoreResult<usize> {
    store.delete(collection, &Filter::new().missing(REQUIRED_FIELD))
}

/// Finds documents missing [`REQUIRED_FIELD`] entirely and deletes them.
///
/// The find and the delete are separate store calls; a failure in the
/// deletion leg still reports what was found.
pub fn scrub(store: &dyn DocumentStore, collection: &str) -> StoreResult<ScrubReport> {
    let found = find_missing_required(store, collection)?;
    if found.is_empty() {
        return Ok(ScrubReport::default());
    }
    warn!(symbols = ?found, "found stored records missing required fields");

    match delete_missing_required(store, collection) {
        Ok(deleted) => Ok(ScrubReport { found, deleted }),
        Err(e) => {
            warn!(error = %e, "corrective deletion failed; corrupt records remain");
            Ok(ScrubReport { found, deleted: 0 })
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use crate::store::MemoryStore;

    use super::*;

    fn fresh(symbol: &str, day_close: Option<f64>) -> SymbolRecord {
        let mut r = SymbolRecord::seeded(symbol);
        r.set(
            "day_close",
            day_close.map_or(Value::Null, |v| json!(v)),
        );
        r.set("close_change_percentage", json!(1.0));
        r
    }

    fn stored(symbol: &str, date: &str, day_close: f64) -> SymbolRecord {
        let mut r = SymbolRecord::seeded(symbol);
        r.set("day_close", json!(day_close));
        r.set("today_date", json!(date));
        r
    }

    #[test]
    fn no_history_plans_an_insert_for_today() {
        let plan = plan(&[fresh("AAA", Some(10.0))], &[], "2025-03-03");
        assert_eq!(plan.inserts.len(), 1);
        assert!(plan.updates.is_empty());
        assert_eq!(plan.inserts[0].today_date(), Some("2025-03-03"));
    }

    #[test]
    fn prior_fields_forward_fill_null_fresh_fields() {
        let history = vec![stored("BBB", "2025-03-01", 50.0)];
        let plan = plan(&[fresh("BBB", None)], &history, "2025-03-03");

        assert!(plan.inserts.is_empty());
        let merged = &plan.updates[0];
        assert_eq!(merged.get("day_close"), Some(&json!(50.0)));
        assert_eq!(merged.today_date(), Some("2025-03-03"));
    }

    #[test]
    fn the_latest_prior_record_wins() {
        let history = vec![
            stored("BBB", "2025-03-01", 40.0),
            stored("BBB", "2025-03-02", 50.0),
        ];
        let plan = plan(&[fresh("BBB", None)], &history, "2025-03-03");
        assert_eq!(plan.updates[0].get("day_close"), Some(&json!(50.0)));
    }

    #[test]
    fn reconciling_twice_in_a_row_is_idempotent() {
        let store = MemoryStore::new();
        let collection = "records";
        let today = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
        let symbols = vec!["AAA".to_string()];
        let batch = vec![fresh("AAA", Some(10.0))];

        let history = fetch_history(&store, collection, &symbols, today).unwrap();
        let first = plan(&batch, &history, "2025-03-03");
        apply(&store, collection, &first, false);

        let history = fetch_history(&store, collection, &symbols, today).unwrap();
        assert_eq!(history.len(), 1);
        let second = plan(&batch, &history, "2025-03-03");
        apply(&store, collection, &second, false);

        let after = fetch_history(&store, collection, &symbols, today).unwrap();
        assert_eq!(after.len(), 1);
        assert_eq!(after[0], history[0]);
    }

    #[test]
    fn verify_reports_symbols_that_did_not_land() {
        let store = MemoryStore::new();
        let batch = vec![fresh("AAA", Some(10.0))];
        let p = plan(&batch, &[], "2025-03-03");
        apply(&store, "records", &p, false);

        let missing = verify(
            &store,
            "records",
            &["AAA".to_string(), "ZZZ".to_string()],
            "2025-03-03",
        )
        .unwrap();
        assert_eq!(missing, vec!["ZZZ".to_string()]);
    }

    #[test]
    fn dry_run_writes_nothing() {
        let store = MemoryStore::new();
        let p = plan(&[fresh("AAA", Some(10.0))], &[], "2025-03-03");
        let report = apply(&store, "records", &p, true);
        assert_eq!(report.inserted, 0);
        assert!(store.find("records", &Filter::new()).unwrap().is_empty());
    }

    #[test]
    fn scrub_removes_documents_missing_the_required_field() {
        let store = MemoryStore::new();
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
                &json!({"suggestion": "partial write"}),
            )
            .unwrap();

        let report = scrub(&store, "records").unwrap();
        assert_eq!(report.found, vec!["BAD".to_string()]);
        assert_eq!(report.deleted, 1);
        assert_eq!(store.find("records", &Filter::new()).unwrap().len(), 1);
    }
}
