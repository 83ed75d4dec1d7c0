//! Merging fundamentals and derived levels into one record per symbol.

use std::collections::HashMap;

use serde_json::Value;

use crate::record::{RECORD_KEYS, SymbolRecord};

/// Merges per-symbol field sets over a fixed key universe.
///
/// The merge is total over the input symbol list: a symbol with no
/// fundamentals and no levels still yields a record, with every field null
/// except `symbol`. Fields are written fundamentals-first, levels second, so
/// a computed level wins over a fundamentals field of the same name.
#[derive(Debug, Clone)]
pub struct SymbolMerger {
    keys: Vec<String>,
}

impl Default for SymbolMerger {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolMerger {
    /// A merger over [`RECORD_KEYS`].
    pub fn new() -> Self {
        Self {
            keys: RECORD_KEYS.iter().map(|k| (*k).to_string()).collect(),
        }
    }

    /// Merges one record per input symbol, preserving input order.
    pub fn merge(
        &self,
        symbols: &[String],
        fundamentals: &[SymbolRecord],
        levels: &[SymbolRecord],
    ) -> Vec<SymbolRecord> {
        let by_symbol = |records: &[SymbolRecord]| -> HashMap<String, SymbolRecord> {
            records
                .iter()
                .filter_map(|r| r.symbol().map(|s| (s.to_string(), r.clone())))
                .collect()
        };
        let fundamentals = by_symbol(fundamentals);
        let levels = by_symbol(levels);

        symbols
            .iter()
            .map(|symbol| {
                let mut record = SymbolRecord::new();
                for key in &self.keys {
                    record.set(key.clone(), Value::Null);
                }
                if let Some(f) = fundamentals.get(symbol) {
                    record.overlay(f);
                }
                if let Some(l) = levels.get(symbol) {
                    record.overlay(l);
                }
                record.set("symbol", Value::String(symbol.clone()));
                record
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn partial(symbol: &str, key: &str, value: Value) -> SymbolRecord {
        let mut r = SymbolRecord::new();
        r.set("symbol", json!(symbol));
        r.set(key, value);
        r
    }

    #[test]
    fn merge_is_total_over_the_symbol_list() {
        let symbols = vec!["AAA".to_string(), "BBB".to_string(), "CCC".to_string()];
        let fundamentals = vec![partial("AAA", "name", json!("Alpha Inc"))];
        let levels = vec![partial("CCC", "day_close", json!(12.34))];

        let merged = SymbolMerger::new().merge(&symbols, &fundamentals, &levels);

        assert_eq!(merged.len(), 3);
        // Input order is preserved.
        let out: Vec<_> = merged.iter().map(|r| r.symbol().unwrap()).collect();
        assert_eq!(out, ["AAA", "BBB", "CCC"]);
        // BBB had no inputs at all but still yields a full record.
        assert!(merged[1].is_null("name"));
        assert!(merged[1].is_null("day_close"));
    }

    #[test]
    fn every_merged_record_carries_the_same_key_set() {
        let symbols = vec!["AAA".to_string(), "BBB".to_string()];
        let fundamentals = vec![partial("AAA", "name", json!("Alpha Inc"))];
        let merged = SymbolMerger::new().merge(&symbols, &fundamentals, &[]);

        let keys_a: Vec<_> = merged[0].fields().keys().cloned().collect();
        let keys_b: Vec<_> = merged[1].fields().keys().cloned().collect();
        assert_eq!(keys_a, keys_b);
        assert_eq!(keys_a.len(), RECORD_KEYS.len());
    }

    #[test]
    fn levels_win_over_fundamentals_on_conflict() {
        let symbols = vec!["AAA".to_string()];
        let fundamentals = vec![partial("AAA", "day_close", json!(1.0))];
        let levels = vec![partial("AAA", "day_close", json!(2.0))];
        let merged = SymbolMerger::new().merge(&symbols, &fundamentals, &levels);
        assert_eq!(merged[0].get("day_close"), Some(&json!(2.0)));
    }
}
