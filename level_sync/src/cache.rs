//! Process-lifetime memoization of store reads.
//!
//! Keys are (sorted symbol set, date), so the same batch queried twice in a
//! run hits memory instead of the store. Writers must call [`invalidate`]
//! for the key they wrote under; a stale read after a write is a correctness
//! bug, not an acceptable staleness window.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use once_cell::sync::Lazy;
use serde_json::Value;

/// A cache key: the deduplicated, sorted symbol set plus the run date.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    symbols: Vec<String>,
    date: String,
}

impl CacheKey {
    /// Builds a key; symbol order and duplicates in the input are irrelevant.
    pub fn new(symbols: &[String], date: &str) -> Self {
        let mut symbols = symbols.to_vec();
        symbols.sort();
        symbols.dedup();
        Self {
            symbols,
            date: date.to_string(),
        }
    }
}

type CacheMap = HashMap<CacheKey, Arc<Vec<Value>>>;

static CACHE: Lazy<ArcSwap<CacheMap>> = Lazy::new(|| ArcSwap::from_pointee(CacheMap::new()));

/// The cached documents for `key`, if any.
pub fn get(key: &CacheKey) -> Option<Arc<Vec<Value>>> {
    CACHE.load().get(key).cloned()
}

/// Caches `docs` under `key`, replacing any previous entry.
pub fn put(key: CacheKey, docs: Vec<Value>) {
    let mut map = CacheMap::clone(&CACHE.load());
    map.insert(key, Arc::new(docs));
    CACHE.store(Arc::new(map));
}

/// Drops the entry for `key`. Must be called after any write covering it.
pub fn invalidate(key: &CacheKey) {
    let current = CACHE.load();
    if !current.contains_key(key) {
        return;
    }
    let mut map = CacheMap::clone(&current);
    map.remove(key);
    CACHE.store(Arc::new(map));
}

/// Empties the cache. Called at the start of every run.
pub fn clear() {
    CACHE.store(Arc::new(CacheMap::new()));
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn key_normalizes_symbol_order_and_duplicates() {
        let a = CacheKey::new(
            &["B".to_string(), "A".to_string(), "A".to_string()],
            "2025-03-03",
        );
        let b = CacheKey::new(&["A".to_string(), "B".to_string()], "2025-03-03");
        assert_eq!(a, b);
        assert_ne!(a, CacheKey::new(&["A".to_string(), "B".to_string()], "2025-03-04"));
    }

    #[test]
    fn put_get_invalidate_cycle() {
        clear();
        let key = CacheKey::new(&["AAA".to_string()], "2025-03-03");
        assert!(get(&key).is_none());

        put(key.clone(), vec![json!({"symbol": "AAA"})]);
        let hit = get(&key).unwrap();
        assert_eq!(hit.len(), 1);

        invalidate(&key);
        assert!(get(&key).is_none());
    }
}
