//! In-memory store backend, used by unit tests and dry runs.

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;

use crate::store::{DocKey, DocumentStore, Filter, StoreError, StoreResult, stamp_key};

/// A `DocumentStore` over a mutex-guarded map of collections.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, Vec<Value>>>,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn locked(&self) -> StoreResult<std::sync::MutexGuard<'_, HashMap<String, Vec<Value>>>> {
        self.collections
            .lock()
            .map_err(|_| StoreError::Database("memory store lock poisoned".to_string()))
    }
}

impl DocumentStore for MemoryStore {
    fn find(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<Value>> {
        let collections = self.locked()?;
        Ok(collections
            .get(collection)
            .map(|docs| docs.iter().filter(|d| filter.matches(d)).cloned().collect())
            .unwrap_or_default())
    }

    fn upsert(&self, collection: &str, key: &DocKey, doc: &Value) -> StoreResult<()> {
        let stamped = stamp_key(doc, key);
        let mut collections = self.locked()?;
        let docs = collections.entry(collection.to_string()).or_default();

        let existing = docs.iter_mut().find(|d| {
            d.get("symbol").and_then(Value::as_str) == Some(key.symbol.as_str())
                && d.get("today_date").and_then(Value::as_str) == Some(key.today_date.as_str())
        });
        match existing {
            Some(slot) => *slot = stamped,
            None => docs.push(stamped),
        }
        Ok(())
    }

    fn delete(&self, collection: &str, filter: &Filter) -> StoreResult<usize> {
        let mut collections = self.locked()?;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let before = docs.len();
        docs.retain(|d| !filter.matches(d));
        Ok(before - docs.len())
    }
}
