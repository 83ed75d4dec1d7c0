//! The document store boundary.
//!
//! Records are stored as JSON documents in named collections, keyed by
//! (symbol, today_date). The trait is deliberately small: find, upsert,
//! delete, with a filter supporting only equality, membership, and
//! field-absent predicates. [`MemoryStore`] backs the tests;
//! [`SqliteStore`] backs the binary.

pub mod filter;
pub mod memory;
pub mod sqlite;

pub use filter::{Filter, Predicate};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use serde_json::Value;
use thiserror::Error;

/// Errors from the document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying database rejected an operation.
    #[error("Database error: {0}")]
    Database(String),
    /// A stored document failed to serialize or deserialize.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<diesel::result::Error> for StoreError {
    fn from(e: diesel::result::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// The unique key of one stored record within a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocKey {
    /// The symbol the record describes.
    pub symbol: String,
    /// The exchange-local calendar date, `YYYY-MM-DD`.
    pub today_date: String,
}

impl DocKey {
    /// Builds a key from its two parts.
    pub fn new(symbol: impl Into<String>, today_date: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            today_date: today_date.into(),
        }
    }
}

/// A JSON document store with upsert semantics on (symbol, today_date).
pub trait DocumentStore: Send + Sync {
    /// All documents in `collection` matching `filter`.
    fn find(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<Value>>;

    /// Inserts or replaces the document at `key`. The key fields are written
    /// into the document itself so a later read round-trips them.
    fn upsert(&self, collection: &str, key: &DocKey, doc: &Value) -> StoreResult<()>;

    /// Deletes every document matching `filter`; returns how many went.
    fn delete(&self, collection: &str, filter: &Filter) -> StoreResult<usize>;
}

/// Stamps the key fields into a document copy before it is written.
pub(crate) fn stamp_key(doc: &Value, key: &DocKey) -> Value {
    let mut doc = doc.clone();
    if let Some(obj) = doc.as_object_mut() {
        obj.insert("symbol".to_string(), Value::String(key.symbol.clone()));
        obj.insert(
            "today_date".to_string(),
            Value::String(key.today_date.clone()),
        );
    }
    doc
}
