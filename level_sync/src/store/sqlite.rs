//! SQLite store backend.
//!
//! Documents are rows in one `documents` table, JSON-serialized, unique per
//! (collection, symbol, today_date). Indexed key fields (`symbol`,
//! `today_date`) are pushed down to SQL when the filter constrains them; the
//! full filter is then re-applied to the parsed documents, which also covers
//! the predicates SQL never sees (`Missing`, non-key fields).

use std::sync::{Mutex, MutexGuard};

use diesel::prelude::*;
use serde_json::Value;

use crate::db::{connection, migrate};
use crate::store::{
    DocKey, DocumentStore, Filter, Predicate, StoreError, StoreResult, stamp_key,
};

/// A `DocumentStore` over a single SQLite file.
pub struct SqliteStore {
    conn: Mutex<SqliteConnection>,
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `database_url`, runs
    /// pending migrations, and applies the connection PRAGMAs.
    pub fn open(database_url: &str) -> StoreResult<Self> {
        migrate::run_sqlite(database_url)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        let conn = connection::connect_sqlite(database_url)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn locked(&self) -> StoreResult<MutexGuard<'_, SqliteConnection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Database("sqlite connection lock poisoned".to_string()))
    }
}

/// String values a clause constrains an indexed column to, when it can be
/// pushed down to SQL. `None` means the clause is not SQL-expressible.
fn indexed_values(pred: &Predicate) -> Option<Vec<String>> {
    match pred {
        Predicate::Eq(Value::String(s)) => Some(vec![s.clone()]),
        Predicate::In(values) => Some(
            values
                .iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect(),
        ),
        _ => None,
    }
}

impl DocumentStore for SqliteStore {
    fn find(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<Value>> {
        use crate::schema::documents::dsl as d;

        let mut query = d::documents
            .filter(d::collection.eq(collection))
            .select(d::doc)
            .into_boxed();
        for (field, pred) in filter.clauses() {
            match (field.as_str(), indexed_values(pred)) {
                ("symbol", Some(values)) => query = query.filter(d::symbol.eq_any(values)),
                ("today_date", Some(values)) => {
                    query = query.filter(d::today_date.eq_any(values))
                }
                _ => {}
            }
        }

        let mut conn = self.locked()?;
        let rows: Vec<String> = query.load(&mut *conn)?;

        let mut docs = Vec::with_capacity(rows.len());
        for row in rows {
            let doc: Value = serde_json::from_str(&row)?;
            if filter.matches(&doc) {
                docs.push(doc);
            }
        }
        Ok(docs)
    }

    fn upsert(&self, collection: &str, key: &DocKey, doc: &Value) -> StoreResult<()> {
        use crate::schema::documents::dsl as d;

        let payload = serde_json::to_string(&stamp_key(doc, key))?;
        let mut conn = self.locked()?;
        diesel::insert_into(d::documents)
            .values((
                d::collection.eq(collection),
                d::symbol.eq(&key.symbol),
                d::today_date.eq(&key.today_date),
                d::doc.eq(&payload),
            ))
            .on_conflict((d::collection, d::symbol, d::today_date))
            .do_update()
            .set(d::doc.eq(&payload))
            .execute(&mut *conn)?;
        Ok(())
    }

    fn delete(&self, collection: &str, filter: &Filter) -> StoreResult<usize> {
        use crate::schema::documents::dsl as d;

        let mut conn = self.locked()?;
        let rows: Vec<(Option<i32>, String)> = d::documents
            .filter(d::collection.eq(collection))
            .select((d::id, d::doc))
            .load(&mut *conn)?;

        let mut ids = Vec::new();
        for (id, row) in rows {
            let doc: Value = serde_json::from_str(&row)?;
            if filter.matches(&doc) {
                if let Some(id) = id {
                    ids.push(id);
                }
            }
        }
        if ids.is_empty() {
            return Ok(0);
        }

        let deleted = diesel::delete(d::documents.filter(d::id.eq_any(ids)))
            .execute(&mut *conn)?;
        Ok(deleted)
    }
}
