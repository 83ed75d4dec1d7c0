//! Minimal query model for the document store.
//!
//! Three predicates cover every lookup the pipeline performs: equality,
//! set membership, and "field absent". Clauses are ANDed.

use serde_json::Value;

/// One field predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Field equals this value.
    Eq(Value),
    /// Field equals one of these values.
    In(Vec<Value>),
    /// Field is absent from the document. A field present with a null value
    /// is *not* missing: the record shape makes "unknown" an explicit null,
    /// so a genuinely absent key indicates a malformed document.
    Missing,
}

/// A conjunction of field predicates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<(String, Predicate)>,
}

impl Filter {
    /// An empty filter matching every document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an equality clause.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push((field.into(), Predicate::Eq(value.into())));
        self
    }

    /// Adds a set-membership clause.
    pub fn is_in<V: Into<Value>>(mut self, field: impl Into<String>, values: Vec<V>) -> Self {
        self.clauses.push((
            field.into(),
            Predicate::In(values.into_iter().map(Into::into).collect()),
        ));
        self
    }

    /// Adds a field-absent clause.
    pub fn missing(mut self, field: impl Into<String>) -> Self {
        self.clauses.push((field.into(), Predicate::Missing));
        self
    }

    /// The clauses, in insertion order.
    pub fn clauses(&self) -> &[(String, Predicate)] {
        &self.clauses
    }

    /// Whether a JSON object document satisfies every clause.
    pub fn matches(&self, doc: &Value) -> bool {
        let Some(obj) = doc.as_object() else {
            return false;
        };
        self.clauses.iter().all(|(field, pred)| match pred {
            Predicate::Eq(value) => obj.get(field) == Some(value),
            Predicate::In(values) => obj.get(field).is_some_and(|v| values.contains(v)),
            Predicate::Missing => !obj.contains_key(field),
        })
    }
}
