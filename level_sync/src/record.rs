//! The per-symbol record shape shared by every pipeline stage.
//!
//! A record is an ordered map from field name to JSON value. The full key
//! universe is fixed ([`RECORD_KEYS`]); seeding every key up front means two
//! records for different symbols always carry the same keys in the same order,
//! and "no data" is an explicit null rather than an absent field.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Every field a fully-merged record carries, in output order.
///
/// The camelCase entries mirror the upstream fundamentals feed; the snake_case
/// entries are computed by this crate.
pub const RECORD_KEYS: &[&str] = &[
    "symbol",
    "name",
    "listingExchange",
    "securityType",
    "countryDomicile",
    "countryIncorporation",
    "isin",
    "sector",
    "industry",
    "lastSplitInfo",
    "lastSplitDate",
    "lotSize",
    "optionable",
    "earningsPerShare",
    "earningsPerShareTTM",
    "forwardEarningsPerShare",
    "nextEarnings",
    "annualDividend",
    "last12MonthDividend",
    "lastDividend",
    "exDividend",
    "dividendFrequency",
    "beta",
    "averageVolume3M",
    "turnoverPercentage",
    "bookValue",
    "sales",
    "outstandingShares",
    "float",
    "premarket_high",
    "premarket_low",
    "market_open_high",
    "market_open_low",
    "day_high",
    "day_low",
    "day_close",
    "yesterday_close",
    "high_change_percentage",
    "close_change_percentage",
    "most_volume_high",
    "most_volume_low",
    "key_levels",
    "polygon_details",
    "suggestion",
    "today_date",
];

/// One per-symbol record: an ordered field map, possibly partial.
///
/// Partial records (just the level fields, or just the fundamentals fields)
/// flow through the pipeline and are widened to the full key universe by the
/// merger.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolRecord(IndexMap<String, Value>);

impl SymbolRecord {
    /// An empty record with no fields.
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// A record with every key in [`RECORD_KEYS`] set to null and `symbol`
    /// filled in.
    pub fn seeded(symbol: &str) -> Self {
        let mut map = IndexMap::with_capacity(RECORD_KEYS.len());
        for key in RECORD_KEYS {
            map.insert((*key).to_string(), Value::Null);
        }
        map.insert("symbol".to_string(), Value::String(symbol.to_string()));
        Self(map)
    }

    /// The underlying ordered field map.
    pub fn fields(&self) -> &IndexMap<String, Value> {
        &self.0
    }

    /// Looks up one field. Absent and null are distinct.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Sets one field, preserving insertion order for new keys.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    /// True when the field is absent or null.
    pub fn is_null(&self, key: &str) -> bool {
        self.0.get(key).is_none_or(Value::is_null)
    }

    /// Copies every field of `other` into `self`, overwriting on conflict.
    pub fn overlay(&mut self, other: &SymbolRecord) {
        for (key, value) in &other.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// Copies only the non-null fields of `other` into `self`. Keys `other`
    /// carries that `self` lacks are still inserted, null or not, so the key
    /// sets stay aligned.
    pub fn overlay_non_null(&mut self, other: &SymbolRecord) {
        for (key, value) in &other.0 {
            if !value.is_null() || !self.0.contains_key(key) {
                self.0.insert(key.clone(), value.clone());
            }
        }
    }

    /// The `symbol` field, when present and a string.
    pub fn symbol(&self) -> Option<&str> {
        self.0.get("symbol").and_then(Value::as_str)
    }

    /// The `today_date` field, when present and a string.
    pub fn today_date(&self) -> Option<&str> {
        self.0.get("today_date").and_then(Value::as_str)
    }

    /// The record as a JSON object value, for storage.
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }

    /// Rebuilds a record from a stored JSON object. Non-objects yield `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        Some(Self(
            obj.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        ))
    }
}
