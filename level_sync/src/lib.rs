//! Derives intraday trading reference levels for top-list symbols and keeps a
//! rolling window of per-symbol daily records reconciled in a local store.
//!
//! The crate is organized around one run of the pipeline:
//!
//! 1. [`windows`] anchors fetch windows to the 04:15 New York session boundary.
//! 2. [`levels`] turns minute, five-minute, and daily bar series into derived
//!    levels (premarket range, opening range, day range, volume leaders, and
//!    multi-year key levels).
//! 3. [`fundamentals`] shapes provider reference data into record fields.
//! 4. [`merge`] combines both field sets over a fixed key universe so every
//!    record carries an identical key set.
//! 5. [`reconcile`] plans inserts versus updates against the last seven days of
//!    stored records and applies them with per-symbol failure isolation.
//!
//! Everything downstream of the provider degrades instead of failing: a symbol
//! with no data still produces a record whose level fields are null.

#![deny(missing_docs)]

pub mod cache;
pub mod config;
pub mod db;
pub mod fundamentals;
pub mod levels;
pub mod merge;
pub mod news;
pub mod notify;
pub mod pipeline;
pub mod reconcile;
pub mod record;
pub mod schedule;
pub mod schema;
pub mod session;
pub mod store;
pub mod summarize;
pub mod toplist;
pub mod windows;
