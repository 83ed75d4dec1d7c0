//! Gainers-snapshot shaping and admission filtering.
//!
//! The snapshot feed returns the whole market's top gainers; admission keeps
//! only low-priced movers with a short, clean ticker. The last-minute close
//! is the price gate, not the day aggregate, so halted or stale names drop
//! out naturally.

use market_data_ingestor::providers::polygon_rest::TickerSnapshot;
use serde::Serialize;
use tracing::info;

use crate::levels::round2;

/// Admission thresholds for the gainers list.
#[derive(Debug, Clone, PartialEq)]
pub struct ToplistFilter {
    /// Lowest admissible last-minute close, exclusive.
    pub min_price: f64,
    /// Highest admissible last-minute close, exclusive.
    pub max_price: f64,
    /// Minimum day change percentage, exclusive.
    pub min_change_percent: f64,
    /// Longest admissible ticker symbol.
    pub max_symbol_len: usize,
}

impl Default for ToplistFilter {
    fn default() -> Self {
        Self {
            min_price: 1.0,
            max_price: 50.0,
            min_change_percent: 50.0,
            max_symbol_len: 4,
        }
    }
}

/// A flattened, rounded view of one gainers-snapshot entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GainerRow {
    /// The ticker symbol.
    pub ticker: String,
    /// Today's session open.
    pub today_open: Option<f64>,
    /// Today's session high.
    pub today_high: Option<f64>,
    /// Today's session low.
    pub today_low: Option<f64>,
    /// Today's session close so far.
    pub today_close: Option<f64>,
    /// Today's session volume so far.
    pub today_volume: Option<f64>,
    /// Previous session close.
    pub prev_close: Option<f64>,
    /// Latest minute close.
    pub min_close: Option<f64>,
    /// Latest minute volume.
    pub min_volume: Option<f64>,
    /// Absolute change on the day.
    pub todays_change: Option<f64>,
    /// Percentage change on the day.
    pub change_percent: Option<f64>,
}

fn fmt(v: Option<f64>) -> Option<f64> {
    v.map(round2)
}

/// Flattens snapshots into rows, rounding every price to 2 decimals.
pub fn shape_rows(snapshots: &[TickerSnapshot]) -> Vec<GainerRow> {
    snapshots
        .iter()
        .map(|s| {
            let day = s.day.clone().unwrap_or_default();
            let min = s.min.clone().unwrap_or_default();
            GainerRow {
                ticker: s.ticker.clone(),
                today_open: fmt(day.open),
                today_high: fmt(day.high),
                today_low: fmt(day.low),
                today_close: fmt(day.close),
                today_volume: fmt(day.volume),
                prev_close: fmt(s.prev_day.clone().unwrap_or_default().close),
                min_close: fmt(min.close),
                min_volume: fmt(min.volume),
                todays_change: fmt(s.todays_change),
                change_percent: fmt(s.todays_change_percent),
            }
        })
        .collect()
}

/// The tickers passing the admission thresholds, in snapshot order.
pub fn filter_symbols(snapshots: &[TickerSnapshot], filter: &ToplistFilter) -> Vec<String> {
    let symbols: Vec<String> = shape_rows(snapshots)
        .into_iter()
        .filter(|row| {
            let Some(price) = row.min_close else {
                return false;
            };
            let Some(change) = row.change_percent else {
                return false;
            };
            price > filter.min_price
                && price < filter.max_price
                && change > filter.min_change_percent
                && row.ticker.len() <= filter.max_symbol_len
        })
        .map(|row| row.ticker)
        .collect();
    info!(?symbols, "filtered top gainers");
    symbols
}

/// Strips everything but ASCII uppercase from a ticker. Warrants and units
/// come through the snapshot with suffixes like `.WS` that the bar endpoints
/// do not accept.
pub fn clean_symbol(symbol: &str) -> String {
    symbol.chars().filter(char::is_ascii_uppercase).collect()
}

/// [`clean_symbol`] over a whole list, preserving order.
pub fn clean_symbols(symbols: &[String]) -> Vec<String> {
    symbols.iter().map(|s| clean_symbol(s)).collect()
}

#[cfg(test)]
mod tests {
    use market_data_ingestor::providers::polygon_rest::SnapshotAgg;

    use super::*;

    fn snapshot(ticker: &str, min_close: Option<f64>, change_percent: f64) -> TickerSnapshot {
        TickerSnapshot {
            ticker: ticker.to_string(),
            todays_change: Some(1.0),
            todays_change_percent: Some(change_percent),
            day: None,
            prev_day: None,
            min: min_close.map(|c| SnapshotAgg {
                close: Some(c),
                ..SnapshotAgg::default()
            }),
        }
    }

    #[test]
    fn admission_thresholds_are_exclusive() {
        let snapshots = vec![
            snapshot("AAA", Some(5.0), 80.0),   // passes
            snapshot("BBB", Some(1.0), 80.0),   // at min price: rejected
            snapshot("CCC", Some(50.0), 80.0),  // at max price: rejected
            snapshot("DDD", Some(5.0), 50.0),   // at min change: rejected
            snapshot("LONGR", Some(5.0), 80.0), // five letters: rejected
            snapshot("EEE", None, 80.0),        // no last-minute close: rejected
        ];
        let passed = filter_symbols(&snapshots, &ToplistFilter::default());
        assert_eq!(passed, vec!["AAA".to_string()]);
    }

    #[test]
    fn cleaning_strips_non_uppercase() {
        assert_eq!(clean_symbol("ABC.WS"), "ABCWS");
        assert_eq!(clean_symbol("BRK.A"), "BRKA");
        assert_eq!(clean_symbol("AAA"), "AAA");
    }
}
