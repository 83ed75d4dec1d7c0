//! A collection of time-series bars for a specific symbol and timeframe.

use chrono::{DateTime, Utc};

use crate::models::{bar::Bar, timeframe::TimeFrame};

/// Represents a complete set of time-series data for a single symbol.
///
/// This struct groups a vector of [`Bar`]s with their corresponding symbol,
/// [`TimeFrame`], and the time window that was requested to produce it, making
/// the data set self-describing. The bar sequence is ascending by timestamp and
/// may be empty (a provider returning nothing is not an error). A series is
/// built once per fetch and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    /// The symbol this data represents (e.g., "AAPL").
    pub symbol: String,
    /// The time interval for each bar in the series.
    pub timeframe: TimeFrame,
    /// Start of the window the series was requested for (inclusive, UTC).
    pub window_start: DateTime<Utc>,
    /// End of the window the series was requested for (exclusive, UTC).
    pub window_end: DateTime<Utc>,
    /// The collection of OHLCV bars, ascending by timestamp.
    pub bars: Vec<Bar>,
}

impl BarSeries {
    /// An empty series for the given request shape. Used when a window is
    /// not yet available or a fetch degraded to "no data".
    pub fn empty(
        symbol: impl Into<String>,
        timeframe: TimeFrame,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
            window_start,
            window_end,
            bars: Vec::new(),
        }
    }

    /// True when the provider returned no bars for the window.
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}
