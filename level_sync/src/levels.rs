//! Pure derivation of trading reference levels from bar series.
//!
//! Every function here is total: empty input yields null fields (or an empty
//! key-level list), never an error. The only failure signal that exists at
//! all is [`MalformedRange`] for an unparseable opening-range configuration,
//! and [`derive`] converts it to a null result after logging.

use chrono::NaiveTime;
use chrono_tz::Tz;
use market_data_ingestor::models::{bar::Bar, bar_series::BarSeries};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::warn;

use crate::record::SymbolRecord;
use crate::session::SessionPartition;

/// An opening-range bound that does not parse as `HH:MM`.
#[derive(Debug, Error)]
#[error("malformed opening-range bound: {0}")]
pub struct MalformedRange(pub String);

/// Tunables for the derivation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelConfig {
    /// Opening-range start, local clock time, inclusive. `HH:MM`.
    pub opening_range_start: String,
    /// Opening-range end, local clock time, inclusive. `HH:MM`.
    pub opening_range_end: String,
    /// Maximum number of key levels to report.
    pub key_level_count: usize,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            opening_range_start: "09:31".to_string(),
            opening_range_end: "09:45".to_string(),
            key_level_count: 5,
        }
    }
}

/// The full metric set for one symbol, one run.
///
/// Price and percentage fields are rounded to 2 decimals. A null field means
/// its preconditions were unmet (no bars, no premarket, fewer than two daily
/// bars, and so on). `key_levels` is empty, never null.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedLevels {
    /// The symbol the levels were computed for.
    pub symbol: String,
    /// Max high across premarket bars of the latest session.
    pub premarket_high: Option<f64>,
    /// Min low across premarket bars of the latest session.
    pub premarket_low: Option<f64>,
    /// Max high inside the configured opening range.
    pub market_open_high: Option<f64>,
    /// Min low inside the configured opening range.
    pub market_open_low: Option<f64>,
    /// Max high across the whole latest session, premarket included.
    pub day_high: Option<f64>,
    /// Min low across regular-session bars only.
    pub day_low: Option<f64>,
    /// Close of the last bar of the latest session.
    pub day_close: Option<f64>,
    /// Close of the second-from-last daily bar.
    pub yesterday_close: Option<f64>,
    /// Day high versus yesterday close, percent.
    pub high_change_percentage: Option<f64>,
    /// Day close versus yesterday close, percent.
    pub close_change_percentage: Option<f64>,
    /// High of the highest-volume green bar of the session.
    pub most_volume_high: Option<f64>,
    /// Low of the highest-volume red regular-session bar.
    pub most_volume_low: Option<f64>,
    /// Multi-year resistance candidates, ascending, deduplicated.
    pub key_levels: Vec<f64>,
}

impl DerivedLevels {
    /// The levels as a partial [`SymbolRecord`], field names matching the
    /// stored record shape.
    pub fn into_record(self) -> SymbolRecord {
        let mut record = SymbolRecord::new();
        record.set("symbol", json!(self.symbol));
        record.set("premarket_high", opt(self.premarket_high));
        record.set("premarket_low", opt(self.premarket_low));
        record.set("market_open_high", opt(self.market_open_high));
        record.set("market_open_low", opt(self.market_open_low));
        record.set("day_high", opt(self.day_high));
        record.set("day_low", opt(self.day_low));
        record.set("day_close", opt(self.day_close));
        record.set("yesterday_close", opt(self.yesterday_close));
        record.set("high_change_percentage", opt(self.high_change_percentage));
        record.set("close_change_percentage", opt(self.close_change_percentage));
        record.set("most_volume_high", opt(self.most_volume_high));
        record.set("most_volume_low", opt(self.most_volume_low));
        record.set("key_levels", json!(self.key_levels));
        record
    }
}

fn opt(v: Option<f64>) -> Value {
    match v {
        Some(v) => json!(v),
        None => Value::Null,
    }
}

pub(crate) fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Derives the full metric set for one symbol from its three bar series.
pub fn derive(
    symbol: &str,
    minute: &BarSeries,
    five_minute: &BarSeries,
    daily: &BarSeries,
    tz: &Tz,
    cfg: &LevelConfig,
) -> DerivedLevels {
    let part = SessionPartition::latest_session(minute, tz);

    let premarket_high = part.as_ref().and_then(|p| max_high(&p.premarket));
    let premarket_low = part.as_ref().and_then(|p| min_low(&p.premarket));

    let (market_open_high, market_open_low) = match opening_range(minute, tz, cfg) {
        Ok(range) => range,
        Err(e) => {
            warn!(symbol, error = %e, "opening range disabled for this run");
            (None, None)
        }
    };

    let day_high = part.as_ref().and_then(|p| max_high(&p.session));
    let day_low = part.as_ref().and_then(|p| min_low(&p.regular));
    let day_close = part.as_ref().and_then(|p| p.last_close()).map(round2);

    let yesterday_close = yesterday_close(daily);
    let high_change_percentage = change_pct(day_high, yesterday_close);
    let close_change_percentage = change_pct(day_close, yesterday_close);

    let most_volume_high = part
        .as_ref()
        .and_then(|p| top_volume_bar(&p.session, Bar::is_green))
        .map(|b| round2(b.high));
    let most_volume_low = part
        .as_ref()
        .and_then(|p| top_volume_bar(&p.regular, Bar::is_red))
        .map(|b| round2(b.low));

    let key_levels = key_levels(five_minute, daily, day_high, tz, cfg.key_level_count);

    DerivedLevels {
        symbol: symbol.to_string(),
        premarket_high,
        premarket_low,
        market_open_high,
        market_open_low,
        day_high,
        day_low,
        day_close,
        yesterday_close,
        high_change_percentage,
        close_change_percentage,
        most_volume_high,
        most_volume_low,
        key_levels,
    }
}

fn max_high(bars: &[Bar]) -> Option<f64> {
    bars.iter().map(|b| b.high).reduce(f64::max).map(round2)
}

fn min_low(bars: &[Bar]) -> Option<f64> {
    bars.iter().map(|b| b.low).reduce(f64::min).map(round2)
}

fn parse_clock(bound: &str) -> Result<NaiveTime, MalformedRange> {
    NaiveTime::parse_from_str(bound, "%H:%M").map_err(|_| MalformedRange(bound.to_string()))
}

/// High/low over the configured opening range on the latest session date,
/// bounds inclusive.
fn opening_range(
    minute: &BarSeries,
    tz: &Tz,
    cfg: &LevelConfig,
) -> Result<(Option<f64>, Option<f64>), MalformedRange> {
    let start = parse_clock(&cfg.opening_range_start)?;
    let end = parse_clock(&cfg.opening_range_end)?;

    let Some(date) = minute
        .bars
        .iter()
        .map(|b| b.timestamp.with_timezone(tz).date_naive())
        .max()
    else {
        return Ok((None, None));
    };

    let in_range: Vec<Bar> = minute
        .bars
        .iter()
        .filter(|b| {
            let local = b.timestamp.with_timezone(tz);
            local.date_naive() == date && local.time() >= start && local.time() <= end
        })
        .cloned()
        .collect();

    Ok((max_high(&in_range), min_low(&in_range)))
}

/// Close of the second-from-last daily bar, sorted ascending by time.
fn yesterday_close(daily: &BarSeries) -> Option<f64> {
    let mut bars: Vec<&Bar> = daily.bars.iter().collect();
    bars.sort_by_key(|b| b.timestamp);
    if bars.len() < 2 {
        return None;
    }
    Some(round2(bars[bars.len() - 2].close))
}

/// Percentage change of `metric` against `baseline`. Zero on either side is
/// treated as missing, matching the null-propagation convention of the rest
/// of the metric set.
fn change_pct(metric: Option<f64>, baseline: Option<f64>) -> Option<f64> {
    let metric = metric?;
    let baseline = baseline?;
    if metric == 0.0 || baseline == 0.0 {
        return None;
    }
    Some(round2((metric - baseline) / baseline * 100.0))
}

/// The bar with the greatest volume among those matching `side`, volume > 0.
/// On a volume tie the earliest bar wins.
fn top_volume_bar(bars: &[Bar], side: fn(&Bar) -> bool) -> Option<&Bar> {
    bars.iter()
        .filter(|b| side(b) && b.volume > 0.0)
        .fold(None, |best: Option<&Bar>, bar| match best {
            Some(top) if bar.volume > top.volume => Some(bar),
            None => Some(bar),
            _ => best,
        })
}

/// Multi-year resistance candidates.
///
/// The reference volume is the sum of five-minute volumes at/after 04:00
/// local across the five-minute window. A daily bar qualifies when its volume
/// exceeds that reference and its high exceeds today's high; it contributes
/// its low when the low alone clears today's high, otherwise its high. The
/// result is deduplicated, ascending, at most `n` entries, and empty (never
/// null) when nothing qualifies.
fn key_levels(
    five_minute: &BarSeries,
    daily: &BarSeries,
    day_high: Option<f64>,
    tz: &Tz,
    n: usize,
) -> Vec<f64> {
    let Some(day_high) = day_high else {
        return Vec::new();
    };
    let four_am = NaiveTime::from_hms_opt(4, 0, 0).unwrap();

    let reference: f64 = five_minute
        .bars
        .iter()
        .filter(|b| b.timestamp.with_timezone(tz).time() >= four_am)
        .map(|b| b.volume)
        .sum();

    // Work in integer cents so dedup after rounding is exact.
    let mut cents: Vec<i64> = daily
        .bars
        .iter()
        .filter(|c| c.volume > reference && c.high > day_high)
        .map(|c| {
            let price = if c.low > day_high { c.low } else { c.high };
            (price * 100.0).round() as i64
        })
        .collect();

    cents.sort_unstable();
    cents.dedup();
    cents.truncate(n);
    cents.into_iter().map(|c| c as f64 / 100.0).collect()
}
