//! Partitioning a minute series into the latest session's premarket and
//! regular-hours slices.

use chrono::{NaiveDate, NaiveTime};
use chrono_tz::Tz;
use market_data_ingestor::models::{bar::Bar, bar_series::BarSeries};

/// Regular trading hours open, exchange-local.
pub fn market_open() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 30, 0).unwrap()
}

/// The latest session found in a minute series, split at the 09:30 open.
///
/// "Latest session" is the maximum exchange-local calendar date among the
/// bars; slicing by local date means a series spanning several days still
/// yields exactly one session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionPartition {
    /// The exchange-local calendar date of the session.
    pub date: NaiveDate,
    /// Every bar of the session, premarket through after hours, ascending.
    pub session: Vec<Bar>,
    /// Bars strictly before 09:30 local.
    pub premarket: Vec<Bar>,
    /// Bars at or after 09:30 local.
    pub regular: Vec<Bar>,
}

impl SessionPartition {
    /// Partitions the latest session out of `series`. `None` when the series
    /// holds no bars.
    pub fn latest_session(series: &BarSeries, tz: &Tz) -> Option<Self> {
        let date = series
            .bars
            .iter()
            .map(|b| b.timestamp.with_timezone(tz).date_naive())
            .max()?;

        let session: Vec<Bar> = series
            .bars
            .iter()
            .filter(|b| b.timestamp.with_timezone(tz).date_naive() == date)
            .cloned()
            .collect();

        let open = market_open();
        let (premarket, regular): (Vec<Bar>, Vec<Bar>) = session
            .iter()
            .cloned()
            .partition(|b| b.timestamp.with_timezone(tz).time() < open);

        Some(Self {
            date,
            session,
            premarket,
            regular,
        })
    }

    /// The close of the chronologically last bar of the session.
    pub fn last_close(&self) -> Option<f64> {
        self.session.last().map(|b| b.close)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use chrono_tz::America::New_York;
    use market_data_ingestor::models::timeframe::TimeFrame;

    use super::*;

    fn bar_at(y: i32, mo: u32, d: u32, h: u32, mi: u32, close: f64) -> Bar {
        Bar {
            timestamp: New_York
                .with_ymd_and_hms(y, mo, d, h, mi, 0)
                .unwrap()
                .with_timezone(&Utc),
            open: close,
            high: close,
            low: close,
            close,
            volume: 100.0,
            trade_count: None,
            vwap: None,
        }
    }

    fn series(bars: Vec<Bar>) -> BarSeries {
        BarSeries {
            symbol: "AAA".to_string(),
            timeframe: TimeFrame::minutes(1),
            window_start: Utc::now(),
            window_end: Utc::now(),
            bars,
        }
    }

    #[test]
    fn splits_the_latest_date_at_the_open() {
        let s = series(vec![
            bar_at(2025, 3, 2, 10, 0, 1.0),
            bar_at(2025, 3, 3, 8, 0, 2.0),
            bar_at(2025, 3, 3, 9, 29, 3.0),
            bar_at(2025, 3, 3, 9, 30, 4.0),
            bar_at(2025, 3, 3, 15, 59, 5.0),
        ]);
        let part = SessionPartition::latest_session(&s, &New_York).unwrap();
        assert_eq!(part.date, NaiveDate::from_ymd_opt(2025, 3, 3).unwrap());
        assert_eq!(part.session.len(), 4);
        assert_eq!(part.premarket.len(), 2);
        assert_eq!(part.regular.len(), 2);
        assert_eq!(part.last_close(), Some(5.0));
    }

    #[test]
    fn empty_series_has_no_session() {
        assert!(SessionPartition::latest_session(&series(vec![]), &New_York).is_none());
    }
}
