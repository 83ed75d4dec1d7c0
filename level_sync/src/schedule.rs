//! Run-window gate for the scheduled watch loop.
//!
//! The pipeline is only worth running while the extended US session is live:
//! weekdays, premarket open through after-hours close, exchange-local time.

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use chrono_tz::Tz;

/// When the scheduled loop is allowed to fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunWindow {
    /// First hour (inclusive) of the window, local.
    pub start_hour: u32,
    /// Last hour (exclusive) of the window, local.
    pub end_hour: u32,
    /// Skip Saturday and Sunday entirely.
    pub weekdays_only: bool,
}

impl Default for RunWindow {
    fn default() -> Self {
        Self {
            start_hour: 4,  // premarket open
            end_hour: 20,   // after-hours close
            weekdays_only: true,
        }
    }
}

/// Whether `now` falls inside the run window in the given zone.
pub fn should_run_at(now: DateTime<Utc>, tz: &Tz, window: &RunWindow) -> bool {
    let local = now.with_timezone(tz);

    if window.weekdays_only {
        match local.weekday() {
            Weekday::Sat | Weekday::Sun => return false,
            _ => {}
        }
    }

    let hour = local.hour();
    hour >= window.start_hour && hour < window.end_hour
}

/// [`should_run_at`] anchored at the current instant.
pub fn should_run_now(tz: &Tz, window: &RunWindow) -> bool {
    should_run_at(Utc::now(), tz, window)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use chrono_tz::America::New_York;

    use super::*;

    fn ny(y: i32, mo: u32, d: u32, h: u32) -> DateTime<Utc> {
        New_York
            .with_ymd_and_hms(y, mo, d, h, 0, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn weekday_session_hours_pass() {
        let w = RunWindow::default();
        // Monday 2025-03-03.
        assert!(should_run_at(ny(2025, 3, 3, 4), &New_York, &w));
        assert!(should_run_at(ny(2025, 3, 3, 19), &New_York, &w));
        assert!(!should_run_at(ny(2025, 3, 3, 3), &New_York, &w));
        assert!(!should_run_at(ny(2025, 3, 3, 20), &New_York, &w));
    }

    #[test]
    fn weekends_never_run() {
        let w = RunWindow::default();
        // Saturday 2025-03-01.
        assert!(!should_run_at(ny(2025, 3, 1, 10), &New_York, &w));
    }
}
