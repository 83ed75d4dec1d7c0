//! Session-anchored fetch windows.
//!
//! The trading day for window purposes starts at 04:15 exchange-local time
//! (15 minutes after premarket opens, so the first quarter hour of thin prints
//! never anchors a window). Before 04:15 local, "today's session" means the
//! previous calendar day's session.

use chrono::{DateTime, Duration, LocalResult, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

/// How far, at most, a nonexistent local time (spring-forward gap) is shifted
/// forward before resolution gives up.
const MAX_GAP_SHIFT_MINUTES: i64 = 120;

fn session_start() -> NaiveTime {
    NaiveTime::from_hms_opt(4, 15, 0).unwrap()
}

/// A half-open UTC fetch window, `start` inclusive to `end` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    /// Window start (inclusive).
    pub start: DateTime<Utc>,
    /// Window end (exclusive).
    pub end: DateTime<Utc>,
}

/// Resolves a local wall-clock time to UTC deterministically.
///
/// Fall-back ambiguity takes the earlier instant; a spring-forward gap is
/// shifted forward minute by minute until a valid instant appears. Returns
/// `None` only if no valid instant exists within [`MAX_GAP_SHIFT_MINUTES`].
pub fn resolve_local(naive: NaiveDateTime, tz: &Tz) -> Option<DateTime<Utc>> {
    for shift in 0..=MAX_GAP_SHIFT_MINUTES {
        let candidate = naive + Duration::minutes(shift);
        match tz.from_local_datetime(&candidate) {
            LocalResult::Single(dt) => return Some(dt.with_timezone(&Utc)),
            LocalResult::Ambiguous(earliest, _) => return Some(earliest.with_timezone(&Utc)),
            LocalResult::None => continue,
        }
    }
    None
}

/// Computes fetch windows relative to "now", a configured reporting delay,
/// and the 04:15 session boundary in one exchange time zone.
#[derive(Debug, Clone, Copy)]
pub struct SessionClock {
    tz: Tz,
    delay: Duration,
}

impl SessionClock {
    /// A clock for the given zone. `delay_minutes` models delayed market data:
    /// the effective "now" for every window is shifted back by this much.
    pub fn new(tz: Tz, delay_minutes: i64) -> Self {
        Self {
            tz,
            delay: Duration::minutes(delay_minutes),
        }
    }

    /// The exchange time zone this clock anchors to.
    pub fn tz(&self) -> Tz {
        self.tz
    }

    /// The intraday window ending now: from 04:15 local on the session date
    /// `days_back` sessions ago, up to the delayed now.
    ///
    /// Before 04:15 local the anchor rolls back one extra day, so an 03:00
    /// run still covers the previous full session. Returns `None` when the
    /// window would be empty (the delay pushed "now" behind the boundary) or
    /// the boundary cannot be resolved in this zone.
    pub fn intraday_window_at(
        &self,
        now: DateTime<Utc>,
        days_back: i64,
    ) -> Option<FetchWindow> {
        let end = now - self.delay;
        let local = end.with_timezone(&self.tz);

        let mut session_date = local.date_naive() - Duration::days(days_back);
        if local.time() < session_start() {
            session_date = session_date.pred_opt()?;
        }

        let start = resolve_local(session_date.and_time(session_start()), &self.tz)?;
        (end > start).then_some(FetchWindow { start, end })
    }

    /// The daily window ending now, spanning `days_back` calendar days.
    ///
    /// Before 04:15 local, only the window *end* rolls back one day, so the
    /// most recent daily bar is the last completed session rather than a
    /// partial one. The start stays anchored to the delayed now.
    pub fn daily_window_at(&self, now: DateTime<Utc>, days_back: i64) -> Option<FetchWindow> {
        let adjusted = now - self.delay;
        let local = adjusted.with_timezone(&self.tz);

        let start = adjusted - Duration::days(days_back);
        let end = if local.time() < session_start() {
            adjusted - Duration::days(1)
        } else {
            adjusted
        };
        (end > start).then_some(FetchWindow { start, end })
    }

    /// [`Self::intraday_window_at`] anchored at the current instant.
    pub fn intraday_window(&self, days_back: i64) -> Option<FetchWindow> {
        self.intraday_window_at(Utc::now(), days_back)
    }

    /// [`Self::daily_window_at`] anchored at the current instant.
    pub fn daily_window(&self, days_back: i64) -> Option<FetchWindow> {
        self.daily_window_at(Utc::now(), days_back)
    }

    /// The local calendar date for a UTC instant, as `YYYY-MM-DD`.
    pub fn local_date_string(&self, now: DateTime<Utc>) -> String {
        now.with_timezone(&self.tz)
            .date_naive()
            .format("%Y-%m-%d")
            .to_string()
    }
}
