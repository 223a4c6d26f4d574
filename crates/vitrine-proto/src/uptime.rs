//! Elapsed-time counter for the "system uptime" widget.
//!
//! Calendar-approximate: a year is 365.25 days, so the day field drifts a
//! little around leap years, which is what the widget has always shown.

use chrono::NaiveDateTime;

const MINUTE_MS: i64 = 60_000;
const HOUR_MS: i64 = 3_600_000;
const DAY_MS: i64 = 86_400_000;
/// 365.25 days.
const YEAR_MS: i64 = 31_557_600_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Uptime {
    pub years: i64,
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl Uptime {
    /// Breakdown of `now - origin`. Clamped to zero if the origin is in
    /// the future.
    pub fn between(origin: NaiveDateTime, now: NaiveDateTime) -> Self {
        let diff = (now - origin).num_milliseconds().max(0);
        Self {
            years: diff / YEAR_MS,
            days: (diff % YEAR_MS) / DAY_MS,
            hours: (diff % DAY_MS) / HOUR_MS,
            minutes: (diff % HOUR_MS) / MINUTE_MS,
            seconds: (diff % MINUTE_MS) / 1000,
        }
    }

    pub fn since(origin: NaiveDateTime) -> Self {
        Self::between(origin, chrono::Local::now().naive_local())
    }
}

impl std::fmt::Display for Uptime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}Y {}D {}H {}M {}S",
            self.years, self.days, self.hours, self.minutes, self.seconds
        )
    }
}
