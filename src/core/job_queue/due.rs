//! Due-time policy for recurring jobs.
//!
//! Periods of an hour or more are calendar aligned: a daily job is due once
//! the day of month changes, an hourly job once the day or the hour changes.
//! A daily job that last ran at 23:59 is due again at 00:01. Shorter periods
//! use a rolling window measured from the start of the last run.

use std::time::Duration;

use chrono::{DateTime, Datelike, TimeDelta, TimeZone, Timelike};

/// Periods at or above this are checked against the calendar day.
pub const DAILY: Duration = Duration::from_secs(24 * 60 * 60);
/// Periods at or above this are checked against the calendar hour.
pub const HOURLY: Duration = Duration::from_secs(60 * 60);

/// Decide whether a job should be pushed at `now`.
///
/// A pushed job (queued or running) is never due.
pub fn should_run<Tz: TimeZone>(
    is_pushed: bool,
    last_run: Option<&DateTime<Tz>>,
    period: Duration,
    now: &DateTime<Tz>,
) -> bool {
    if is_pushed {
        return false;
    }
    let Some(last) = last_run else {
        return true;
    };

    if period >= DAILY {
        return now.day() != last.day();
    }
    if period >= HOURLY {
        return now.day() != last.day() || now.hour() != last.hour();
    }

    TimeDelta::from_std(period)
        .ok()
        .and_then(|p| last.clone().checked_add_signed(p))
        .is_some_and(|due| *now > due)
}
