//! Tests for utility functions

use chrono::{Local, TimeDelta, TimeZone};
use prometheus_jobs::util::clock::{Clock, ManualClock, SystemClock};
use prometheus_jobs::util::telemetry::{init_tracing, DEFAULT_DIRECTIVE};

#[test]
fn test_manual_clock_set_and_advance() {
    let start = Local
        .with_ymd_and_hms(2024, 6, 1, 8, 0, 0)
        .single()
        .expect("unambiguous local time");
    let clock = ManualClock::new(start);
    assert_eq!(clock.now(), start);

    clock.advance(TimeDelta::hours(2));
    assert_eq!(clock.now() - start, TimeDelta::hours(2));

    clock.set(start);
    assert_eq!(clock.now(), start);
}

#[test]
fn test_system_clock_tracks_local_time() {
    let before = Local::now();
    let now = SystemClock.now();
    assert!(now >= before);
}

#[test]
fn test_init_tracing_is_repeatable() {
    init_tracing();
    init_tracing();
    assert!(DEFAULT_DIRECTIVE.starts_with("prometheus_jobs"));
}
