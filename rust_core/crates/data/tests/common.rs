#![allow(dead_code)]

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use swing_calendar::{FixedClock, TradingCalendar, weekday_calendar};
use swing_types::Bar;

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

pub fn dt(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
}

/// Weekday calendar for 2023-2024 with the 2024 Q1 exchange holidays.
pub fn sample_calendar() -> Arc<TradingCalendar> {
    let holidays = [d(2023, 12, 25), d(2024, 1, 1), d(2024, 1, 15), d(2024, 2, 19), d(2024, 3, 29)];
    Arc::new(weekday_calendar(d(2023, 10, 1), d(2024, 6, 30), &holidays).unwrap())
}

/// Clock parked on a Saturday evening, after every session in the fixtures.
pub fn weekend_clock() -> FixedClock {
    FixedClock(dt("2024-04-06 18:00:00"))
}

/// One daily bar per business day in `[start, end]`, drifting upward.
pub fn daily_bars(cal: &TradingCalendar, start: NaiveDate, end: NaiveDate) -> Vec<Bar> {
    cal.busdays(start, end)
        .unwrap()
        .into_iter()
        .enumerate()
        .map(|(i, date)| {
            let base = 10_000 + 10 * i64::try_from(i).unwrap();
            Bar::daily(date, base, base + 50, base - 50, base + 20, 1_000 + i64::try_from(i).unwrap())
        })
        .collect()
}
