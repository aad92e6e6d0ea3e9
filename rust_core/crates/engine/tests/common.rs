#![allow(dead_code)]

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use swing_calendar::{FixedClock, TradingCalendar, weekday_calendar};
use swing_data::{SplitList, TimeSeries};
use swing_types::{Bar, BarInterval, SplitEvent};

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

pub fn dt(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
}

/// Weekday calendar for 2023-2025 closed on two 2024 holidays.
pub fn calendar() -> Arc<TradingCalendar> {
    Arc::new(weekday_calendar(d(2023, 1, 1), d(2025, 12, 31), &[d(2024, 7, 4), d(2024, 12, 25)]).unwrap())
}

/// Clock parked after the close of 2025-06-30.
pub fn clock() -> FixedClock {
    FixedClock(dt("2025-06-30 18:00:00"))
}

/// First day of every fixture series.
pub fn first_day() -> NaiveDate {
    d(2024, 1, 2)
}

fn dated(cal: &TradingCalendar, bars: impl Iterator<Item = (i64, i64, i64, i64, i64)>) -> Vec<Bar> {
    let days = cal.busdays(first_day(), d(2025, 12, 31)).unwrap();
    bars.zip(days)
        .map(|((open, high, low, close, volume), day)| Bar::daily(day, open, high, low, close, volume))
        .collect()
}

/// 20 flat bars with the window high (100.00) on bar 5 and the window low
/// (80.00) on bar 15.
pub fn seeding_bars(cal: &TradingCalendar) -> Vec<Bar> {
    dated(
        cal,
        (0..20).map(|i| match i {
            5 => (9_000, 10_000, 8_500, 9_000, 1_000),
            15 => (9_000, 9_500, 8_000, 9_000, 1_000),
            _ => (9_000, 9_500, 8_500, 9_000, 1_000),
        }),
    )
}

/// Swings of ten bars up and ten bars down on a slow upward drift. Every
/// price is a multiple of 40 and every volume a multiple of 20, so a 2:1
/// split rescales them exactly.
pub fn zigzag_bars(cal: &TradingCalendar, n: usize) -> Vec<Bar> {
    dated(
        cal,
        (0..n).map(|i| {
            let i = i64::try_from(i).unwrap();
            let phase = i % 20;
            let k = if phase <= 10 { phase } else { 20 - phase };
            let mid = 100_000 + 400 * k + 40 * i;
            let (open, close) = if phase < 10 { (mid - 40, mid + 40) } else { (mid + 40, mid - 40) };
            (open, mid + 200, mid - 200, close, 1_000 + 20 * i)
        }),
    )
}

/// Random-walk bars from `(move, spread up, spread down, volume)` steps.
pub fn walk_bars(cal: &TradingCalendar, steps: &[(i64, i64, i64, i64)]) -> Vec<Bar> {
    let mut close = 100_000;
    dated(
        cal,
        steps.iter().map(|&(delta, up, down, volume)| {
            let open = close;
            close = open + delta;
            (open, open.max(close) + up, open.min(close) - down, close, volume)
        }),
    )
}

pub fn series(cal: &Arc<TradingCalendar>, bars: Vec<Bar>) -> TimeSeries {
    TimeSeries::new("TEST", BarInterval::Daily, Arc::clone(cal), bars, SplitList::default()).unwrap()
}

pub fn series_with_splits(cal: &Arc<TradingCalendar>, bars: Vec<Bar>, splits: Vec<SplitEvent>) -> TimeSeries {
    let splits = SplitList::new(splits).unwrap();
    TimeSeries::new("TEST", BarInterval::Daily, Arc::clone(cal), bars, splits).unwrap()
}
