use chrono::NaiveDate;
use swing_calendar::{TradingCalendar, weekday_calendar};

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// NYSE-like calendar for 2019-2021 with a handful of fixed holidays.
pub fn sample_calendar() -> TradingCalendar {
    let holidays = [
        d(2019, 1, 1),
        d(2019, 7, 4),
        d(2019, 11, 28),
        d(2019, 12, 25),
        d(2020, 1, 1),
        d(2020, 4, 10),
        d(2020, 7, 3),
        d(2020, 11, 26),
        d(2020, 12, 25),
        d(2021, 1, 1),
        d(2021, 4, 2),
        d(2021, 7, 5),
        d(2021, 11, 25),
        d(2021, 12, 24),
    ];
    weekday_calendar(d(2019, 1, 1), d(2021, 12, 31), &holidays).unwrap()
}
