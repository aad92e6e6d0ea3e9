//! Wall-clock helpers mapping "now" onto the trading calendar.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::calendar::TradingCalendar;
use crate::error::CalendarError;
use crate::intraday::{SESSION_CLOSE, SESSION_OPEN, floor_to_slot};

/// Hour after which a day's end-of-day data is considered complete.
pub const EOD_READY_HOUR: u32 = 20;

/// Source of the current local exchange time.
pub trait Clock: Send + Sync {
    /// Current local date and time.
    fn now(&self) -> NaiveDateTime;
}

/// Clock backed by the system's local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

/// Clock frozen at a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

impl TradingCalendar {
    /// Today if it is a business day and the session has opened, otherwise
    /// the previous business day.
    ///
    /// # Errors
    /// Returns a [`CalendarError`] when today is outside the table.
    pub fn current_trading_date(&self, clock: &dyn Clock) -> Result<NaiveDate, CalendarError> {
        let now = clock.now();
        self.busdate_at(now.date(), now.time() < SESSION_OPEN)
    }

    /// Like [`TradingCalendar::current_trading_date`] with a whole-hour cutoff.
    ///
    /// # Errors
    /// Returns a [`CalendarError`] when today is outside the table.
    pub fn current_busdate(&self, clock: &dyn Clock, hour: u32) -> Result<NaiveDate, CalendarError> {
        let now = clock.now();
        self.busdate_at(now.date(), now.hour() < hour)
    }

    /// Latest business date with complete end-of-day data.
    ///
    /// # Errors
    /// Returns a [`CalendarError`] when today is outside the table.
    pub fn market_date(&self, clock: &dyn Clock) -> Result<NaiveDate, CalendarError> {
        self.current_busdate(clock, EOD_READY_HOUR)
    }

    /// Whether the exchange trades today.
    ///
    /// # Errors
    /// Returns [`CalendarError::UnknownDate`] when today is outside the table.
    pub fn is_today_busday(&self, clock: &dyn Clock) -> Result<bool, CalendarError> {
        self.is_busday(clock.now().date())
    }

    /// Current 5-minute slot while the session is open, otherwise the last
    /// slot of the current trading date.
    ///
    /// # Errors
    /// Returns a [`CalendarError`] when today is outside the table.
    pub fn current_trading_datetime(&self, clock: &dyn Clock) -> Result<NaiveDateTime, CalendarError> {
        let now = clock.now();
        let trading_date = self.current_trading_date(clock)?;
        let time = now.time();
        if now.date() == trading_date && time >= SESSION_OPEN && time.hour() < 16 {
            return Ok(trading_date.and_time(floor_to_slot(time)));
        }
        Ok(trading_date.and_time(SESSION_CLOSE))
    }

    fn busdate_at(&self, today: NaiveDate, before_cutoff: bool) -> Result<NaiveDate, CalendarError> {
        let mut ix = self.day_index(today)?;
        if before_cutoff {
            ix -= 1;
        }
        let day = self.day(ix).ok_or(CalendarError::OutOfRange(ix))?;
        if day.is_busday {
            Ok(day.date)
        } else {
            Ok(self.prev_busday(ix)?.1)
        }
    }
}

/// Midnight of `date`.
#[must_use]
pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::weekday_calendar;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn at(date: NaiveDate, h: u32, m: u32) -> FixedClock {
        FixedClock(date.and_hms_opt(h, m, 0).unwrap())
    }

    fn cal() -> TradingCalendar {
        weekday_calendar(d(2022, 11, 1), d(2022, 12, 31), &[d(2022, 11, 24)]).unwrap()
    }

    #[test]
    fn test_current_trading_date_before_open() {
        let cal = cal();
        assert_eq!(cal.current_trading_date(&at(d(2022, 11, 28), 9, 29)).unwrap(), d(2022, 11, 25));
        assert_eq!(cal.current_trading_date(&at(d(2022, 11, 28), 9, 30)).unwrap(), d(2022, 11, 28));
        assert_eq!(cal.current_trading_date(&at(d(2022, 11, 27), 12, 0)).unwrap(), d(2022, 11, 25));
        assert_eq!(cal.current_trading_date(&at(d(2022, 11, 25), 8, 0)).unwrap(), d(2022, 11, 23));
    }

    #[test]
    fn test_market_date_waits_for_eod() {
        let cal = cal();
        assert_eq!(cal.market_date(&at(d(2022, 11, 28), 19, 59)).unwrap(), d(2022, 11, 25));
        assert_eq!(cal.market_date(&at(d(2022, 11, 28), 20, 0)).unwrap(), d(2022, 11, 28));
    }

    #[test]
    fn test_is_today_busday() {
        let cal = cal();
        assert!(!cal.is_today_busday(&at(d(2022, 11, 24), 12, 0)).unwrap());
        assert!(cal.is_today_busday(&at(d(2022, 11, 23), 12, 0)).unwrap());
    }

    #[test]
    fn test_current_trading_datetime() {
        let cal = cal();
        let t = cal.current_trading_datetime(&at(d(2022, 11, 28), 10, 7)).unwrap();
        assert_eq!(t, d(2022, 11, 28).and_hms_opt(10, 5, 0).unwrap());
        let t = cal.current_trading_datetime(&at(d(2022, 11, 28), 17, 0)).unwrap();
        assert_eq!(t, d(2022, 11, 28).and_hms_opt(15, 55, 0).unwrap());
        let t = cal.current_trading_datetime(&at(d(2022, 11, 26), 11, 0)).unwrap();
        assert_eq!(t, d(2022, 11, 25).and_hms_opt(15, 55, 0).unwrap());
    }
}
