//! Monthly equity option expiry.
//!
//! Options expire on the third Friday of the month. Until February 2015 the
//! expiration date was the Saturday after it, and this is kept as a fixed
//! cutover date: for third Fridays on or before the cutover the following
//! calendar day is returned, business day or not.

use chrono::{Datelike, Months, NaiveDate};

use crate::calendar::TradingCalendar;
use crate::error::CalendarError;

/// Last Saturday on which monthly options expired.
pub const SATURDAY_EXPIRY_CUTOVER: NaiveDate = match NaiveDate::from_ymd_opt(2015, 1, 17) {
    Some(d) => d,
    None => NaiveDate::MIN,
};

/// Days stepped back from an expiry to land in the previous month.
const PREV_EXPIRY_LOOKBACK: i64 = 40;

impl TradingCalendar {
    /// Expiry on or after day number `index`, with the default cutover.
    ///
    /// # Errors
    /// Returns a [`CalendarError`] when the month or its neighbour is not
    /// fully covered by the table.
    pub fn option_expiry(&self, index: i64) -> Result<(i64, NaiveDate), CalendarError> {
        self.option_expiry_with_cutover(index, SATURDAY_EXPIRY_CUTOVER)
    }

    /// Expiry on or after day number `index`.
    ///
    /// Starts from the business day at or after `index`. If the third Friday
    /// of its month is already past, the next month is used.
    ///
    /// # Errors
    /// See [`TradingCalendar::option_expiry`].
    pub fn option_expiry_with_cutover(
        &self,
        index: i64,
        cutover: NaiveDate,
    ) -> Result<(i64, NaiveDate), CalendarError> {
        let day = self.day(index).ok_or(CalendarError::OutOfRange(index))?;
        let start = if day.is_busday {
            day.date
        } else {
            self.next_busday(index)?.1
        };
        let mut month_start = first_of_month(start)?;
        let mut third_friday = third_friday_of(month_start);
        if third_friday < start.day() {
            month_start = month_start
                .checked_add_months(Months::new(1))
                .ok_or_else(|| CalendarError::InvalidDate(format!("month after {month_start}")))?;
            third_friday = third_friday_of(month_start);
        }
        let friday_ix = self.day_index(month_start)? + i64::from(third_friday) - 1;
        let friday = self.day(friday_ix).ok_or(CalendarError::OutOfRange(friday_ix))?;
        if friday.date <= cutover {
            let saturday = self
                .day(friday_ix + 1)
                .ok_or(CalendarError::OutOfRange(friday_ix + 1))?;
            return Ok((friday_ix + 1, saturday.date));
        }
        if friday.is_busday {
            Ok((friday_ix, friday.date))
        } else {
            self.prev_busday(friday_ix)
        }
    }

    /// Expiry strictly after the one returned by
    /// [`TradingCalendar::option_expiry`] for `index`.
    ///
    /// # Errors
    /// See [`TradingCalendar::option_expiry`].
    pub fn next_expiry(&self, index: i64) -> Result<(i64, NaiveDate), CalendarError> {
        let (exp_ix, _) = self.option_expiry(index)?;
        let (after, _) = self.next_busday(exp_ix)?;
        self.option_expiry(after)
    }

    /// Expiry of the month before the one returned by
    /// [`TradingCalendar::option_expiry`] for `index`.
    ///
    /// # Errors
    /// See [`TradingCalendar::option_expiry`].
    pub fn prev_expiry(&self, index: i64) -> Result<(i64, NaiveDate), CalendarError> {
        let (exp_ix, _) = self.option_expiry(index)?;
        self.option_expiry(exp_ix - PREV_EXPIRY_LOOKBACK)
    }

    /// Last business day on or before the expiry at `exp_index`.
    ///
    /// # Errors
    /// Returns [`CalendarError::OutOfRange`] outside the table.
    pub fn expiry_busday(&self, exp_index: i64) -> Result<(i64, NaiveDate), CalendarError> {
        let day = self.day(exp_index).ok_or(CalendarError::OutOfRange(exp_index))?;
        if day.is_busday {
            Ok((exp_index, day.date))
        } else {
            self.prev_busday(exp_index)
        }
    }
}

fn first_of_month(date: NaiveDate) -> Result<NaiveDate, CalendarError> {
    date.with_day(1)
        .ok_or_else(|| CalendarError::InvalidDate(format!("first of month for {date}")))
}

/// Day of month of the third Friday, given the first of the month.
fn third_friday_of(month_start: NaiveDate) -> u32 {
    let dow = month_start.weekday().num_days_from_monday();
    15 + (11 - dow) % 7
}
